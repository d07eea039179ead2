use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use encoding_rs::{Encoding, UTF_8, UTF_16LE};
use encoding_rs_io::DecodeReaderBytesBuilder;
use tracing::{debug, instrument, trace, warn};

use crate::contactqr::tools::error::{Result, ToolError};
use crate::contactqr::tools::model::{Contact, ResponseStatus, format_cell_number, vcf_path_for};

const COL_SEQUENCE: usize = 0;
const COL_CLASS: usize = 1;
const COL_NAME: usize = 2;
const COL_FILE: usize = 3;
const COL_PHONE: usize = 4;
const COL_EMAIL: usize = 5;
const COL_STATUS: usize = 6;
/// Number of columns a data row must carry.
pub const EXPECTED_COLUMNS: usize = 7;

/// Field separator used by the contact list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    /// Tab for `.txt`/`.tsv` exports, comma for everything else.
    #[default]
    Auto,
    Tab,
    Comma,
}

impl Delimiter {
    /// Resolves the separator byte for the given list file.
    pub fn byte_for(self, path: &Path) -> u8 {
        match self {
            Delimiter::Tab => b'\t',
            Delimiter::Comma => b',',
            Delimiter::Auto => match path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase)
                .as_deref()
            {
                Some("txt") | Some("tsv") => b'\t',
                _ => b',',
            },
        }
    }
}

/// Text encoding of the contact list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// UTF-8 unless a byte-order mark says otherwise.
    #[default]
    Auto,
    Utf8,
    /// UTF-16 little-endian, with or without a leading byte-order mark.
    Utf16Le,
}

impl TextEncoding {
    fn encoding(self) -> Option<&'static Encoding> {
        match self {
            TextEncoding::Auto => None,
            TextEncoding::Utf8 => Some(UTF_8),
            TextEncoding::Utf16Le => Some(UTF_16LE),
        }
    }
}

/// How the contact list file is laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListFormat {
    pub delimiter: Delimiter,
    pub encoding: TextEncoding,
}

/// Reads `<folder>/<list_name>` and returns the contacts in file order.
///
/// Rows without a positive sequence number, rows with an unreadable response
/// code and cancelled contacts are skipped. A data row with too few columns
/// aborts the whole read.
#[instrument(
    level = "info",
    skip_all,
    fields(folder = %folder.display(), list = %list_name.display())
)]
pub fn read_contacts(folder: &Path, list_name: &Path, format: ListFormat) -> Result<Vec<Contact>> {
    let path = folder.join(list_name);
    let file = File::open(&path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => ToolError::FileNotFound(path.clone()),
        _ => ToolError::Io(err),
    })?;

    let decoded = DecodeReaderBytesBuilder::new()
        .encoding(format.encoding.encoding())
        .bom_sniffing(true)
        .strip_bom(true)
        .build(file);

    parse_contacts(decoded, folder, format.delimiter.byte_for(&path))
}

/// Parses already decoded list text. vCard paths are resolved against `folder`.
pub fn parse_contacts<R: Read>(reader: R, folder: &Path, delimiter: u8) -> Result<Vec<Contact>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut contacts = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|position| position.line())
            .unwrap_or(index as u64 + 1);
        if let Some(contact) = parse_row(&record, line, folder)? {
            contacts.push(contact);
        }
    }

    debug!(contact_count = contacts.len(), "contact list parsed");
    Ok(contacts)
}

fn parse_row(record: &StringRecord, line: u64, folder: &Path) -> Result<Option<Contact>> {
    let sequence = record.get(COL_SEQUENCE).unwrap_or_default().trim();
    match sequence.parse::<i64>() {
        Ok(0) => {
            trace!(line, "row without sequence number skipped");
            return Ok(None);
        }
        Ok(_) => {}
        Err(error) => {
            debug!(line, %error, row = ?record, "row skipped");
            return Ok(None);
        }
    }

    if record.len() < EXPECTED_COLUMNS {
        return Err(ToolError::MalformedRow {
            line,
            expected: EXPECTED_COLUMNS,
            found: record.len(),
        });
    }
    let column = |index: usize| record.get(index).unwrap_or_default();

    let raw_status = column(COL_STATUS).trim();
    let response_status = match raw_status.parse::<i64>() {
        Ok(code) => {
            if !ResponseStatus::is_known_code(code) {
                warn!(line, code, "unknown response status, treated as declined");
            }
            ResponseStatus::from_code(code)
        }
        Err(error) => {
            warn!(line, %error, status = raw_status, "unreadable response status, row skipped");
            return Ok(None);
        }
    };

    if response_status == ResponseStatus::Cancelled {
        trace!(line, name = column(COL_NAME), "cancelled contact skipped");
        return Ok(None);
    }

    Ok(Some(Contact {
        class: column(COL_CLASS).to_string(),
        full_name: column(COL_NAME).to_string(),
        vcf_path: vcf_path_for(folder, column(COL_FILE)),
        cell_phone: format_cell_number(column(COL_PHONE)),
        email: column(COL_EMAIL).to_string(),
        response_status,
    }))
}
