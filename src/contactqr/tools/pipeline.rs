use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, trace, warn};

use crate::contactqr::tools::error::{Result, ToolError};
use crate::contactqr::tools::io::contact_list::{self, ListFormat};
use crate::contactqr::tools::io::excel_write;
use crate::contactqr::tools::io::qr;
use crate::contactqr::tools::io::vcard::{self, VCardOptions};
use crate::contactqr::tools::model::{Contact, ResponseStatus};

/// Everything a single run needs. Built by the command line front end.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Folder holding the contact list and receiving vCard/PNG output.
    pub folder: PathBuf,
    /// Contact list file name, relative to `folder`.
    pub list: Option<PathBuf>,
    /// Workbook file name, relative to `folder`. Only used with `list`.
    pub xlsx: Option<PathBuf>,
    pub list_format: ListFormat,
    pub vcard: VCardOptions,
    /// vCard files converted to QR images directly.
    pub vcf_files: Vec<PathBuf>,
}

/// What a run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub qr_images: usize,
    pub contacts: usize,
    pub workbook: Option<PathBuf>,
}

/// Runs the configured steps in order, stopping at the first failure.
#[instrument(level = "info", skip_all, fields(folder = %config.folder.display()))]
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    summary.qr_images += generate_qr_codes(&config.vcf_files)?;

    match &config.list {
        Some(list) => {
            let contacts =
                process_list(&config.folder, list, config.list_format, &config.vcard)?;
            summary.contacts = contacts.len();
            summary.qr_images += contacts.len();

            if let Some(xlsx) = &config.xlsx {
                let output = config.folder.join(xlsx);
                write_workbook(&output, &contacts)?;
                summary.workbook = Some(output);
            }
        }
        None => {
            if let Some(xlsx) = &config.xlsx {
                warn!(xlsx = %xlsx.display(), "workbook output needs a contact list, ignored");
            }
        }
    }

    Ok(summary)
}

/// Converts each vCard file into a QR image, in argument order.
#[instrument(level = "info", skip_all, fields(files = vcf_files.len()))]
pub fn generate_qr_codes(vcf_files: &[PathBuf]) -> Result<usize> {
    for vcf in vcf_files {
        qr::write_qr_for_vcard(vcf)?;
    }
    Ok(vcf_files.len())
}

/// Reads the contact list, writes a vCard per contact (custom contacts keep
/// their own file) and renders every vCard as a QR image.
#[instrument(
    level = "info",
    skip_all,
    fields(folder = %folder.display(), list = %list.display())
)]
pub fn process_list(
    folder: &Path,
    list: &Path,
    format: ListFormat,
    options: &VCardOptions,
) -> Result<Vec<Contact>> {
    let contacts = contact_list::read_contacts(folder, list, format)?;
    info!(contact_count = contacts.len(), "read contacts");

    for (index, contact) in contacts.iter().enumerate() {
        debug!(index = index + 1, contact = %serde_json::to_string(contact)?, "processing contact");
        match contact.response_status {
            ResponseStatus::Custom => {
                if !contact.vcf_path.is_file() {
                    return Err(ToolError::CustomFileMissing(contact.vcf_path.clone()));
                }
                trace!(path = %contact.vcf_path.display(), "keeping custom vCard");
            }
            ResponseStatus::Accepted | ResponseStatus::Declined => {
                vcard::write_vcard(contact, options)?;
            }
            ResponseStatus::Cancelled => {
                debug!(name = %contact.full_name, "cancelled contact ignored");
                continue;
            }
        }
        qr::write_qr_for_vcard(&contact.vcf_path)?;
    }

    Ok(contacts)
}

/// Lays the processed contacts out in the listing and QR sheets.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub fn write_workbook(output: &Path, contacts: &[Contact]) -> Result<()> {
    excel_write::write_workbook(output, contacts)?;
    info!(contact_count = contacts.len(), "workbook written");
    Ok(())
}
