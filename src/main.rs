use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use contact_qr_tools::io::contact_list::{Delimiter, ListFormat, TextEncoding};
use contact_qr_tools::io::vcard::{CLASS_PLACEHOLDER, DEFAULT_NOTE_TEMPLATE, VCardOptions};
use contact_qr_tools::pipeline::{self, RunConfig};
use contact_qr_tools::{Result, ToolError};
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let filter = match cli.log_filter() {
        Ok(filter) => filter,
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    let outcome = tracing::subscriber::with_default(subscriber, || {
        let result = run(cli);
        if let Err(error) = &result {
            error!(%error, "failed to execute contact-qr-tools");
        }
        result
    });

    if outcome.is_err() {
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config();
    let summary = pipeline::run(&config)?;
    info!(
        qr_images = summary.qr_images,
        contacts = summary.contacts,
        workbook = ?summary.workbook,
        "done"
    );
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Generate vCard QR codes from a list of contacts.",
    override_usage = "contact-qr-tools [OPTIONS] [CONTACT.vcf]..."
)]
struct Cli {
    /// Enable debug output.
    #[arg(short, long, env = "DEBUG_MODE")]
    debug: bool,

    /// Enable trace output (more verbose than --debug).
    #[arg(short, long, env = "TRACE_MODE")]
    trace: bool,

    /// Folder holding the contact list and receiving the vCard and PNG files.
    #[arg(short, long, default_value = "testdata")]
    folder: PathBuf,

    /// Contact list file inside the folder.
    #[arg(short, long)]
    list: Option<PathBuf>,

    /// Workbook to write inside the folder. Requires --list.
    #[arg(short = 'x', long)]
    xlsx: Option<PathBuf>,

    /// Field separator of the contact list.
    #[arg(long, value_enum, default_value_t = DelimiterKind::Auto)]
    delimiter: DelimiterKind,

    /// Text encoding of the contact list.
    #[arg(long, value_enum, default_value_t = EncodingKind::Auto)]
    encoding: EncodingKind,

    /// vCard NOTE text; `{class}` is replaced by the contact's class.
    #[arg(long, default_value = DEFAULT_NOTE_TEMPLATE, value_parser = parse_note_template)]
    note_template: String,

    /// vCard files to convert to QR images directly.
    #[arg(value_name = "VCF")]
    vcf_files: Vec<PathBuf>,
}

impl Cli {
    fn log_filter(&self) -> Result<EnvFilter> {
        let crate_directive = if self.trace {
            Some("trace")
        } else if self.debug {
            Some("debug")
        } else {
            None
        };

        match crate_directive {
            Some(level) => Ok(EnvFilter::new(format!(
                "info,{}={level}",
                env!("CARGO_CRATE_NAME")
            ))),
            None => EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env()
                .map_err(|err| ToolError::Logging(err.to_string())),
        }
    }

    fn into_config(self) -> RunConfig {
        RunConfig {
            folder: self.folder,
            list: self.list,
            xlsx: self.xlsx,
            list_format: ListFormat {
                delimiter: self.delimiter.into(),
                encoding: self.encoding.into(),
            },
            vcard: VCardOptions {
                note_template: self.note_template,
            },
            vcf_files: self.vcf_files,
        }
    }
}

fn parse_note_template(value: &str) -> std::result::Result<String, String> {
    if value.contains(CLASS_PLACEHOLDER) {
        Ok(value.to_string())
    } else {
        Err(format!("template must contain {CLASS_PLACEHOLDER}"))
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DelimiterKind {
    Auto,
    Tab,
    Comma,
}

impl From<DelimiterKind> for Delimiter {
    fn from(kind: DelimiterKind) -> Self {
        match kind {
            DelimiterKind::Auto => Delimiter::Auto,
            DelimiterKind::Tab => Delimiter::Tab,
            DelimiterKind::Comma => Delimiter::Comma,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum EncodingKind {
    Auto,
    Utf8,
    Utf16le,
}

impl From<EncodingKind> for TextEncoding {
    fn from(kind: EncodingKind) -> Self {
        match kind {
            EncodingKind::Auto => TextEncoding::Auto,
            EncodingKind::Utf8 => TextEncoding::Utf8,
            EncodingKind::Utf16le => TextEncoding::Utf16Le,
        }
    }
}
