use std::path::{Path, PathBuf};

use serde::Serialize;

/// Extension appended to the file base name taken from the contact list.
pub const VCARD_EXTENSION: &str = "vcf";
/// Extension used for rendered QR images.
pub const PNG_EXTENSION: &str = "png";
/// Country prefix applied to domestic mobile numbers.
pub const COUNTRY_PREFIX: &str = "+886";

/// Invitation response recorded for a contact. It decides which details end
/// up in the generated vCard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseStatus {
    /// The contact declined; only the name and note are shared.
    Declined,
    /// The contact accepted; phone and email are shared as well.
    Accepted,
    /// The contact supplied a hand-written vCard that must already exist.
    Custom,
    /// The contact withdrew and is dropped from the run.
    Cancelled,
}

impl ResponseStatus {
    /// Maps the integer code used in the contact list. Negative codes mean
    /// the contact cancelled; unknown positive codes share nothing and are
    /// treated as declined.
    pub fn from_code(code: i64) -> Self {
        match code {
            c if c < 0 => ResponseStatus::Cancelled,
            1 => ResponseStatus::Accepted,
            2 => ResponseStatus::Custom,
            _ => ResponseStatus::Declined,
        }
    }

    /// Whether `code` is one of the codes the contact list defines.
    pub fn is_known_code(code: i64) -> bool {
        code <= 2
    }
}

/// One person read from the contact list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    /// Group or cohort label.
    pub class: String,
    /// Display name; the first character is used as the family name.
    pub full_name: String,
    /// Location of the contact's vCard file.
    pub vcf_path: PathBuf,
    /// Mobile number, already run through [`format_cell_number`].
    pub cell_phone: String,
    /// Email address, possibly empty.
    pub email: String,
    pub response_status: ResponseStatus,
}

impl Contact {
    /// Path of the QR image rendered from this contact's vCard.
    pub fn png_path(&self) -> PathBuf {
        png_path_for(&self.vcf_path)
    }
}

/// Builds `<folder>/<base_name>.vcf`.
pub fn vcf_path_for(folder: &Path, base_name: &str) -> PathBuf {
    folder.join(format!("{base_name}.{VCARD_EXTENSION}"))
}

/// Swaps the extension of a vCard path for `.png`.
pub fn png_path_for(vcf_path: &Path) -> PathBuf {
    vcf_path.with_extension(PNG_EXTENSION)
}

/// Rewrites a 10 digit domestic mobile number (`09xxxxxxxx`) into the
/// international display form `+886 9xx-xxx-xxx`. Anything else is returned
/// unchanged.
pub fn format_cell_number(raw: &str) -> String {
    if raw.len() != 10 || !raw.starts_with("09") || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw.to_string();
    }

    format!(
        "{COUNTRY_PREFIX} {}-{}-{}",
        &raw[1..4],
        &raw[4..7],
        &raw[7..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_domestic_mobile_numbers() {
        assert_eq!(format_cell_number("0912345678"), "+886 912-345-678");
    }

    #[test]
    fn leaves_other_numbers_untouched() {
        for raw in ["", "091234567", "09123456789", "0212345678", "+886 912-345-678", "09abcdefgh"] {
            assert_eq!(format_cell_number(raw), raw);
        }
    }

    #[test]
    fn formatting_is_idempotent() {
        let once = format_cell_number("0987654321");
        assert_eq!(format_cell_number(&once), once);
    }

    #[test]
    fn maps_response_codes() {
        assert_eq!(ResponseStatus::from_code(-1), ResponseStatus::Cancelled);
        assert_eq!(ResponseStatus::from_code(0), ResponseStatus::Declined);
        assert_eq!(ResponseStatus::from_code(1), ResponseStatus::Accepted);
        assert_eq!(ResponseStatus::from_code(2), ResponseStatus::Custom);
        assert_eq!(ResponseStatus::from_code(3), ResponseStatus::Declined);
        assert!(!ResponseStatus::is_known_code(9));
    }

    #[test]
    fn derives_sibling_paths() {
        let vcf = vcf_path_for(Path::new("data"), "a01");
        assert_eq!(vcf, Path::new("data").join("a01.vcf"));
        assert_eq!(png_path_for(&vcf), Path::new("data").join("a01.png"));
    }
}
