use std::fmt::Write as _;
use std::fs;

use tracing::{instrument, trace};

use crate::contactqr::tools::error::{Result, ToolError};
use crate::contactqr::tools::model::{Contact, ResponseStatus};

/// Placeholder replaced by the contact's class inside the note template.
pub const CLASS_PLACEHOLDER: &str = "{class}";
/// Note written when no template is configured.
pub const DEFAULT_NOTE_TEMPLATE: &str = "建中42屆{class}班同學";

/// Settings that shape the generated vCard text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VCardOptions {
    /// `NOTE` text with [`CLASS_PLACEHOLDER`] substituted.
    pub note_template: String,
}

impl Default for VCardOptions {
    fn default() -> Self {
        Self {
            note_template: DEFAULT_NOTE_TEMPLATE.to_string(),
        }
    }
}

impl VCardOptions {
    fn note_for(&self, class: &str) -> String {
        self.note_template.replace(CLASS_PLACEHOLDER, class)
    }
}

/// Renders the vCard 3.0 text for a contact.
///
/// Email and phone are only shared when the contact accepted the invitation.
pub fn render_vcard(contact: &Contact, options: &VCardOptions) -> String {
    let mut card = String::from("BEGIN:VCARD\nVERSION:3.0\n");

    let mut chars = contact.full_name.chars();
    let family = chars.next().map(String::from).unwrap_or_default();
    let given: String = chars.collect();
    // Writing into a String cannot fail.
    let _ = writeln!(card, "FN:{}", contact.full_name);
    let _ = writeln!(card, "N:{family};{given};;;");

    let share_details = match contact.response_status {
        ResponseStatus::Accepted => true,
        ResponseStatus::Declined | ResponseStatus::Custom | ResponseStatus::Cancelled => false,
    };
    if share_details {
        if !contact.email.is_empty() {
            let _ = writeln!(card, "EMAIL;TYPE=INTERNET;TYPE=WORK:{}", contact.email);
        }
        if !contact.cell_phone.is_empty() {
            let _ = writeln!(card, "TEL;TYPE=CELL:{}", contact.cell_phone);
        }
    }

    let _ = writeln!(card, "NOTE:{}", options.note_for(&contact.class));
    card.push_str("END:VCARD\n");
    card
}

/// Writes the contact's vCard to its `vcf_path`, replacing any existing file.
#[instrument(level = "debug", skip_all, fields(name = %contact.full_name, path = %contact.vcf_path.display()))]
pub fn write_vcard(contact: &Contact, options: &VCardOptions) -> Result<()> {
    let card = render_vcard(contact, options);
    fs::write(&contact.vcf_path, card).map_err(|err| ToolError::write(&contact.vcf_path, err))?;
    trace!("vCard generated");
    Ok(())
}
