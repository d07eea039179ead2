pub mod contact_list;
pub mod excel_write;
pub mod qr;
pub mod vcard;
