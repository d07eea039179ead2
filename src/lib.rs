//! Core library for the contact-qr-tools command line application.
//!
//! The tool turns a delimited contact list into one vCard and one QR image
//! per contact and can lay the results out in a printable workbook. Readers
//! and writers for each file format live under [`contactqr::tools::io`], the
//! contact record in [`contactqr::tools::model`], and the run orchestration in
//! [`contactqr::tools::pipeline`].

pub mod contactqr;

pub use contactqr::tools::{Result, ToolError, error, io, model, pipeline};
