//! Document decoders for prescription uploads.
//!
//! Every supported upload is reduced to one plain Unicode text blob before
//! extraction begins. This crate owns that step:
//!
//! - [`SourceFormat`]: the accepted containers (`pdf`, `docx`, `txt`)
//! - [`DocumentDecoder`]: the seam a host fills with its own PDF/DOCX engine
//! - [`PlainTextDecoder`]: built-in `.txt` decoding
//! - `PdfTextDecoder`: `lopdf`-backed text layer decoding (feature `pdf`)
//! - [`MockDecoder`]: canned output for tests

pub mod decoder;
pub mod format;

#[cfg(feature = "pdf")]
pub mod pdf;

pub use decoder::*;
pub use format::*;

#[cfg(feature = "pdf")]
pub use pdf::PdfTextDecoder;
