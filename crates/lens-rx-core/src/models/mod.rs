//! Domain models for prescription extraction.

mod draft;
mod form;

pub use draft::*;
pub use form::*;
