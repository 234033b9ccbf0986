//! Lens Rx Core Library
//!
//! Best-effort extraction of optical prescriptions from uploaded documents.
//!
//! # Architecture
//!
//! ```text
//! Upload (pdf/docx/txt) → SourceFormat → Decoder (blocking thread) → Text
//!                                                                    │
//!                              ┌─────────────── txt ─────────────────┤
//!                              │                                     │ pdf/docx
//!                              ▼                                     │
//!              markers found? ── yes ─→ Structured-Section           │
//!                   │ no                       │                     │
//!                   ▼                          │                     │
//!            Labeled-Section                   │                     │
//!                   │                          │                     │
//!                   └──── < 3 fields? ─────────┤                     │
//!                              │ yes           │ no                  │
//!                              ▼               │                     ▼
//!                        Whole-Text ◄──────────┼──────────── Whole-Text
//!                              │               │
//!                              ▼               ▼
//!                           PrescriptionDraft (+ recovered fields)
//!                                      │
//!                             PatientForm::merge_draft
//! ```
//!
//! # Core Principle
//!
//! **Extraction never fails.** A document that matches no heuristic yields a
//! defaulted draft so the user can fall back to manual entry. Only unsupported
//! formats and decoding failures are errors.
//!
//! # Modules
//!
//! - [`models`]: Draft and form types (PrescriptionDraft, PatientForm, etc.)
//! - [`extractor`]: The three extractors, shared normalization and the tiered chain
//! - [`dispatch`]: Format routing and async decoding
//! - [`config`]: Extractor configuration

pub mod config;
pub mod dispatch;
pub mod extractor;
pub mod models;

// Re-export commonly used types
pub use config::{ConfigError, ExtractorConfig, RoutingPolicy};
pub use dispatch::{detect_format, DispatchError, Dispatcher};
pub use extractor::{
    ExtractContext, ExtractionOutcome, ExtractionTier, LabeledSectionExtractor,
    PrescriptionExtractor, StructuredSectionExtractor, TieredExtractor, WholeTextExtractor,
};
pub use lens_rx_decode::{DecodeError, DocumentDecoder, SourceFormat};
pub use models::{
    calculate_age, DraftField, EyeMeasurement, PatientForm, PdType, PrescriptionDraft,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum LensRxError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl From<DispatchError> for LensRxError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::UnsupportedFormat(_) => LensRxError::UnsupportedFormat(e.to_string()),
            _ => LensRxError::DecodingError(e.to_string()),
        }
    }
}

impl From<ConfigError> for LensRxError {
    fn from(e: ConfigError) -> Self {
        LensRxError::InvalidConfig(e.to_string())
    }
}

// =========================================================================
// Extraction Functions (exported to FFI)
// =========================================================================

/// Extract a prescription from already-decoded text.
///
/// `extension` is the lowercase extension of the uploaded file (`pdf`,
/// `docx` or `txt`); it selects the routing, not a decoder.
#[uniffi::export]
pub fn extract_prescription_text(
    text: String,
    extension: String,
) -> Result<FfiExtractionOutcome, LensRxError> {
    extract_with(&Dispatcher::default(), &text, &extension)
}

/// Same as [`extract_prescription_text`] with a JSON [`ExtractorConfig`].
#[uniffi::export]
pub fn extract_prescription_text_with_config(
    text: String,
    extension: String,
    config_json: String,
) -> Result<FfiExtractionOutcome, LensRxError> {
    let config = ExtractorConfig::from_json_str(&config_json)?;
    extract_with(&Dispatcher::new(config), &text, &extension)
}

fn extract_with(
    dispatcher: &Dispatcher,
    text: &str,
    extension: &str,
) -> Result<FfiExtractionOutcome, LensRxError> {
    let format = SourceFormat::from_extension(extension)
        .ok_or_else(|| DispatchError::UnsupportedFormat(format!(".{extension}")))?;
    let outcome = dispatcher.extract_text(text, format, &ExtractContext::today());
    Ok(outcome.into())
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe eye measurement.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiEyeMeasurement {
    pub sph: f64,
    pub cyl: f64,
    pub axis: u32,
    pub add: f64,
}

impl From<EyeMeasurement> for FfiEyeMeasurement {
    fn from(eye: EyeMeasurement) -> Self {
        Self {
            sph: eye.sph,
            cyl: eye.cyl,
            axis: eye.axis,
            add: eye.add,
        }
    }
}

/// FFI-safe extraction outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiExtractionOutcome {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub dob: Option<String>,
    pub exam_date: Option<String>,
    pub right_eye: FfiEyeMeasurement,
    pub left_eye: FfiEyeMeasurement,
    pub pd_type: String,
    pub pd: Option<f64>,
    pub pd_od: Option<f64>,
    pub pd_os: Option<f64>,
    pub recovered_fields: Vec<String>,
    pub tier: String,
}

impl From<ExtractionOutcome> for FfiExtractionOutcome {
    fn from(outcome: ExtractionOutcome) -> Self {
        let draft = outcome.draft;
        Self {
            recovered_fields: draft
                .recovered_names()
                .into_iter()
                .map(String::from)
                .collect(),
            pd_type: draft.pd_type.as_str().to_string(),
            tier: outcome.tier.as_str().to_string(),
            name: draft.name,
            phone: draft.phone,
            email: draft.email,
            location: draft.location,
            dob: draft.dob,
            exam_date: draft.exam_date,
            right_eye: draft.right_eye.into(),
            left_eye: draft.left_eye.into(),
            pd: draft.pd,
            pd_od: draft.pd_od,
            pd_os: draft.pd_os,
        }
    }
}
