//! Format routing and the asynchronous decode boundary.
//!
//! Pipeline: file name → [`SourceFormat`] → bytes → decoder (blocking
//! thread) → text → extractor chain.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use lens_rx_decode::{DecodeError, DocumentDecoder, PlainTextDecoder, SourceFormat};
use thiserror::Error;

use crate::config::{ExtractorConfig, RoutingPolicy};
use crate::extractor::{ExtractContext, ExtractionOutcome, TieredExtractor};

/// Dispatch errors. Extraction shortfall is never one of these.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Unsupported file format: {0:?}. Please upload a PDF, DOCX, or TXT file.")]
    UnsupportedFormat(String),

    #[error("Error reading file: {0}")]
    Read(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Decoding task did not complete: {0}")]
    Join(String),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Resolve the format of `file_name`, failing fast on anything unsupported.
pub fn detect_format(file_name: &str) -> DispatchResult<SourceFormat> {
    SourceFormat::from_file_name(file_name)
        .ok_or_else(|| DispatchError::UnsupportedFormat(file_name.to_string()))
}

/// Routes uploads to a decoder and the decoded text to the extractor chain.
///
/// Stateless between calls: no cache, no retry, no timeout.
pub struct Dispatcher {
    config: ExtractorConfig,
    extractor: TieredExtractor,
    decoders: HashMap<SourceFormat, Arc<dyn DocumentDecoder>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

impl Dispatcher {
    /// A dispatcher with the built-in plain-text decoder and, when the `pdf`
    /// feature is on, the `lopdf` decoder.
    pub fn new(config: ExtractorConfig) -> Self {
        let mut dispatcher = Self {
            extractor: TieredExtractor::new(&config),
            config,
            decoders: HashMap::new(),
        };
        dispatcher.register_decoder(Arc::new(PlainTextDecoder));
        #[cfg(feature = "pdf")]
        dispatcher.register_decoder(Arc::new(lens_rx_decode::PdfTextDecoder));
        dispatcher
    }

    /// Install (or replace) the decoder for its format.
    pub fn register_decoder(&mut self, decoder: Arc<dyn DocumentDecoder>) {
        self.decoders.insert(decoder.format(), decoder);
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn DocumentDecoder>) -> Self {
        self.register_decoder(decoder);
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract from text that is already decoded.
    pub fn extract_text(
        &self,
        text: &str,
        format: SourceFormat,
        ctx: &ExtractContext,
    ) -> ExtractionOutcome {
        let sectioned = format.is_plain_text() || self.config.routing == RoutingPolicy::Unified;
        let outcome = if sectioned {
            self.extractor.extract_sectioned(text, ctx)
        } else {
            self.extractor.extract_whole_text(text, ctx)
        };

        tracing::debug!(
            format = %format,
            tier = %outcome.tier,
            recovered = outcome.draft.recovered.len(),
            "extracted prescription draft"
        );
        outcome
    }

    /// Read, decode and extract a file on disk.
    pub async fn extract_file(
        &self,
        path: &Path,
        ctx: &ExtractContext,
    ) -> DispatchResult<ExtractionOutcome> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let format = detect_format(file_name)?;

        let bytes = tokio::fs::read(path).await?;
        self.decode_and_extract(format, bytes, ctx).await
    }

    /// Decode and extract an in-memory upload named `file_name`.
    pub async fn extract_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        ctx: &ExtractContext,
    ) -> DispatchResult<ExtractionOutcome> {
        let format = detect_format(file_name)?;
        self.decode_and_extract(format, bytes, ctx).await
    }

    async fn decode_and_extract(
        &self,
        format: SourceFormat,
        bytes: Vec<u8>,
        ctx: &ExtractContext,
    ) -> DispatchResult<ExtractionOutcome> {
        let decoder = self
            .decoders
            .get(&format)
            .cloned()
            .ok_or(DecodeError::Unavailable(format))?;

        let decoded = tokio::task::spawn_blocking(move || decoder.decode(&bytes))
            .await
            .map_err(|e| DispatchError::Join(e.to_string()))?;

        let text = decoded.map_err(|e| {
            tracing::warn!(format = %format, error = %e, "document decoding failed");
            e
        })?;

        let outcome = self.extract_text(&text, format, ctx);
        tracing::info!(
            format = %format,
            tier = %outcome.tier,
            recovered = outcome.draft.recovered.len(),
            "prescription file extracted"
        );
        Ok(outcome)
    }
}
