//! PDF text-layer decoder backed by `lopdf`.
//!
//! Only digital PDFs with an embedded text layer decode to anything useful;
//! scanned pages come back empty (no OCR).

use lopdf::Document;

use crate::decoder::{DecodeError, DecodeResult, DocumentDecoder};
use crate::format::SourceFormat;

/// Concatenates the text of every page, in page order, one page per line
/// block.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextDecoder;

impl DocumentDecoder for PdfTextDecoder {
    fn format(&self) -> SourceFormat {
        SourceFormat::Pdf
    }

    fn decode(&self, bytes: &[u8]) -> DecodeResult<String> {
        let document = Document::load_mem(bytes).map_err(|e| DecodeError::Pdf(e.to_string()))?;

        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        tracing::debug!(pages = page_numbers.len(), "decoding pdf text layer");

        let mut text = String::new();
        for page in page_numbers {
            let page_text = document
                .extract_text(&[page])
                .map_err(|e| DecodeError::Pdf(format!("page {}: {}", page, e)))?;
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&page_text);
        }

        Ok(text)
    }
}
