//! Decoder abstraction and the decoders that need no external engine.

use thiserror::Error;

use crate::format::SourceFormat;

/// Decoding errors.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Error reading file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse PDF file: {0}")]
    Pdf(String),

    #[error("Failed to parse DOCX file: {0}")]
    Docx(String),

    #[error("No decoder configured for {0} files")]
    Unavailable(SourceFormat),
}

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Turns the raw bytes of one uploaded document into a single text blob.
///
/// Implementations are synchronous and may be slow; callers that need an
/// async boundary run them on a blocking thread.
pub trait DocumentDecoder: Send + Sync {
    /// The format this decoder understands.
    fn format(&self) -> SourceFormat;

    /// Decode the whole document. Multi-page sources are concatenated in
    /// page order.
    fn decode(&self, bytes: &[u8]) -> DecodeResult<String>;
}

/// Decoder for `.txt` uploads.
///
/// Invalid UTF-8 sequences are replaced rather than rejected, and a leading
/// byte-order mark is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextDecoder;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

impl DocumentDecoder for PlainTextDecoder {
    fn format(&self) -> SourceFormat {
        SourceFormat::Txt
    }

    fn decode(&self, bytes: &[u8]) -> DecodeResult<String> {
        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        Ok(String::from_utf8_lossy(body).into_owned())
    }
}

/// Mock decoder for testing without a real PDF/DOCX engine.
///
/// Ignores the input bytes and returns either canned text or a canned failure.
#[derive(Debug, Clone)]
pub struct MockDecoder {
    format: SourceFormat,
    outcome: Result<String, String>,
}

impl MockDecoder {
    /// A decoder that always yields `text`.
    pub fn returning(format: SourceFormat, text: impl Into<String>) -> Self {
        Self {
            format,
            outcome: Ok(text.into()),
        }
    }

    /// A decoder that always fails with `message`.
    pub fn failing(format: SourceFormat, message: impl Into<String>) -> Self {
        Self {
            format,
            outcome: Err(message.into()),
        }
    }
}

impl DocumentDecoder for MockDecoder {
    fn format(&self) -> SourceFormat {
        self.format
    }

    fn decode(&self, _bytes: &[u8]) -> DecodeResult<String> {
        match &self.outcome {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(match self.format {
                SourceFormat::Pdf => DecodeError::Pdf(message.clone()),
                SourceFormat::Docx => DecodeError::Docx(message.clone()),
                SourceFormat::Txt => DecodeError::Read(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    message.clone(),
                )),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passthrough() {
        let text = PlainTextDecoder.decode(b"Patient: Jane Roe\nPD: 62").unwrap();
        assert_eq!(text, "Patient: Jane Roe\nPD: 62");
    }

    #[test]
    fn test_plain_text_strips_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"SPH1: -2.25");
        assert_eq!(PlainTextDecoder.decode(&bytes).unwrap(), "SPH1: -2.25");
    }

    #[test]
    fn test_plain_text_replaces_invalid_utf8() {
        let text = PlainTextDecoder.decode(&[b'O', b'D', 0xFF, b'!']).unwrap();
        assert_eq!(text, "OD\u{FFFD}!");
    }

    #[test]
    fn test_mock_returning() {
        let decoder = MockDecoder::returning(SourceFormat::Pdf, "PD: 64");
        assert_eq!(decoder.format(), SourceFormat::Pdf);
        assert_eq!(decoder.decode(b"%PDF-1.4").unwrap(), "PD: 64");
    }

    #[test]
    fn test_mock_failing() {
        let decoder = MockDecoder::failing(SourceFormat::Docx, "corrupt archive");
        let err = decoder.decode(b"PK").unwrap_err();
        assert!(matches!(err, DecodeError::Docx(_)));
        assert_eq!(err.to_string(), "Failed to parse DOCX file: corrupt archive");
    }

    #[test]
    fn test_unavailable_message() {
        let err = DecodeError::Unavailable(SourceFormat::Pdf);
        assert_eq!(err.to_string(), "No decoder configured for pdf files");
    }
}
