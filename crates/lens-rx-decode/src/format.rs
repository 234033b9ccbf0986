//! Source formats accepted for upload.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Container format of an uploaded prescription document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Pdf,
    Docx,
    Txt,
}

impl SourceFormat {
    /// Resolve a format from a lowercase file extension (no leading dot).
    ///
    /// Matching is exact: callers lowercase the extension first, the way
    /// [`SourceFormat::from_file_name`] does.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Resolve a format from a file name, using the text after the last dot.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_lowercase();
        Self::from_extension(&ext)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
        }
    }

    /// Plain text is the only format typed directly by a person; the others
    /// come out of a converter.
    pub fn is_plain_text(&self) -> bool {
        matches!(self, Self::Txt)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
