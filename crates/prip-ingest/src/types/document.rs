//! Inbound document types

use serde::{Deserialize, Serialize};

/// Declared format of an inbound document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    /// Office Open XML word processing document (.docx)
    Docx,
    /// Rich Text Format
    Rtf,
    /// Legacy Word document (.doc); often RTF under a different name
    Doc,
    /// Plain UTF-8 text
    Plain,
}

impl FormatTag {
    /// Detect format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_lowercase().as_str() {
            "docx" => Some(Self::Docx),
            "rtf" => Some(Self::Rtf),
            "doc" => Some(Self::Doc),
            "txt" | "text" => Some(Self::Plain),
            _ => None,
        }
    }

    /// Detect format from a filename
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    /// Whether the format goes through the control-word strip
    pub fn is_rtf_like(&self) -> bool {
        matches!(self, Self::Rtf | Self::Doc)
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Docx => "Word Document (.docx)",
            Self::Rtf => "Rich Text Format",
            Self::Doc => "Word Document (.doc)",
            Self::Plain => "Text File",
        }
    }
}

impl std::fmt::Display for FormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::Docx => "docx",
            Self::Rtf => "rtf",
            Self::Doc => "doc",
            Self::Plain => "plain",
        };
        f.write_str(tag)
    }
}

/// An uploaded document as handed over by the transport
#[derive(Debug, Clone)]
pub struct InboundDocument {
    /// Filename as sent, used for format detection and messages
    pub filename: String,
    /// Raw bytes
    pub data: Vec<u8>,
}

impl InboundDocument {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// Lowercased extension, or empty when the name has none
    pub fn extension(&self) -> String {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default()
    }
}
