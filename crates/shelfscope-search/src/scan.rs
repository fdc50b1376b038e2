//! Acceptance of decoded barcodes from a scanner.
//!
//! The scanner itself is external; it hands over zero or more decoded codes
//! per poll and these go through the same ISBN gate as typed input.

use crate::identifiers::isbn::IsbnCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbology {
    Ean13,
    Ean8,
    Code128,
    Other(String),
}

impl Symbology {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "ean_13" | "ean13" => Self::Ean13,
            "ean_8" | "ean8" => Self::Ean8,
            "code_128" | "code128" => Self::Code128,
            other => Self::Other(other.to_string()),
        }
    }

    /// Only EAN-13, EAN-8 and Code-128 can carry a book identifier.
    pub fn is_relevant(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedCode {
    pub symbology: Symbology,
    pub raw: String,
}

impl ScannedCode {
    pub fn new(symbology: Symbology, raw: impl Into<String>) -> Self {
        Self {
            symbology,
            raw: raw.into(),
        }
    }

    /// Parse `"<symbology>:<value>"`; a bare value is taken as EAN-13.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match line.split_once(':') {
            Some((name, value)) => Some(Self::new(Symbology::from_name(name), value.trim())),
            None => Some(Self::new(Symbology::Ean13, line)),
        }
    }
}

/// First relevant code in a poll that passes the ISBN gate.
pub fn accept_scan(codes: &[ScannedCode]) -> Option<IsbnCode> {
    codes
        .iter()
        .filter(|c| c.symbology.is_relevant())
        .find_map(|c| IsbnCode::parse(&c.raw).ok())
}
