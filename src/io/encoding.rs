//! Text decodings tried when reading voter extracts.

use std::{borrow::Cow, fmt};

use encoding_rs::Encoding;
use serde::Deserialize;

/// A single-pass byte decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum TextEncoding {
    Utf8,
    Latin1,
    Cp1252,
    Iso8859_1,
}

impl TextEncoding {
    /// Default order: UTF-8, Latin-1, CP1252, ISO-8859-1.
    pub fn fallback_order() -> [TextEncoding; 4] {
        [TextEncoding::Utf8, TextEncoding::Latin1, TextEncoding::Cp1252, TextEncoding::Iso8859_1]
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Cp1252 => "cp1252",
            TextEncoding::Iso8859_1 => "iso-8859-1",
        }
    }

    /// WHATWG decoder behind this name. Latin-1 and ISO-8859-1 labels resolve
    /// to windows-1252, which every byte sequence decodes under.
    pub fn encoding(&self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8 => encoding_rs::UTF_8,
            TextEncoding::Latin1 | TextEncoding::Cp1252 | TextEncoding::Iso8859_1 => encoding_rs::WINDOWS_1252,
        }
    }

    /// Decode `bytes`, or `None` if they are not valid in this encoding.
    /// A leading UTF-8 byte order mark is dropped.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        let bytes = match self {
            TextEncoding::Utf8 => bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes),
            _ => bytes,
        };
        self.encoding()
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(Cow::into_owned)
    }
}

impl TryFrom<String> for TextEncoding {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        match name.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "latin-1" | "latin1" => Ok(TextEncoding::Latin1),
            "cp1252" | "windows-1252" => Ok(TextEncoding::Cp1252),
            "iso-8859-1" | "iso8859-1" => Ok(TextEncoding::Iso8859_1),
            _ => Err(format!("unsupported encoding: {name}")),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}
