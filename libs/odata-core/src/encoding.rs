use std::fmt;

use serde::Serialize;

/// Text encodings a formatter can read and write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TextEncoding {
    Utf8,
    Utf16,
}

impl TextEncoding {
    /// Advertised order for every descriptor.
    pub const SUPPORTED: [TextEncoding; 2] = [TextEncoding::Utf8, TextEncoding::Utf16];

    /// Human-readable name surfaced to negotiation consumers.
    pub fn display_name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "Unicode (UTF-8)",
            TextEncoding::Utf16 => "Unicode",
        }
    }

    /// IANA charset label used in `Content-Type` headers.
    pub fn charset(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16 => "utf-16",
        }
    }

    pub fn from_charset(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(TextEncoding::Utf8),
            "utf-16" | "utf16" | "unicode" | "utf-16le" | "utf-16be" => {
                Some(TextEncoding::Utf16)
            }
            _ => None,
        }
    }
}

/// Byte order of UTF-16 text that carries no BOM.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    /// `utf-16le` pins little-endian; every other label reads big-endian.
    pub fn from_charset(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("utf-16le") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
