//! Text encodings for string fields.
//!
//! Decoding never replaces bytes: a byte sequence that is invalid for the encoding is an error,
//! and so is a character the encoding cannot represent.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Errors produced when converting between strings and bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    /// The encoding name is not one of the supported encodings.
    #[error("unsupported encoding {0:?}")]
    UnsupportedEncoding(String),
    /// Byte sequence is not valid UTF-8.
    #[error("invalid UTF-8 at byte {0}")]
    InvalidUtf8(usize),
    /// An ASCII-encoded byte is outside 0..=0x7F.
    #[error("byte 0x{0:02X} is not ASCII")]
    InvalidAscii(u8),
    /// The character has no representation in the encoding.
    #[error("character {ch:?} cannot be encoded as {encoding}")]
    Unmappable { ch: char, encoding: Encoding },
}

/// Character encoding of a string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum Encoding {
    /// ISO-8859-1, one byte per character.
    #[default]
    Latin1,
    /// US-ASCII. Every byte must be in 0..=0x7F.
    Ascii,
    /// UTF-8.
    Utf8,
}

impl Encoding {
    pub fn decode(self, bytes: &[u8]) -> Result<String, TextError> {
        match self {
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Ascii => match bytes.iter().find(|b| !b.is_ascii()) {
                Some(&b) => Err(TextError::InvalidAscii(b)),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
            Encoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| TextError::InvalidUtf8(e.valid_up_to())),
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>, TextError> {
        let limit = match self {
            Encoding::Utf8 => return Ok(text.as_bytes().to_vec()),
            Encoding::Latin1 => 0xFF,
            Encoding::Ascii => 0x7F,
        };

        text.chars()
            .map(|ch| {
                if (ch as u32) <= limit {
                    Ok(ch as u8)
                } else {
                    Err(TextError::Unmappable { ch, encoding: self })
                }
            })
            .collect()
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::Latin1 => "ISO-8859-1",
            Encoding::Ascii => "US-ASCII",
            Encoding::Utf8 => "UTF-8",
        })
    }
}

impl FromStr for Encoding {
    type Err = TextError;

    /// Accepts the usual charset names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('_', "-").as_str() {
            "ISO-8859-1" | "ISO8859-1" | "LATIN1" | "LATIN-1" => Ok(Encoding::Latin1),
            "US-ASCII" | "ASCII" => Ok(Encoding::Ascii),
            "UTF-8" | "UTF8" => Ok(Encoding::Utf8),
            _ => Err(TextError::UnsupportedEncoding(s.to_string())),
        }
    }
}
