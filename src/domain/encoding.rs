/*!
 * Tag file character encodings
 */

use crate::error::{BagitError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Encoding declared by `Tag-File-Character-Encoding`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TagFileEncoding {
    #[default]
    Utf8,
    UsAscii,
    Latin1,
    /// UTF-16 with byte order mark (big endian when absent)
    Utf16,
    Utf16Be,
    Utf16Le,
}

const BOM: char = '\u{feff}';

impl TagFileEncoding {
    /// Canonical name written to `bagit.txt`
    pub fn name(&self) -> &'static str {
        match self {
            TagFileEncoding::Utf8 => "UTF-8",
            TagFileEncoding::UsAscii => "US-ASCII",
            TagFileEncoding::Latin1 => "ISO-8859-1",
            TagFileEncoding::Utf16 => "UTF-16",
            TagFileEncoding::Utf16Be => "UTF-16BE",
            TagFileEncoding::Utf16Le => "UTF-16LE",
        }
    }

    /// Decode raw tag file bytes into text
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        let text = match self {
            TagFileEncoding::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| BagitError::invalid_format(format!("Invalid UTF-8 in tag file: {}", e)))?,
            TagFileEncoding::UsAscii => {
                if let Some(pos) = bytes.iter().position(|b| !b.is_ascii()) {
                    return Err(BagitError::invalid_format(format!(
                        "Non US-ASCII byte at offset {}",
                        pos
                    )));
                }
                bytes.iter().map(|b| *b as char).collect()
            }
            TagFileEncoding::Latin1 => bytes.iter().map(|b| *b as char).collect(),
            TagFileEncoding::Utf16 => match bytes {
                [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes)?,
                [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes)?,
                _ => decode_utf16(bytes, u16::from_be_bytes)?,
            },
            TagFileEncoding::Utf16Be => decode_utf16(bytes, u16::from_be_bytes)?,
            TagFileEncoding::Utf16Le => decode_utf16(bytes, u16::from_le_bytes)?,
        };

        Ok(text.strip_prefix(BOM).map(str::to_string).unwrap_or(text))
    }

    /// Encode text for writing a tag file
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        match self {
            TagFileEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TagFileEncoding::UsAscii | TagFileEncoding::Latin1 => {
                let limit = if *self == TagFileEncoding::UsAscii { 0x7F } else { 0xFF };
                text.chars()
                    .map(|c| {
                        u8::try_from(u32::from(c))
                            .ok()
                            .filter(|b| u32::from(*b) <= limit)
                            .ok_or_else(|| {
                                BagitError::invalid_format(format!(
                                    "Character [{}] cannot be written as {}",
                                    c,
                                    self.name()
                                ))
                            })
                    })
                    .collect()
            }
            TagFileEncoding::Utf16 => {
                let mut out = vec![0xFE, 0xFF];
                out.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
                Ok(out)
            }
            TagFileEncoding::Utf16Be => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
            TagFileEncoding::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
        }
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(BagitError::invalid_format(
            "UTF-16 tag file has an odd number of bytes",
        ));
    }

    let units = bytes.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| BagitError::invalid_format(format!("Invalid UTF-16 in tag file: {}", e)))
}

impl fmt::Display for TagFileEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for TagFileEncoding {
    type Err = BagitError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "UTF8" => Ok(TagFileEncoding::Utf8),
            "USASCII" | "ASCII" => Ok(TagFileEncoding::UsAscii),
            "ISO88591" | "LATIN1" => Ok(TagFileEncoding::Latin1),
            "UTF16" => Ok(TagFileEncoding::Utf16),
            "UTF16BE" => Ok(TagFileEncoding::Utf16Be),
            "UTF16LE" => Ok(TagFileEncoding::Utf16Le),
            _ => Err(BagitError::UnsupportedEncoding(s.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("UTF-8".parse::<TagFileEncoding>().unwrap(), TagFileEncoding::Utf8);
        assert_eq!("utf8".parse::<TagFileEncoding>().unwrap(), TagFileEncoding::Utf8);
        assert_eq!(
            "iso-8859-1".parse::<TagFileEncoding>().unwrap(),
            TagFileEncoding::Latin1
        );
        assert!(matches!(
            "EBCDIC".parse::<TagFileEncoding>(),
            Err(BagitError::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let text = TagFileEncoding::Utf8
            .decode(b"\xEF\xBB\xBFBagIt-Version: 0.97")
            .unwrap();
        assert_eq!(text, "BagIt-Version: 0.97");
    }

    #[test]
    fn test_latin1_decode() {
        let text = TagFileEncoding::Latin1.decode(b"caf\xE9").unwrap();
        assert_eq!(text, "caf\u{e9}");
    }

    #[test]
    fn test_ascii_rejects_high_bytes() {
        assert!(TagFileEncoding::UsAscii.decode(b"caf\xE9").is_err());
        assert!(TagFileEncoding::UsAscii.encode("caf\u{e9}").is_err());
    }

    #[test]
    fn test_utf16_with_bom() {
        let bytes = TagFileEncoding::Utf16.encode("K: v").unwrap();
        assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
        assert_eq!(TagFileEncoding::Utf16.decode(&bytes).unwrap(), "K: v");

        let le = TagFileEncoding::Utf16Le.encode("K: v").unwrap();
        let mut with_bom = vec![0xFF, 0xFE];
        with_bom.extend(le);
        assert_eq!(TagFileEncoding::Utf16.decode(&with_bom).unwrap(), "K: v");
    }

    #[test]
    fn test_invalid_utf8() {
        let err = TagFileEncoding::Utf8.decode(&[0xC3, 0x28]).unwrap_err();
        assert!(matches!(err, BagitError::InvalidBagitFileFormat(_)));
    }
}
