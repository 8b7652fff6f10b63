//! Text encodings for uploaded and exported CSV bytes

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Single text encoding applied to a whole CSV payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// ISO-8859-1: every byte is the code point of the same value
    #[default]
    Latin1,
    Utf8,
}

impl TextEncoding {
    /// Short label used in messages
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Utf8 => "utf-8",
        }
    }

    /// Decode bytes into text
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            TextEncoding::Utf8 => {
                String::from_utf8(bytes.to_vec()).map_err(|e| Error::Encoding {
                    encoding: self.label(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Encode text into bytes
    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        match self {
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| Error::Encoding {
                        encoding: self.label(),
                        message: format!("character {:?} (U+{:04X}) is not representable", c, u32::from(c)),
                    })
                })
                .collect(),
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_decode_high_bytes() {
        let decoded = TextEncoding::Latin1.decode(b"caf\xe9,\x80").unwrap();
        assert_eq!(decoded, "caf\u{e9},\u{80}");
    }

    #[test]
    fn test_latin1_encode_rejects_wide_chars() {
        assert_eq!(TextEncoding::Latin1.encode("na\u{ef}ve").unwrap(), b"na\xefve");
        let err = TextEncoding::Latin1.encode("\u{20ac}").unwrap_err();
        assert!(matches!(err, Error::Encoding { encoding: "latin-1", .. }));
    }

    #[test]
    fn test_utf8_rejects_invalid_bytes() {
        assert!(TextEncoding::Utf8.decode(b"\xff\xfe").is_err());
        assert_eq!(TextEncoding::Utf8.decode("é".as_bytes()).unwrap(), "é");
    }

    #[test]
    fn test_serde_labels() {
        let json = serde_json::to_string(&TextEncoding::Utf8).unwrap();
        assert_eq!(json, "\"utf8\"");
        let parsed: TextEncoding = serde_json::from_str("\"latin1\"").unwrap();
        assert_eq!(parsed, TextEncoding::Latin1);
    }
}
