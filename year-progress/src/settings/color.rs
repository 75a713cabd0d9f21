//! Validated `#RRGGBB` color values

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 6-digit hex RGB color such as `#FF6B35`.
///
/// Can only be built from a string that passes [`HexColor::parse`], so a
/// settings record never holds a malformed color. Hex digits keep the case
/// they were entered with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    pub fn parse(value: &str) -> Result<Self> {
        Self::try_from(value.to_string())
    }

    /// Wrap a compile-time constant known to be valid
    pub(crate) fn from_static(value: &'static str) -> Self {
        debug_assert!(is_hex_color(value), "invalid color constant {value}");
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn invalid_color(value: &str) -> AppError {
    AppError::Validation(format!("Color must be in #RRGGBB format, got {:?}", value))
}

fn is_hex_color(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(u8::is_ascii_hexdigit)
}

impl TryFrom<String> for HexColor {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        if is_hex_color(&value) {
            Ok(Self(value))
        } else {
            Err(invalid_color(&value))
        }
    }
}

impl FromStr for HexColor {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_six_digit_hex() {
        assert_eq!(HexColor::parse("#FF6B35").unwrap().as_str(), "#FF6B35");
        assert_eq!(HexColor::parse("#a55eea").unwrap().as_str(), "#a55eea");
    }

    #[test]
    fn test_rejects_malformed_colors() {
        for input in ["red", "#FFF", "FF6B35", "#FF6B3", "#FF6B355", "#GG6B35", ""] {
            let result = HexColor::parse(input);
            assert!(
                matches!(result, Err(AppError::Validation(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_deserialize_rejects_invalid_string() {
        let ok: HexColor = serde_json::from_str("\"#1E90FF\"").unwrap();
        assert_eq!(ok.to_string(), "#1E90FF");

        let err = serde_json::from_str::<HexColor>("\"blue\"");
        assert!(err.is_err());
    }
}
