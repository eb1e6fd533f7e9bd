//! Currency codes for fxrate.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A three-letter currency symbol.
///
/// Codes are validated for shape only (three ASCII letters, stored
/// uppercase). Sources regularly quote codes outside ISO 4217, so
/// unrecognized symbols are kept as-is rather than rejected.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Currency([u8; 3]);

/// Error for a symbol that is not three ASCII letters.
#[derive(Debug, Clone, Error)]
#[error("invalid currency code: {0:?}")]
pub struct InvalidCurrency(pub String);

impl Currency {
    /// Parse a currency code, uppercasing it.
    pub fn new(code: &str) -> Result<Self, InvalidCurrency> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(InvalidCurrency(code.to_string()));
        }
        let mut buf = [0u8; 3];
        for (i, b) in bytes.iter().enumerate() {
            buf[i] = b.to_ascii_uppercase();
        }
        Ok(Self(buf))
    }

    /// Get the currency code as a string slice.
    pub fn code(&self) -> &str {
        // Validated ASCII on construction.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }

    /// Common currencies
    pub fn usd() -> Self {
        Self(*b"USD")
    }

    pub fn cny() -> Self {
        Self(*b"CNY")
    }

    pub fn hkd() -> Self {
        Self(*b"HKD")
    }

    pub fn eur() -> Self {
        Self(*b"EUR")
    }

    pub fn jpy() -> Self {
        Self(*b"JPY")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.code())
    }
}

impl FromStr for Currency {
    type Err = InvalidCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Currency::new(&code).map_err(de::Error::custom)
    }
}
