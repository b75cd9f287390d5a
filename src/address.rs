//! Content addressing for discovered URLs.
//!
//! Every URL is identified by a 128-bit xxh3 digest of its UTF-8 bytes. The
//! digest doubles as the dedup key in the discovery working set and as the
//! comment file name on disk, so it must render identically everywhere: a
//! fixed-width, lowercase, 32-character hex string.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use xxhash_rust::xxh3::xxh3_128;

/// Stable 128-bit content address of a URL.
///
/// Byte-identical URLs always map to the same address; distinct URLs collide
/// only with negligible probability. The address is a proxy for URL identity
/// throughout the crawl state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(u128);

impl Address {
    /// Compute the address of a URL string.
    #[must_use]
    pub fn of_url(url: &str) -> Self {
        Self(xxh3_128(url.as_bytes()))
    }

    /// Render as the canonical 32-character lowercase hex form used for
    /// file names and log framing.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("{:032x}", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({:032x})", self.0)
    }
}

/// Error parsing the canonical hex form of an [`Address`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    #[error("address must be exactly 32 hex characters, got {0}")]
    BadLength(usize),
    #[error("address contains non-hex characters")]
    BadDigit,
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(AddressParseError::BadLength(s.len()));
        }
        // from_str_radix tolerates a leading sign, which is not valid framing
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressParseError::BadDigit);
        }
        u128::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| AddressParseError::BadDigit)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        hex.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_urls_share_an_address() {
        let a = Address::of_url("https://example.com/thread/1");
        let b = Address::of_url("https://example.com/thread/1");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_urls_get_distinct_addresses() {
        let a = Address::of_url("https://example.com/thread/1");
        let b = Address::of_url("https://example.com/thread/2");
        assert_ne!(a, b);
    }

    #[test]
    fn hex_roundtrip() {
        let a = Address::of_url("https://example.com/");
        let hex = a.to_hex();
        assert_eq!(hex.len(), 32);
        assert_eq!(hex.parse::<Address>().unwrap(), a);
    }

    #[test]
    fn rejects_malformed_hex() {
        assert_eq!(
            "abc".parse::<Address>(),
            Err(AddressParseError::BadLength(3))
        );
        assert_eq!(
            "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz".parse::<Address>(),
            Err(AddressParseError::BadDigit)
        );
    }
}
