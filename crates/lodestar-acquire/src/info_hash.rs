//! Content identifiers shared by magnet locators and `.torrent` payloads.
//!
//! # Design
//! - Identifiers are stored as lowercase hex so equality is stable across sources.
//! - Comparison against foreign strings (backend responses) ignores ASCII case.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of a hex-encoded SHA-1 info-hash.
pub const V1_HEX_LEN: usize = 40;
/// Length of a base32-encoded SHA-1 info-hash.
pub const V1_BASE32_LEN: usize = 32;
/// Longest hex identifier accepted (a SHA-256 v2 info-hash).
pub const MAX_HEX_LEN: usize = 64;

/// Errors produced while parsing an info-hash string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InfoHashError {
    /// The identifier was empty after trimming.
    #[error("info-hash is empty")]
    Empty,
    /// The identifier was longer than any supported digest.
    #[error("info-hash is too long")]
    TooLong {
        /// Observed length in characters.
        len: usize,
    },
    /// The identifier contained characters outside the accepted alphabet.
    #[error("info-hash contains invalid characters")]
    InvalidCharacter,
}

/// Hex-encoded torrent content identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InfoHash(String);

impl InfoHash {
    /// Parse a hex identifier, or a 32-character base32 SHA-1 which is converted to hex.
    ///
    /// # Errors
    ///
    /// Returns an [`InfoHashError`] when the value is empty, too long or not valid hex/base32.
    pub fn parse(value: &str) -> Result<Self, InfoHashError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(InfoHashError::Empty);
        }
        if value.len() > MAX_HEX_LEN {
            return Err(InfoHashError::TooLong { len: value.len() });
        }
        // 32 characters is the base32 form of a SHA-1; hex digests are never that long.
        if value.len() == V1_BASE32_LEN
            && let Some(digest) = decode_base32(value)
        {
            return Ok(Self::from_digest(&digest));
        }
        if value.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Ok(Self(value.to_ascii_lowercase()));
        }
        Err(InfoHashError::InvalidCharacter)
    }

    /// Build an identifier from a raw digest.
    #[must_use]
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// Borrow the lowercase hex representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against an identifier reported by someone else.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl Display for InfoHash {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl FromStr for InfoHash {
    type Err = InfoHashError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for InfoHash {
    type Error = InfoHashError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InfoHash> for String {
    fn from(value: InfoHash) -> Self {
        value.0
    }
}

fn decode_base32(value: &str) -> Option<[u8; 20]> {
    let mut out = [0_u8; 20];
    let mut written = 0;
    let mut buffer: u64 = 0;
    let mut bits: u32 = 0;
    for ch in value.chars() {
        buffer = (buffer << 5) | u64::from(base32_value(ch)?);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            let slot = out.get_mut(written)?;
            *slot = u8::try_from((buffer >> bits) & 0xff).ok()?;
            written += 1;
        }
    }
    (written == out.len()).then_some(out)
}

fn base32_value(ch: char) -> Option<u8> {
    let upper = u8::try_from(ch.to_ascii_uppercase()).ok()?;
    match upper {
        b'A'..=b'Z' => Some(upper - b'A'),
        b'2'..=b'7' => Some(upper - b'2' + 26),
        _ => None,
    }
}
