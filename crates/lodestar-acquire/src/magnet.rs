//! Magnet locator parsing.

use url::Url;

use crate::error::{AcquireError, AcquireResult};
use crate::info_hash::InfoHash;

const MAGNET_SCHEME: &str = "magnet:";
const BTIH_PREFIX: &str = "urn:btih:";
const BTMH_PREFIX: &str = "urn:btmh:";
/// Multihash header for a 32-byte SHA-256 digest.
const SHA256_MULTIHASH: &str = "1220";

/// Parsed magnet locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagnetLink {
    /// Content identifier taken from the exact-topic parameter.
    pub info_hash: InfoHash,
    /// Optional display name (`dn`).
    pub display_name: Option<String>,
    /// Tracker announce URLs (`tr`) in the order supplied.
    pub trackers: Vec<String>,
}

impl MagnetLink {
    /// Parse a magnet locator.
    ///
    /// A v1 `urn:btih:` topic wins over a v2 `urn:btmh:` topic when both are present.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::MalformedLocator`] for anything that is not a magnet locator with a
    /// usable exact topic.
    pub fn parse(locator: &str) -> AcquireResult<Self> {
        let trimmed = locator.trim();
        if !is_magnet(trimmed) {
            return Err(malformed(locator, "not a magnet locator"));
        }
        let url = Url::parse(trimmed).map_err(|_| malformed(locator, "unparseable magnet locator"))?;

        let mut v1 = None;
        let mut v2 = None;
        let mut display_name = None;
        let mut trackers = Vec::new();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "xt" => {
                    if let Some(hash) = strip_prefix_ignore_case(&value, BTIH_PREFIX) {
                        v1.get_or_insert_with(|| hash.to_string());
                    } else if let Some(hash) = strip_prefix_ignore_case(&value, BTMH_PREFIX) {
                        v2.get_or_insert_with(|| hash.to_string());
                    }
                }
                "dn" if !value.trim().is_empty() => {
                    display_name.get_or_insert_with(|| value.trim().to_string());
                }
                "tr" if !value.trim().is_empty() => trackers.push(value.trim().to_string()),
                _ => {}
            }
        }

        let info_hash = match (v1, v2) {
            (Some(hash), _) => {
                InfoHash::parse(&hash).map_err(|_| malformed(locator, "invalid btih info-hash"))?
            }
            (None, Some(multihash)) => strip_prefix_ignore_case(&multihash, SHA256_MULTIHASH)
                .filter(|digest| digest.len() == 64)
                .and_then(|digest| InfoHash::parse(digest).ok())
                .ok_or_else(|| malformed(locator, "invalid btmh info-hash"))?,
            (None, None) => return Err(malformed(locator, "missing exact topic")),
        };

        Ok(Self {
            info_hash,
            display_name,
            trackers,
        })
    }
}

/// Whether a locator uses the magnet scheme (case-insensitive, ignoring leading whitespace).
#[must_use]
pub fn is_magnet(locator: &str) -> bool {
    strip_prefix_ignore_case(locator.trim_start(), MAGNET_SCHEME).is_some()
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

fn malformed(locator: &str, reason: &'static str) -> AcquireError {
    AcquireError::MalformedLocator {
        locator: locator.to_string(),
        reason,
    }
}
