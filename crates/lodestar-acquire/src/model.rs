//! Release records and resolution outcomes.

use serde::{Deserialize, Serialize};

use crate::backend::SubmissionProtocol;
use crate::info_hash::InfoHash;
use crate::magnet::is_magnet;
use crate::sanitize::torrent_file_name;

/// A release chosen for download, as supplied by release discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    /// Human-readable release title.
    pub title: String,
    /// Primary locator: a magnet locator or an HTTP(S) URL to a `.torrent` file.
    pub download_url: String,
    /// Magnet override that wins over any magnet in `download_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet_url: Option<String>,
    /// Indexer the release came from, used as logging context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexer: Option<String>,
}

/// Candidate locators derived from a [`ReleaseRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locators<'a> {
    /// Magnet candidate, tried first by default.
    pub magnet: Option<&'a str>,
    /// HTTP(S) candidate.
    pub http: Option<&'a str>,
}

impl Locators<'_> {
    /// Whether neither candidate is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.magnet.is_none() && self.http.is_none()
    }
}

impl ReleaseRecord {
    /// Build a record with only a primary locator.
    #[must_use]
    pub fn new(title: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            download_url: download_url.into(),
            magnet_url: None,
            indexer: None,
        }
    }

    /// Attach a magnet override.
    #[must_use]
    pub fn with_magnet(mut self, magnet_url: impl Into<String>) -> Self {
        self.magnet_url = Some(magnet_url.into());
        self
    }

    /// Attach the originating indexer name.
    #[must_use]
    pub fn with_indexer(mut self, indexer: impl Into<String>) -> Self {
        self.indexer = Some(indexer.into());
        self
    }

    /// Split the record into its magnet and HTTP candidates.
    ///
    /// A non-blank override wins over a magnet primary locator. Only `http`/`https` primary
    /// locators count as HTTP candidates; anything else is ignored.
    #[must_use]
    pub fn locators(&self) -> Locators<'_> {
        let primary = non_blank(&self.download_url);
        let override_magnet = self.magnet_url.as_deref().and_then(non_blank);

        let primary_magnet = primary.filter(|locator| is_magnet(locator));
        let http = primary.filter(|locator| is_http(locator));

        Locators {
            magnet: override_magnet.or(primary_magnet),
            http,
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn is_http(locator: &str) -> bool {
    locator
        .split_once(':')
        .is_some_and(|(scheme, _)| {
            scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
        })
}

/// A fetched `.torrent` file ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentPayload {
    /// Sanitised filename ending in `.torrent`.
    pub filename: String,
    /// Raw payload bytes.
    pub bytes: Vec<u8>,
}

impl TorrentPayload {
    /// Wrap `bytes`, naming the file after `title`.
    #[must_use]
    pub fn new(title: &str, bytes: Vec<u8>) -> Self {
        Self {
            filename: torrent_file_name(title),
            bytes,
        }
    }
}

/// Non-fatal disagreement between the local and backend-reported info-hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyWarning {
    /// Release title.
    pub title: String,
    /// Locator that was submitted.
    pub locator: String,
    /// Info-hash computed locally.
    pub expected: InfoHash,
    /// Info-hash reported by the backend.
    pub reported: String,
}

/// Successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    /// Authoritative info-hash: the backend's when reported, otherwise the local one.
    pub info_hash: String,
    /// Info-hash computed locally from the magnet or the payload.
    pub local_hash: InfoHash,
    /// Protocol used for the successful submission.
    pub protocol: SubmissionProtocol,
    /// Locator that was submitted: the magnet locator, or the URL that served the payload after
    /// redirects.
    pub locator: String,
    /// Present when the backend reported a different info-hash.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<ConsistencyWarning>,
}
