//! Error types for torrent acquisition.
//!
//! # Design
//! - Messages are constant; locators, titles and reasons live in fields.
//! - Every failure maps onto a [`FailureKind`] so callers can branch without string matching.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::backend::SubmitError;
use crate::fetch::FetchFailure;
use crate::metainfo::MetainfoError;

/// Classification of a resolution failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A locator string could not be interpreted.
    MalformedLocator,
    /// The remote server violated the expected HTTP contract.
    ProtocolError,
    /// Transport or HTTP-level failure while retrieving a `.torrent` file.
    FetchFailed,
    /// The backend rejected the attempted protocol.
    CapabilityUnsupported,
    /// The backend rejected the protocol and no fallback remained.
    UnsupportedProtocol,
    /// Terminal failure on the HTTP path.
    DownloadFailed,
    /// The release carried no usable locator.
    NoUsableLocator,
    /// The fetched payload was not a valid `.torrent` file.
    InvalidTorrent,
    /// The backend failed for a reason other than protocol support.
    SubmissionFailed,
    /// The caller cancelled the resolution.
    Cancelled,
}

impl FailureKind {
    /// Machine-friendly label used in logs and CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedLocator => "malformed_locator",
            Self::ProtocolError => "protocol_error",
            Self::FetchFailed => "fetch_failed",
            Self::CapabilityUnsupported => "capability_unsupported",
            Self::UnsupportedProtocol => "unsupported_protocol",
            Self::DownloadFailed => "download_failed",
            Self::NoUsableLocator => "no_usable_locator",
            Self::InvalidTorrent => "invalid_torrent",
            Self::SubmissionFailed => "submission_failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Primary error type for acquisition.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// A locator string could not be interpreted.
    #[error("malformed locator")]
    MalformedLocator {
        /// Offending locator as supplied.
        locator: String,
        /// Static reason for the rejection.
        reason: &'static str,
    },
    /// The remote server violated the expected HTTP contract.
    #[error("remote server violated the HTTP contract")]
    Protocol {
        /// URL of the response that broke the contract.
        url: String,
        /// Static description of the violation.
        reason: &'static str,
    },
    /// Transport or HTTP-level failure while retrieving a `.torrent` file.
    #[error("torrent fetch failed")]
    FetchFailed {
        /// URL being fetched when the failure occurred.
        url: String,
        /// Underlying failure.
        #[source]
        source: FetchFailure,
    },
    /// The fetched payload was not a valid `.torrent` file.
    #[error("torrent payload invalid")]
    InvalidTorrent {
        /// Underlying validation failure.
        #[source]
        source: MetainfoError,
    },
    /// The backend failed for a reason other than protocol support.
    #[error("backend submission failed")]
    SubmissionFailed {
        /// Underlying backend failure.
        #[source]
        source: SubmitError,
    },
    /// The backend rejected the protocol and no fallback remained.
    #[error("download client does not support the available protocol")]
    UnsupportedProtocol {
        /// Backend that rejected the submission.
        backend: &'static str,
        /// Rejection reported by the backend.
        #[source]
        source: SubmitError,
    },
    /// Terminal failure on the HTTP path.
    #[error("torrent download failed")]
    DownloadFailed {
        /// Title of the release being acquired.
        title: String,
        /// Failure that ended the HTTP path.
        #[source]
        source: Box<AcquireError>,
    },
    /// The release carried no usable locator.
    #[error("release has no usable locator")]
    NoUsableLocator {
        /// Title of the release.
        title: String,
    },
    /// The caller cancelled the resolution.
    #[error("resolution cancelled")]
    Cancelled,
}

impl AcquireError {
    /// Classify the failure.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::MalformedLocator { .. } => FailureKind::MalformedLocator,
            Self::Protocol { .. } => FailureKind::ProtocolError,
            Self::FetchFailed { .. } => FailureKind::FetchFailed,
            Self::InvalidTorrent { .. } => FailureKind::InvalidTorrent,
            Self::SubmissionFailed { .. } => FailureKind::SubmissionFailed,
            Self::UnsupportedProtocol { .. } => FailureKind::UnsupportedProtocol,
            Self::DownloadFailed { .. } => FailureKind::DownloadFailed,
            Self::NoUsableLocator { .. } => FailureKind::NoUsableLocator,
            Self::Cancelled => FailureKind::Cancelled,
        }
    }

    /// Wrap a failure that ended the HTTP path.
    #[must_use]
    pub fn download_failed(title: impl Into<String>, cause: Self) -> Self {
        Self::DownloadFailed {
            title: title.into(),
            source: Box::new(cause),
        }
    }

    /// `Retry-After` hint from a rate-limited fetch, looking through `DownloadFailed`.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::DownloadFailed { source, .. } => source.retry_after(),
            Self::FetchFailed {
                source: FetchFailure::Status { retry_after, .. },
                ..
            } => *retry_after,
            _ => None,
        }
    }

    /// Whether the indexer reported the `.torrent` file as gone (HTTP 404).
    #[must_use]
    pub fn is_release_unavailable(&self) -> bool {
        match self {
            Self::DownloadFailed { source, .. } => source.is_release_unavailable(),
            Self::FetchFailed {
                source: FetchFailure::Status { status, .. },
                ..
            } => *status == 404,
            _ => false,
        }
    }
}

/// Convenience alias for acquisition results.
pub type AcquireResult<T> = Result<T, AcquireError>;

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;
    use crate::backend::SubmissionProtocol;

    fn rate_limited() -> AcquireError {
        AcquireError::FetchFailed {
            url: "http://indexer.example/t/1".into(),
            source: FetchFailure::Status {
                status: 429,
                retry_after: Some(Duration::from_secs(60)),
            },
        }
    }

    #[test]
    fn messages_are_constant_and_sources_preserved() {
        let cases = vec![
            (
                AcquireError::MalformedLocator {
                    locator: "magnet:".into(),
                    reason: "missing exact topic",
                },
                "malformed locator",
                false,
            ),
            (
                AcquireError::Protocol {
                    url: "http://example/bad".into(),
                    reason: "redirect without location",
                },
                "remote server violated the HTTP contract",
                false,
            ),
            (rate_limited(), "torrent fetch failed", true),
            (
                AcquireError::InvalidTorrent {
                    source: MetainfoError::MissingInfo,
                },
                "torrent payload invalid",
                true,
            ),
            (
                AcquireError::UnsupportedProtocol {
                    backend: "blackhole",
                    source: SubmitError::CapabilityUnsupported {
                        backend: "blackhole",
                        protocol: SubmissionProtocol::Magnet,
                    },
                },
                "download client does not support the available protocol",
                true,
            ),
            (
                AcquireError::download_failed("Show.S01E01", rate_limited()),
                "torrent download failed",
                true,
            ),
            (
                AcquireError::NoUsableLocator {
                    title: "Show.S01E01".into(),
                },
                "release has no usable locator",
                false,
            ),
            (AcquireError::Cancelled, "resolution cancelled", false),
        ];

        for (err, message, has_source) in cases {
            assert_eq!(err.to_string(), message);
            assert_eq!(err.source().is_some(), has_source, "{message}");
        }
    }

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(rate_limited().kind(), FailureKind::FetchFailed);
        assert_eq!(
            AcquireError::download_failed("t", rate_limited()).kind(),
            FailureKind::DownloadFailed
        );
        assert_eq!(AcquireError::Cancelled.kind().as_str(), "cancelled");
        assert_eq!(FailureKind::ProtocolError.to_string(), "protocol_error");
    }

    #[test]
    fn retry_hints_survive_wrapping() {
        let wrapped = AcquireError::download_failed("Show.S01E01", rate_limited());
        assert_eq!(wrapped.retry_after(), Some(Duration::from_secs(60)));
        assert!(!wrapped.is_release_unavailable());

        let gone = AcquireError::download_failed(
            "Show.S01E01",
            AcquireError::FetchFailed {
                url: "http://indexer.example/t/2".into(),
                source: FetchFailure::Status {
                    status: 404,
                    retry_after: None,
                },
            },
        );
        assert!(gone.is_release_unavailable());
        assert_eq!(gone.retry_after(), None);
        assert_eq!(AcquireError::Cancelled.retry_after(), None);
    }
}
