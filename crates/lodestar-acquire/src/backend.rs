//! Capability trait implemented by download clients.
//!
//! # Design
//! - Both submission paths default to "unsupported", so a backend only implements what it can do.
//! - Unsupported capability is a classified value the resolver branches on, not a panic.

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::FailureKind;
use crate::info_hash::InfoHash;
use crate::model::{ReleaseRecord, TorrentPayload};

/// How an artifact was handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionProtocol {
    /// A magnet locator.
    Magnet,
    /// Raw `.torrent` bytes.
    TorrentFile,
}

impl SubmissionProtocol {
    /// Label used in logs and CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Magnet => "magnet",
            Self::TorrentFile => "torrent_file",
        }
    }
}

impl Display for SubmissionProtocol {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Failure reported by a [`DownloadBackend`].
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The backend cannot accept this protocol at all.
    #[error("download client does not support this protocol")]
    CapabilityUnsupported {
        /// Backend that rejected the submission.
        backend: &'static str,
        /// Protocol that was attempted.
        protocol: SubmissionProtocol,
    },
    /// The backend accepted the protocol but the submission failed.
    #[error("download client submission failed")]
    Failed {
        /// Backend that failed.
        backend: &'static str,
        /// Protocol that was attempted.
        protocol: SubmissionProtocol,
        /// Backend-specific cause.
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },
}

impl SubmitError {
    /// Wrap a backend-specific failure.
    #[must_use]
    pub fn failed<E>(backend: &'static str, protocol: SubmissionProtocol, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Failed {
            backend,
            protocol,
            source: Box::new(source),
        }
    }

    /// Whether the backend rejected the protocol itself.
    #[must_use]
    pub const fn is_capability_unsupported(&self) -> bool {
        matches!(self, Self::CapabilityUnsupported { .. })
    }

    /// Backend that produced the failure.
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::CapabilityUnsupported { backend, .. } | Self::Failed { backend, .. } => backend,
        }
    }

    /// Classification of the failure.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::CapabilityUnsupported { .. } => FailureKind::CapabilityUnsupported,
            Self::Failed { .. } => FailureKind::SubmissionFailed,
        }
    }
}

/// Convenience alias for backend results.
pub type SubmitResult<T> = Result<T, SubmitError>;

/// A download client able to accept magnets and/or `.torrent` payloads.
///
/// Each submission returns the info-hash the client registered, or `None` when the client does
/// not report one.
#[async_trait]
pub trait DownloadBackend: Send + Sync {
    /// Stable name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Submit a magnet locator whose info-hash was parsed locally.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::CapabilityUnsupported`] unless overridden.
    async fn submit_magnet(
        &self,
        info_hash: &InfoHash,
        magnet: &str,
        release: &ReleaseRecord,
    ) -> SubmitResult<Option<String>> {
        let _ = (info_hash, magnet, release);
        Err(SubmitError::CapabilityUnsupported {
            backend: self.name(),
            protocol: SubmissionProtocol::Magnet,
        })
    }

    /// Submit `.torrent` bytes whose info-hash was computed locally.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::CapabilityUnsupported`] unless overridden.
    async fn submit_file(
        &self,
        info_hash: &InfoHash,
        payload: &TorrentPayload,
        release: &ReleaseRecord,
    ) -> SubmitResult<Option<String>> {
        let _ = (info_hash, payload, release);
        Err(SubmitError::CapabilityUnsupported {
            backend: self.name(),
            protocol: SubmissionProtocol::TorrentFile,
        })
    }
}
