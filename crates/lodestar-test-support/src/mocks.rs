//! Scripted download backend that records every submission.

use std::io;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use lodestar_acquire::{
    DownloadBackend, InfoHash, ReleaseRecord, SubmissionProtocol, SubmitError, SubmitResult,
    TorrentPayload,
};

/// How the backend answers a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Report the info-hash the resolver computed.
    Echo,
    /// Report a fixed info-hash.
    Report(String),
    /// Report nothing.
    Silent,
    /// Reject the protocol.
    Unsupported,
    /// Fail with an IO error carrying this message.
    Fail(&'static str),
    /// Hold the submission open this long, then echo.
    Stall(Duration),
}

/// One recorded submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Protocol used.
    pub protocol: SubmissionProtocol,
    /// Info-hash passed by the resolver.
    pub info_hash: String,
    /// Magnet locator, or payload filename for torrent files.
    pub target: String,
    /// Release title.
    pub title: String,
}

/// Backend that replays configured replies and records what it was asked to do.
#[derive(Debug)]
pub struct RecordingBackend {
    magnet_reply: Reply,
    file_reply: Reply,
    submissions: Mutex<Vec<Submission>>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    /// Name reported through [`DownloadBackend::name`].
    pub const NAME: &'static str = "recording";

    /// Backend that echoes the local hash for both protocols.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            magnet_reply: Reply::Echo,
            file_reply: Reply::Echo,
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Script the magnet reply.
    #[must_use]
    pub fn with_magnet_reply(mut self, reply: Reply) -> Self {
        self.magnet_reply = reply;
        self
    }

    /// Script the torrent-file reply.
    #[must_use]
    pub fn with_file_reply(mut self, reply: Reply) -> Self {
        self.file_reply = reply;
        self
    }

    /// Every submission attempt so far, including rejected ones.
    #[must_use]
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Submission attempts made with `protocol`.
    #[must_use]
    pub fn submissions_for(&self, protocol: SubmissionProtocol) -> Vec<Submission> {
        self.submissions()
            .into_iter()
            .filter(|submission| submission.protocol == protocol)
            .collect()
    }

    async fn answer(
        &self,
        protocol: SubmissionProtocol,
        info_hash: &InfoHash,
        target: &str,
        release: &ReleaseRecord,
        reply: &Reply,
    ) -> SubmitResult<Option<String>> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Submission {
                protocol,
                info_hash: info_hash.to_string(),
                target: target.to_string(),
                title: release.title.clone(),
            });

        match reply {
            Reply::Echo => Ok(Some(info_hash.to_string())),
            Reply::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(Some(info_hash.to_string()))
            }
            Reply::Report(hash) => Ok(Some(hash.clone())),
            Reply::Silent => Ok(None),
            Reply::Unsupported => Err(SubmitError::CapabilityUnsupported {
                backend: Self::NAME,
                protocol,
            }),
            Reply::Fail(message) => Err(SubmitError::failed(
                Self::NAME,
                protocol,
                io::Error::other(*message),
            )),
        }
    }
}

#[async_trait]
impl DownloadBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn submit_magnet(
        &self,
        info_hash: &InfoHash,
        magnet: &str,
        release: &ReleaseRecord,
    ) -> SubmitResult<Option<String>> {
        self.answer(
            SubmissionProtocol::Magnet,
            info_hash,
            magnet,
            release,
            &self.magnet_reply,
        )
        .await
    }

    async fn submit_file(
        &self,
        info_hash: &InfoHash,
        payload: &TorrentPayload,
        release: &ReleaseRecord,
    ) -> SubmitResult<Option<String>> {
        self.answer(
            SubmissionProtocol::TorrentFile,
            info_hash,
            &payload.filename,
            release,
            &self.file_reply,
        )
        .await
    }
}
