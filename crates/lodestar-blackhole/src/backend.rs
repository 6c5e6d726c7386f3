//! [`DownloadBackend`] implementation writing into a watch folder.
//!
//! # Design
//! - Files are written to a temporary sibling and renamed into place, so a watching client never
//!   observes a partial payload.
//! - The backend cannot learn what the watching client registers, so it reports the info-hash the
//!   resolver computed.
//! - A submission dropped mid-write (cancellation) leaves nothing behind: the blocking writer skips
//!   the rename, or the rename is undone when it already happened.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use lodestar_acquire::sanitize::clean_file_name;
use lodestar_acquire::{
    DownloadBackend, InfoHash, ReleaseRecord, SubmissionProtocol, SubmitError, SubmitResult,
    TorrentPayload,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{BlackholeError, BlackholeResult};

/// Extension used for magnet files when none is configured.
pub const DEFAULT_MAGNET_EXTENSION: &str = "magnet";

/// Watch-folder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackholeOptions {
    /// Directory watched by the external client.
    pub torrent_folder: PathBuf,
    /// Extension for magnet files, without the leading dot.
    pub magnet_extension: String,
    /// Whether magnets are written as files; otherwise magnets are reported as unsupported.
    pub save_magnet_files: bool,
}

impl BlackholeOptions {
    /// Options for `torrent_folder` with magnet files disabled.
    #[must_use]
    pub fn new(torrent_folder: impl Into<PathBuf>) -> Self {
        Self {
            torrent_folder: torrent_folder.into(),
            magnet_extension: DEFAULT_MAGNET_EXTENSION.to_string(),
            save_magnet_files: false,
        }
    }
}

/// Backend that hands artifacts to an external client through a watch folder.
#[derive(Debug, Clone)]
pub struct BlackholeBackend {
    options: BlackholeOptions,
}

impl BlackholeBackend {
    /// Backend name reported in logs and errors.
    pub const NAME: &'static str = "blackhole";

    /// Build a backend over `options`.
    #[must_use]
    pub const fn new(options: BlackholeOptions) -> Self {
        Self { options }
    }

    fn magnet_file_name(&self, title: &str) -> String {
        let extension = self.options.magnet_extension.trim().trim_start_matches('.');
        let extension = if extension.is_empty() {
            DEFAULT_MAGNET_EXTENSION
        } else {
            extension
        };
        format!("{}.{extension}", clean_file_name(title))
    }

    async fn drop_file(&self, file_name: &str, bytes: Vec<u8>) -> BlackholeResult<PathBuf> {
        let folder = self.options.torrent_folder.clone();
        let target = folder.join(file_name);
        let mut guard = WriteGuard::new(target.clone());
        let state = guard.state();
        let destination = target.clone();
        let written = tokio::task::spawn_blocking(move || {
            write_atomically(&folder, &destination, &bytes, &state)
        })
        .await;
        guard.disarm();
        written.map_err(|source| BlackholeError::Join { source })??;
        Ok(target)
    }
}

/// Progress of one watch-folder write, shared with the blocking writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteState {
    Pending,
    Abandoned,
    Persisted,
}

type SharedWriteState = Arc<Mutex<WriteState>>;

fn lock_state(state: &Mutex<WriteState>) -> std::sync::MutexGuard<'_, WriteState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Undoes a write whose submission future was dropped before observing the result.
#[derive(Debug)]
struct WriteGuard {
    state: SharedWriteState,
    target: PathBuf,
    armed: bool,
}

impl WriteGuard {
    fn new(target: PathBuf) -> Self {
        Self {
            state: Arc::new(Mutex::new(WriteState::Pending)),
            target,
            armed: true,
        }
    }

    fn state(&self) -> SharedWriteState {
        Arc::clone(&self.state)
    }

    const fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = lock_state(&self.state);
        match *state {
            WriteState::Pending => *state = WriteState::Abandoned,
            WriteState::Persisted => match std::fs::remove_file(&self.target) {
                Ok(()) => {
                    debug!(path = %self.target.display(), "removed file from abandoned submission");
                }
                Err(err) => warn!(
                    path = %self.target.display(),
                    error = %err,
                    "failed to remove file from abandoned submission"
                ),
            },
            WriteState::Abandoned => {}
        }
    }
}

fn write_atomically(
    folder: &Path,
    target: &Path,
    bytes: &[u8],
    state: &Mutex<WriteState>,
) -> BlackholeResult<()> {
    let mut temp = tempfile::Builder::new()
        .prefix(".lodestar-")
        .suffix(".partial")
        .tempfile_in(folder)
        .map_err(|source| BlackholeError::io("create temp file", folder, source))?;
    let temp_path = temp.path().to_path_buf();
    temp.write_all(bytes)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|source| BlackholeError::io("write temp file", &temp_path, source))?;

    // The rename happens under the lock so an abandoning guard sees either Pending or Persisted.
    let mut progress = lock_state(state);
    if *progress == WriteState::Abandoned {
        debug!(path = %target.display(), "submission abandoned before rename");
        return Ok(());
    }
    temp.persist(target)
        .map_err(|err| BlackholeError::io("persist", target, err.error))?;
    *progress = WriteState::Persisted;
    Ok(())
}

#[async_trait]
impl DownloadBackend for BlackholeBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Writes the magnet locator as a file when enabled. Dropping the returned future before it
    /// completes leaves no file in the watch folder.
    async fn submit_magnet(
        &self,
        info_hash: &InfoHash,
        magnet: &str,
        release: &ReleaseRecord,
    ) -> SubmitResult<Option<String>> {
        if !self.options.save_magnet_files {
            debug!(title = %release.title, "magnet files disabled for watch folder");
            return Err(SubmitError::CapabilityUnsupported {
                backend: Self::NAME,
                protocol: SubmissionProtocol::Magnet,
            });
        }

        let file_name = self.magnet_file_name(&release.title);
        let path = self
            .drop_file(&file_name, magnet.trim().as_bytes().to_vec())
            .await
            .map_err(|err| SubmitError::failed(Self::NAME, SubmissionProtocol::Magnet, err))?;
        info!(path = %path.display(), info_hash = %info_hash, "magnet file written to watch folder");
        Ok(Some(info_hash.to_string()))
    }

    /// Drops the payload into the watch folder. Dropping the returned future before it completes
    /// leaves no file in the watch folder.
    async fn submit_file(
        &self,
        info_hash: &InfoHash,
        payload: &TorrentPayload,
        release: &ReleaseRecord,
    ) -> SubmitResult<Option<String>> {
        let path = self
            .drop_file(&payload.filename, payload.bytes.clone())
            .await
            .map_err(|err| SubmitError::failed(Self::NAME, SubmissionProtocol::TorrentFile, err))?;
        info!(
            title = %release.title,
            path = %path.display(),
            info_hash = %info_hash,
            "torrent file written to watch folder"
        );
        Ok(Some(info_hash.to_string()))
    }
}
