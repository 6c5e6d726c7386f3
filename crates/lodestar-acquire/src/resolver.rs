//! Locator selection, fallback and hash consistency checking.
//!
//! # Design
//! - Stateless between resolutions; one resolver may be shared behind `Arc` across tasks.
//! - Magnet first by default. Malformed magnets and backends without magnet support fall back to
//!   the HTTP locator when one exists; every other failure is terminal.
//! - A redirect to a magnet runs the magnet path exactly once and never returns to HTTP.
//! - The backend's reported info-hash is authoritative; disagreement is a warning, not an error.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::backend::{DownloadBackend, SubmissionProtocol, SubmitError};
use crate::cancel::{CancelSignal, run_until_cancelled};
use crate::error::{AcquireError, AcquireResult};
use crate::fetch::{FetchOutcome, TorrentFetcher};
use crate::info_hash::InfoHash;
use crate::magnet::MagnetLink;
use crate::metainfo::info_hash_from_torrent;
use crate::model::{ConsistencyWarning, ReleaseRecord, Resolved, TorrentPayload};

/// Policy knobs for [`AcquisitionResolver`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Try the HTTP locator before the magnet, falling back to the magnet on `DownloadFailed`.
    pub prefer_torrent_file: bool,
}

/// Turns release records into info-hashes registered with a download backend.
#[derive(Clone)]
pub struct AcquisitionResolver {
    backend: Arc<dyn DownloadBackend>,
    fetcher: TorrentFetcher,
    options: ResolverOptions,
}

impl std::fmt::Debug for AcquisitionResolver {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AcquisitionResolver")
            .field("backend", &self.backend.name())
            .field("fetcher", &self.fetcher)
            .field("options", &self.options)
            .finish()
    }
}

/// Outcome of a failed magnet attempt, before deciding whether to fall back.
enum MagnetFailure {
    Malformed(AcquireError),
    Unsupported(SubmitError),
    Fatal(AcquireError),
}

impl MagnetFailure {
    const fn allows_fallback(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::Unsupported(_))
    }

    fn into_terminal(self) -> AcquireError {
        match self {
            Self::Malformed(err) | Self::Fatal(err) => err,
            Self::Unsupported(source) => AcquireError::UnsupportedProtocol {
                backend: source.backend(),
                source,
            },
        }
    }
}

impl AcquisitionResolver {
    /// Build a resolver with default options.
    #[must_use]
    pub fn new(backend: Arc<dyn DownloadBackend>, fetcher: TorrentFetcher) -> Self {
        Self {
            backend,
            fetcher,
            options: ResolverOptions::default(),
        }
    }

    /// Replace the resolver options.
    #[must_use]
    pub const fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Options in effect.
    #[must_use]
    pub const fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Resolve a release without external cancellation.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve_with_cancel`].
    pub async fn resolve(&self, release: &ReleaseRecord) -> AcquireResult<Resolved> {
        self.resolve_with_cancel(release, &CancelSignal::never())
            .await
    }

    /// Resolve a release, aborting in-flight network calls when `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns a classified [`AcquireError`]; see [`crate::error::FailureKind`].
    #[instrument(
        name = "resolver.resolve",
        skip(self, release, cancel),
        fields(title = %release.title, backend = self.backend.name())
    )]
    pub async fn resolve_with_cancel(
        &self,
        release: &ReleaseRecord,
        cancel: &CancelSignal,
    ) -> AcquireResult<Resolved> {
        if cancel.is_cancelled() {
            return Err(AcquireError::Cancelled);
        }
        let locators = release.locators();
        if locators.is_empty() {
            warn!(indexer = release.indexer.as_deref(), "release has no usable locator");
            return Err(AcquireError::NoUsableLocator {
                title: release.title.clone(),
            });
        }

        if self.options.prefer_torrent_file
            && let Some(http) = locators.http
        {
            match self.try_http(release, http, cancel).await {
                Err(err @ AcquireError::DownloadFailed { .. }) => {
                    let Some(magnet) = locators.magnet else {
                        return Err(err);
                    };
                    debug!(error = %err, "torrent file unavailable, trying magnet");
                    return self
                        .try_magnet(release, magnet, cancel)
                        .await
                        .map_err(MagnetFailure::into_terminal);
                }
                other => return other,
            }
        }

        if let Some(magnet) = locators.magnet {
            match self.try_magnet(release, magnet, cancel).await {
                Ok(resolved) => return Ok(resolved),
                Err(failure) if failure.allows_fallback() && locators.http.is_some() => {
                    debug!("magnet unusable, falling back to torrent file");
                }
                Err(failure) => return Err(failure.into_terminal()),
            }
        }

        match locators.http {
            Some(http) => self.try_http(release, http, cancel).await,
            None => Err(AcquireError::NoUsableLocator {
                title: release.title.clone(),
            }),
        }
    }

    async fn try_magnet(
        &self,
        release: &ReleaseRecord,
        magnet: &str,
        cancel: &CancelSignal,
    ) -> Result<Resolved, MagnetFailure> {
        let link = MagnetLink::parse(magnet).map_err(|err| {
            debug!(locator = magnet, error = %err, "magnet locator rejected");
            MagnetFailure::Malformed(err)
        })?;

        let submission = run_until_cancelled(cancel, async {
            Ok(self
                .backend
                .submit_magnet(&link.info_hash, magnet, release)
                .await)
        })
        .await
        .map_err(MagnetFailure::Fatal)?;

        match submission {
            Ok(reported) => Ok(self.reconcile(
                release,
                magnet,
                link.info_hash,
                reported,
                SubmissionProtocol::Magnet,
            )),
            Err(err) if err.is_capability_unsupported() => {
                debug!(backend = err.backend(), "download client rejected magnet");
                Err(MagnetFailure::Unsupported(err))
            }
            Err(source) => {
                warn!(error = %source, "magnet submission failed");
                Err(MagnetFailure::Fatal(AcquireError::SubmissionFailed {
                    source,
                }))
            }
        }
    }

    async fn try_http(
        &self,
        release: &ReleaseRecord,
        url: &str,
        cancel: &CancelSignal,
    ) -> AcquireResult<Resolved> {
        let outcome = run_until_cancelled(cancel, self.fetcher.fetch(url, &release.title))
            .await
            .map_err(|err| match err {
                AcquireError::Cancelled | AcquireError::Protocol { .. } => err,
                other => AcquireError::download_failed(&release.title, other),
            })?;

        match outcome {
            FetchOutcome::RedirectToMagnet { magnet, via } => {
                info!(url = %via, "torrent locator redirected to magnet");
                self.try_magnet(release, &magnet, cancel)
                    .await
                    .map_err(MagnetFailure::into_terminal)
            }
            FetchOutcome::Payload {
                payload,
                url: final_url,
            } => {
                self.submit_payload(release, final_url.as_str(), &payload, cancel)
                    .await
            }
        }
    }

    async fn submit_payload(
        &self,
        release: &ReleaseRecord,
        url: &str,
        payload: &TorrentPayload,
        cancel: &CancelSignal,
    ) -> AcquireResult<Resolved> {
        let local = info_hash_from_torrent(&payload.bytes).map_err(|source| {
            warn!(url, error = %source, "fetched payload is not a torrent");
            AcquireError::download_failed(&release.title, AcquireError::InvalidTorrent { source })
        })?;

        let submission = run_until_cancelled(cancel, async {
            Ok(self.backend.submit_file(&local, payload, release).await)
        })
        .await?;

        match submission {
            Ok(reported) => Ok(self.reconcile(
                release,
                url,
                local,
                reported,
                SubmissionProtocol::TorrentFile,
            )),
            Err(source) => {
                warn!(url, error = %source, "torrent file submission failed");
                let cause = if source.is_capability_unsupported() {
                    AcquireError::UnsupportedProtocol {
                        backend: source.backend(),
                        source,
                    }
                } else {
                    AcquireError::SubmissionFailed { source }
                };
                Err(AcquireError::download_failed(&release.title, cause))
            }
        }
    }

    fn reconcile(
        &self,
        release: &ReleaseRecord,
        locator: &str,
        local: InfoHash,
        reported: Option<String>,
        protocol: SubmissionProtocol,
    ) -> Resolved {
        let reported = reported
            .map(|hash| hash.trim().to_string())
            .filter(|hash| !hash.is_empty());

        let (info_hash, warning) = match reported {
            Some(reported) if local.matches(&reported) => (reported, None),
            Some(reported) => {
                warn!(
                    title = %release.title,
                    locator,
                    expected = %local,
                    reported = %reported,
                    "download client reported a different info-hash"
                );
                let warning = ConsistencyWarning {
                    title: release.title.clone(),
                    locator: locator.to_string(),
                    expected: local.clone(),
                    reported: reported.clone(),
                };
                (reported, Some(warning))
            }
            None => (local.as_str().to_string(), None),
        };

        info!(
            info_hash = %info_hash,
            protocol = %protocol,
            backend = self.backend.name(),
            "release handed to download client"
        );
        Resolved {
            info_hash,
            local_hash: local,
            protocol,
            locator: locator.to_string(),
            warning,
        }
    }
}
