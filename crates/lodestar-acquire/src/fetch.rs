//! `.torrent` retrieval with a manual redirect walk.
//!
//! # Design
//! - The transport never follows redirects; every hop is inspected so a redirect to a magnet
//!   locator can be handed back to the resolver instead of being requested over HTTP.
//! - The remaining hop budget is an explicit argument, so termination does not depend on the
//!   call stack or on the server's behaviour.
//! - Bodies are read chunk by chunk against a size cap; an oversized `Content-Length` is rejected
//!   before any body byte is read.

use std::time::Duration;

use reqwest::header::{ACCEPT, LOCATION, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode, redirect};
use thiserror::Error;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::{AcquireError, AcquireResult};
use crate::magnet::is_magnet;
use crate::model::TorrentPayload;

/// Content type requested from indexers.
pub const TORRENT_CONTENT_TYPE: &str = "application/x-bittorrent";
/// Default number of redirects followed before giving up.
pub const DEFAULT_MAX_REDIRECTS: u8 = 5;
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default cap on a `.torrent` body.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Transport settings for [`TorrentFetcher`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Duration,
    /// Redirect hops followed before the chain is rejected.
    pub max_redirects: u8,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Largest body accepted as a `.torrent` payload.
    pub max_payload_bytes: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: concat!("lodestar/", env!("CARGO_PKG_VERSION")).to_string(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

/// Underlying cause of a failed fetch.
#[derive(Debug, Error)]
pub enum FetchFailure {
    /// The locator or a redirect target was not a valid URL.
    #[error("invalid torrent URL")]
    InvalidUrl {
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// Connection, TLS, timeout or body read failure.
    #[error("HTTP transport failure")]
    Transport {
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success, non-redirect status.
    #[error("unexpected HTTP status")]
    Status {
        /// Numeric status code.
        status: u16,
        /// Parsed `Retry-After` header (seconds form) when present.
        retry_after: Option<Duration>,
    },
    /// The body exceeded the configured payload cap.
    #[error("torrent payload exceeds size limit")]
    PayloadTooLarge {
        /// Cap in bytes.
        limit: usize,
    },
}

/// Result of a successful fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The server delivered the `.torrent` payload.
    Payload {
        /// Downloaded payload.
        payload: TorrentPayload,
        /// URL that answered with the payload, after any redirects.
        url: Url,
    },
    /// A redirect pointed at a magnet locator.
    RedirectToMagnet {
        /// Magnet locator taken from the `Location` header.
        magnet: String,
        /// URL whose response carried the redirect.
        via: Url,
    },
}

/// HTTP client wrapper that fetches `.torrent` payloads.
#[derive(Debug, Clone)]
pub struct TorrentFetcher {
    client: Client,
    max_redirects: u8,
    max_payload_bytes: usize,
}

impl TorrentFetcher {
    /// Build a fetcher with redirect following disabled at the transport.
    ///
    /// # Errors
    ///
    /// Returns [`FetchFailure::Transport`] when the HTTP client cannot be constructed.
    pub fn new(options: &FetchOptions) -> Result<Self, FetchFailure> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .build()
            .map_err(|source| FetchFailure::Transport { source })?;
        Ok(Self {
            client,
            max_redirects: options.max_redirects,
            max_payload_bytes: options.max_payload_bytes,
        })
    }

    /// Fetch `url`, naming the payload after `title`.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_with_budget`].
    pub async fn fetch(&self, url: &str, title: &str) -> AcquireResult<FetchOutcome> {
        self.fetch_with_budget(url, title, self.max_redirects).await
    }

    /// Fetch `url`, following at most `remaining_hops` redirects.
    ///
    /// # Errors
    ///
    /// - [`AcquireError::Protocol`] for a redirect without `Location` or an exhausted hop budget.
    /// - [`AcquireError::FetchFailed`] for invalid URLs, transport failures, non-2xx statuses and
    ///   bodies larger than the payload cap.
    pub async fn fetch_with_budget(
        &self,
        url: &str,
        title: &str,
        remaining_hops: u8,
    ) -> AcquireResult<FetchOutcome> {
        let mut current = Url::parse(url.trim()).map_err(|source| AcquireError::FetchFailed {
            url: url.to_string(),
            source: FetchFailure::InvalidUrl { source },
        })?;
        let mut remaining = remaining_hops;

        loop {
            let response = self
                .client
                .get(current.clone())
                .header(ACCEPT, TORRENT_CONTENT_TYPE)
                .send()
                .await
                .map_err(|source| {
                    error!(url = %current, error = %source, "torrent request failed");
                    fetch_failed(&current, FetchFailure::Transport { source })
                })?;
            let status = response.status();

            if is_followed_redirect(status) {
                let Some(location) = location_of(&response) else {
                    return Err(AcquireError::Protocol {
                        url: current.to_string(),
                        reason: "redirect without location",
                    });
                };
                debug!(from = %current, to = %location, "torrent request is being redirected");
                if is_magnet(&location) {
                    return Ok(FetchOutcome::RedirectToMagnet {
                        magnet: location,
                        via: current,
                    });
                }
                let Some(next_budget) = remaining.checked_sub(1) else {
                    return Err(AcquireError::Protocol {
                        url: current.to_string(),
                        reason: "redirect limit exceeded",
                    });
                };
                remaining = next_budget;
                current = current.join(&location).map_err(|source| {
                    fetch_failed(&current, FetchFailure::InvalidUrl { source })
                })?;
                continue;
            }

            if !status.is_success() {
                return Err(status_failure(&current, title, &response));
            }

            let bytes = read_body(response, self.max_payload_bytes)
                .await
                .map_err(|source| {
                    error!(url = %current, error = %source, "reading torrent body failed");
                    fetch_failed(&current, source)
                })?;
            debug!(
                title,
                url = %current,
                bytes = bytes.len(),
                "torrent download finished"
            );
            return Ok(FetchOutcome::Payload {
                payload: TorrentPayload::new(title, bytes),
                url: current,
            });
        }
    }
}

async fn read_body(mut response: Response, limit: usize) -> Result<Vec<u8>, FetchFailure> {
    if let Some(length) = response.content_length()
        && !usize::try_from(length).is_ok_and(|length| length <= limit)
    {
        return Err(FetchFailure::PayloadTooLarge { limit });
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| FetchFailure::Transport { source })?
    {
        if body.len() + chunk.len() > limit {
            return Err(FetchFailure::PayloadTooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

fn location_of(response: &Response) -> Option<String> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn status_failure(url: &Url, title: &str, response: &Response) -> AcquireError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    match status {
        StatusCode::NOT_FOUND => {
            warn!(title, url = %url, "torrent file no longer exists on the indexer");
        }
        StatusCode::TOO_MANY_REQUESTS => {
            warn!(url = %url, retry_after_secs = retry_after.map(|d| d.as_secs()), "indexer grab limit reached");
        }
        _ => error!(title, url = %url, status = status.as_u16(), "downloading torrent file failed"),
    }

    fetch_failed(
        url,
        FetchFailure::Status {
            status: status.as_u16(),
            retry_after,
        },
    )
}

fn fetch_failed(url: &Url, source: FetchFailure) -> AcquireError {
    AcquireError::FetchFailed {
        url: url.to_string(),
        source,
    }
}
