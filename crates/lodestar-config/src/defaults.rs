//! Default values for configuration sections.
//!
//! # Design
//! - Centralize defaults so serde, the CLI and tests agree on them.
#![allow(clippy::redundant_pub_crate)]

/// Default per-request HTTP timeout in seconds.
pub(crate) const HTTP_TIMEOUT_SECS: u64 = 30;
/// Default redirect budget.
pub(crate) const MAX_REDIRECTS: u8 = lodestar_acquire::fetch::DEFAULT_MAX_REDIRECTS;
/// Inclusive bounds for the redirect budget.
pub(crate) const MAX_REDIRECTS_RANGE: (u8, u8) = (1, 20);
/// Inclusive bounds for the HTTP timeout in seconds.
pub(crate) const HTTP_TIMEOUT_RANGE: (u64, u64) = (1, 600);
/// Default magnet file extension.
pub(crate) const MAGNET_EXTENSION: &str = "magnet";
/// Default log filter directive.
pub(crate) const LOG_LEVEL: &str = "info";

/// Default `User-Agent` header.
pub(crate) fn user_agent() -> String {
    concat!("lodestar/", env!("CARGO_PKG_VERSION")).to_string()
}
