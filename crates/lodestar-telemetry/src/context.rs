//! Top-level span helpers.

use tracing::Span;

use crate::init::build_version;

/// Span wrapping one CLI command, carrying the build version.
#[must_use]
pub fn command_span(command: &'static str) -> Span {
    tracing::info_span!("lodestar", command, version = build_version())
}
