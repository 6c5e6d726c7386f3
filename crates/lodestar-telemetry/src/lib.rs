#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Logging primitives shared across the Lodestar workspace.
//!
//! Layout: `init.rs` (subscriber installation and format selection), `context.rs` (top-level
//! command spans).

pub mod context;
pub mod init;

pub use context::command_span;
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_version, init_logging};
