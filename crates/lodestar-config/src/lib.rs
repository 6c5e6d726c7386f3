#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! File and environment configuration for the resolver, the watch-folder backend and logging.
//!
//! Layout: `model.rs` (typed config sections), `defaults.rs` (default values), `validate.rs`
//! (range and shape checks), `loader.rs` (JSON file + `LODESTAR_*` environment overlay).

mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{apply_env_overrides, from_json_str, load};
pub use model::{
    BlackholeConfig, FetchConfig, LodestarConfig, LogFormatSetting, LoggingSettings,
    ResolverConfig,
};
