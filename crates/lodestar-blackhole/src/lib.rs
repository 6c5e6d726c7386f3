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
#![allow(clippy::module_name_repetitions)]

//! Watch-folder download backend: drops `.torrent` files (and optionally magnet files) into a
//! directory that an external client monitors.

pub mod backend;
pub mod error;

pub use backend::{BlackholeBackend, BlackholeOptions};
pub use error::{BlackholeError, BlackholeResult};
