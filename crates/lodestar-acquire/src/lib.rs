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

//! Torrent acquisition: turns a release record into an info-hash registered with a download backend.
//!
//! Layout:
//! - `model.rs`: release records, payloads and resolution outcomes
//! - `info_hash.rs` / `magnet.rs` / `metainfo.rs`: local content-identifier computation
//! - `fetch.rs`: `.torrent` retrieval with a manual, bounded redirect walk
//! - `backend.rs`: the capability trait implemented by download clients
//! - `resolver.rs`: locator selection, fallback and consistency checking
//! - `cancel.rs`: cooperative cancellation for the network suspension points

pub mod backend;
pub mod cancel;
pub mod error;
pub mod fetch;
pub mod info_hash;
pub mod magnet;
pub mod metainfo;
pub mod model;
pub mod resolver;
pub mod sanitize;

pub use backend::{DownloadBackend, SubmissionProtocol, SubmitError, SubmitResult};
pub use cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use error::{AcquireError, AcquireResult, FailureKind};
pub use fetch::{FetchFailure, FetchOptions, FetchOutcome, TorrentFetcher};
pub use info_hash::{InfoHash, InfoHashError};
pub use magnet::MagnetLink;
pub use metainfo::{MetainfoError, info_hash_from_torrent};
pub use model::{ConsistencyWarning, Locators, ReleaseRecord, Resolved, TorrentPayload};
pub use resolver::{AcquisitionResolver, ResolverOptions};
