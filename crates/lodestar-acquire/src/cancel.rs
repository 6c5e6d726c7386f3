//! Cooperative cancellation for in-flight resolutions.
//!
//! # Design
//! - Backed by a `watch` channel so any number of signals observe a single handle.
//! - Dropping the handle without cancelling leaves every signal pending forever.

use std::future::Future;

use tokio::sync::watch;

use crate::error::{AcquireError, AcquireResult};

/// Owner side used to abort resolutions that observe the paired [`CancelSignal`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Request cancellation; idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observer side passed into resolutions.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires.
    #[must_use]
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// Whether cancellation has already been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation is requested.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Create a linked handle/signal pair.
#[must_use]
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

/// Drive `future` to completion unless `signal` fires first, in which case the future is dropped.
///
/// # Errors
///
/// Returns [`AcquireError::Cancelled`] when the signal wins, otherwise the future's own result.
pub async fn run_until_cancelled<T, F>(signal: &CancelSignal, future: F) -> AcquireResult<T>
where
    F: Future<Output = AcquireResult<T>>,
{
    if signal.is_cancelled() {
        return Err(AcquireError::Cancelled);
    }
    tokio::select! {
        biased;
        () = signal.cancelled() => Err(AcquireError::Cancelled),
        result = future => result,
    }
}
