//! Spawned fetches that can be cancelled.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::client::FetchClient;
use super::request::Request;
use crate::decode::Decoder;
use crate::error::{NetworkError, Result, TransportError};
use cryptocoins_core::logging::targets;

/// Unique identifier for a spawned fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    fn next() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A handle that cancels a spawned fetch.
#[derive(Clone, Debug)]
pub struct RequestHandle {
    /// The unique ID of the fetch.
    pub id: RequestId,
    cancel_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl RequestHandle {
    /// Cancel the fetch.
    ///
    /// Returns `true` if the cancellation signal was delivered, `false` if
    /// the fetch already finished or was already cancelled.
    pub fn cancel(&self) -> bool {
        if let Some(tx) = self.cancel_tx.lock().take() {
            tx.send(()).is_ok()
        } else {
            false
        }
    }

    /// Check if the fetch is still running.
    pub fn is_pending(&self) -> bool {
        self.cancel_tx.lock().is_some()
    }
}

/// A fetch running on the tokio runtime.
#[derive(Debug)]
pub struct PendingFetch<T> {
    handle: RequestHandle,
    task: JoinHandle<Result<T>>,
}

impl<T> PendingFetch<T> {
    /// The cancellation handle.
    pub fn handle(&self) -> &RequestHandle {
        &self.handle
    }

    /// Cancel the fetch. See [`RequestHandle::cancel`].
    pub fn cancel(&self) -> bool {
        self.handle.cancel()
    }

    /// Wait for the outcome.
    ///
    /// A cancelled fetch resolves to [`TransportError::Cancelled`].
    ///
    /// # Panics
    ///
    /// Resumes the panic if the fetch task panicked.
    pub async fn wait(self) -> Result<T> {
        match self.task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => {
                tracing::error!(target: targets::FETCH, id = ?self.handle.id, "Fetch task panicked");
                std::panic::resume_unwind(err.into_panic())
            }
            Err(err) => {
                tracing::debug!(target: targets::FETCH, id = ?self.handle.id, "Fetch task aborted: {}", err);
                Err(NetworkError::Transport(TransportError::Cancelled))
            }
        }
    }
}

impl<D: Decoder + 'static> FetchClient<D> {
    /// Start a fetch on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<T>(&self, request: Request) -> PendingFetch<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let handle = RequestHandle {
            id: RequestId::next(),
            cancel_tx: Arc::new(Mutex::new(Some(cancel_tx))),
        };

        let client = self.clone();
        let task_handle = handle.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                result = client.fetch::<T>(&request) => {
                    task_handle.cancel_tx.lock().take();
                    result
                }
                _ = cancel_rx => {
                    tracing::debug!(
                        target: targets::FETCH,
                        id = ?task_handle.id,
                        endpoint = request.endpoint(),
                        "Fetch cancelled"
                    );
                    Err(TransportError::Cancelled.into())
                }
            }
        });

        PendingFetch { handle, task }
    }
}
