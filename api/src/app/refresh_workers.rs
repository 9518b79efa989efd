//! Background refresh workers
//!
//! A bounded queue of handles drained by a fixed pool of workers. Outcomes are
//! only logged. When every `RefreshQueue` sender is dropped the workers finish
//! the queued handles and exit; `shutdown` bounds how long that may take.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::app::refresh_coordinator::{BackgroundOutcome, RefreshCoordinator};
use crate::domain::entities::Handle;
use crate::domain::ports::{CacheStore, UpstreamClient};
use crate::error::RefreshError;

/// Sending half of the refresh queue
#[derive(Clone, Debug)]
pub struct RefreshQueue {
    tx: mpsc::Sender<Handle>,
}

impl RefreshQueue {
    /// Enqueue a background refresh without waiting
    ///
    /// Returns false when the queue is full or closed; the handle is dropped.
    pub fn schedule(&self, handle: Handle) -> bool {
        match self.tx.try_send(handle) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(handle)) => {
                tracing::warn!(handle = %handle, "Refresh queue full, skipping background refresh");
                false
            }
            Err(mpsc::error::TrySendError::Closed(handle)) => {
                tracing::debug!(handle = %handle, "Refresh queue closed");
                false
            }
        }
    }
}

pub struct RefreshWorkers {
    tasks: JoinSet<()>,
}

impl RefreshWorkers {
    /// Start `workers` workers (at least one) over a queue of `capacity` handles
    pub fn spawn<U, C>(
        coordinator: Arc<RefreshCoordinator<U, C>>,
        workers: usize,
        capacity: usize,
    ) -> (RefreshQueue, Self)
    where
        U: UpstreamClient + ?Sized + 'static,
        C: CacheStore + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let mut tasks = JoinSet::new();
        for id in 0..workers.max(1) {
            tasks.spawn(worker_loop(id, coordinator.clone(), rx.clone()));
        }

        tracing::info!(workers = workers.max(1), capacity, "Started refresh workers");
        (RefreshQueue { tx }, Self { tasks })
    }

    /// Wait for the workers to drain the queue, aborting them after `deadline`
    ///
    /// All `RefreshQueue` senders must be dropped first or the workers never
    /// see the queue close and are aborted at the deadline.
    pub async fn shutdown(mut self, deadline: Duration) {
        let drained = tokio::time::timeout(deadline, async {
            while self.tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            tracing::warn!(?deadline, "Refresh workers did not drain in time, aborting");
            self.tasks.abort_all();
            while self.tasks.join_next().await.is_some() {}
        } else {
            tracing::info!("Refresh workers drained");
        }
    }
}

async fn worker_loop<U, C>(
    id: usize,
    coordinator: Arc<RefreshCoordinator<U, C>>,
    rx: Arc<Mutex<mpsc::Receiver<Handle>>>,
) where
    U: UpstreamClient + ?Sized,
    C: CacheStore + ?Sized,
{
    loop {
        // The receiver lock is released before the refresh runs.
        let next = rx.lock().await.recv().await;
        let Some(handle) = next else {
            break;
        };

        match coordinator.refresh_in_background(&handle).await {
            Ok(BackgroundOutcome::Refreshed) => {
                tracing::debug!(worker = id, handle = %handle, "Background refresh done")
            }
            Ok(outcome) => {
                tracing::debug!(worker = id, handle = %handle, ?outcome, "Background refresh skipped")
            }
            Err(RefreshError::NotFound(_)) => {
                tracing::debug!(worker = id, handle = %handle, "Background refresh: user not found")
            }
            Err(e) => {
                tracing::error!(worker = id, handle = %handle, error = %e, "Background refresh failed")
            }
        }
    }

    tracing::debug!(worker = id, "Refresh worker stopped");
}
