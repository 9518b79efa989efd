//! Upstream rate limiter
//!
//! Bounds the number of in-flight upstream calls and paces them: a released
//! slot stays occupied for `inter_request_delay` before the next waiter gets it.
//! Waiters are admitted in FIFO order (tokio's semaphore is fair).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::UpstreamError;

#[derive(Clone, Debug)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    inter_request_delay: Duration,
    call_timeout: Duration,
}

/// Admission token. Dropping it releases the slot after the pacing delay.
#[derive(Debug)]
pub struct RatePermit {
    permit: Option<OwnedSemaphorePermit>,
    delay: Duration,
}

impl Drop for RatePermit {
    fn drop(&mut self) {
        let Some(permit) = self.permit.take() else {
            return;
        };
        if self.delay.is_zero() {
            return;
        }

        // Hold the slot for the pacing delay, measured from release.
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let delay = self.delay;
                runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    drop(permit);
                });
            }
            Err(_) => drop(permit),
        }
    }
}

impl RateLimiter {
    /// `max_concurrent` is clamped to at least one
    pub fn new(max_concurrent: usize, inter_request_delay: Duration, call_timeout: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            inter_request_delay,
            call_timeout,
        }
    }

    /// Wait until a slot is free
    pub async fn admit(&self) -> RatePermit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("rate limiter semaphore is never closed");

        RatePermit {
            permit: Some(permit),
            delay: self.inter_request_delay,
        }
    }

    /// Run one upstream call under a permit and the call timeout
    ///
    /// The permit is released on every exit path, including timeout and
    /// cancellation of the returned future.
    pub async fn run<T, F>(&self, call: F) -> Result<T, UpstreamError>
    where
        F: Future<Output = Result<T, UpstreamError>>,
    {
        let _permit = self.admit().await;

        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout(self.call_timeout)),
        }
    }

    /// Slots free right now
    #[cfg(test)]
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}
