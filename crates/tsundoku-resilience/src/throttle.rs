// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared concurrency gate with fixed pacing.
//!
//! At most `max_concurrent` operations run at once across the whole process.
//! Waiters queue in FIFO order (tokio's semaphore is fair), and every
//! operation sleeps for the stagger interval after it obtains a slot and
//! before it starts. The slot is an RAII permit, so it is returned when the
//! operation finishes, fails, panics, or is cancelled.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::trace;
use tsundoku_core::{SystemError, TsundokuError};

/// Default number of outbound calls allowed in flight.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Default delay applied before every outbound call.
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(500);

/// Process-wide gate for outbound calls.
///
/// Clones share the same slots.
#[derive(Debug, Clone)]
pub struct RequestThrottler {
    slots: Arc<Semaphore>,
    max_concurrent: usize,
    stagger: Duration,
}

impl Default for RequestThrottler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT, DEFAULT_STAGGER)
    }
}

impl RequestThrottler {
    /// Create a throttler. A `max_concurrent` of zero is raised to one.
    pub fn new(max_concurrent: usize, stagger: Duration) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            slots: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            stagger,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn stagger(&self) -> Duration {
        self.stagger
    }

    /// Slots not currently held by a running or staggering operation.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Run `operation` once a slot is free and the stagger delay has elapsed.
    ///
    /// Cancellation while queued, while staggering, or while the operation
    /// runs yields [`DataAccessError::Cancelled`](tsundoku_core::DataAccessError::Cancelled)
    /// and drops the operation future.
    pub async fn execute<F, Fut, T>(
        &self,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<T, TsundokuError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, TsundokuError>>,
    {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TsundokuError::cancelled()),
            permit = self.slots.clone().acquire_owned() => permit.map_err(|_| {
                SystemError::Invariant {
                    message: "throttler semaphore closed".into(),
                }
            })?,
        };
        trace!(
            available = self.slots.available_permits(),
            "throttler slot acquired"
        );

        if !self.stagger.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TsundokuError::cancelled()),
                _ = tokio::time::sleep(self.stagger) => {}
            }
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TsundokuError::cancelled()),
            result = operation() => result,
        };
        drop(permit);
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time::Instant;
    use tsundoku_core::DataAccessError;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_never_exceeds_limit_and_is_staggered() {
        let throttler = RequestThrottler::new(3, Duration::from_millis(500));
        let cancel = CancellationToken::new();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let starts = Arc::new(Mutex::new(Vec::new()));
        let t0 = Instant::now();

        let calls = (0..10).map(|_| {
            let throttler = throttler.clone();
            let cancel = cancel.clone();
            let running = running.clone();
            let peak = peak.clone();
            let starts = starts.clone();
            async move {
                throttler
                    .execute(&cancel, || async {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        starts.lock().unwrap().push(t0.elapsed());
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        running.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .await
            }
        });
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(peak.load(Ordering::SeqCst), 3);

        let mut starts = starts.lock().unwrap().clone();
        starts.sort();
        // First wave starts after the stagger, not immediately.
        assert!(starts[0] >= Duration::from_millis(500));
        // The fourth call waits for a slot (1.5s) plus its own stagger.
        assert!(starts[3] >= Duration::from_millis(2000));
        // ceil(10 / 3) waves of stagger at minimum.
        assert!(t0.elapsed() >= Duration::from_millis(4 * 500));
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_are_served_in_fifo_order() {
        let throttler = RequestThrottler::new(1, Duration::from_millis(10));
        let cancel = CancellationToken::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let calls = (0..5).map(|i| {
            let throttler = throttler.clone();
            let cancel = cancel.clone();
            let order = order.clone();
            async move {
                throttler
                    .execute(&cancel, || async move {
                        order.lock().unwrap().push(i);
                        Ok(())
                    })
                    .await
            }
        });
        futures::future::join_all(calls).await;

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_operation_releases_slot() {
        let throttler = RequestThrottler::new(1, Duration::ZERO);
        let cancel = CancellationToken::new();

        let err = throttler
            .execute(&cancel, || async {
                Err::<(), _>(TsundokuError::from(DataAccessError::Network {
                    message: "connection reset".into(),
                }))
            })
            .await
            .unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(throttler.available_slots(), 1);

        let value = throttler.execute(&cancel, || async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_while_queued_returns_cancelled() {
        let throttler = RequestThrottler::new(1, Duration::ZERO);
        let holder_cancel = CancellationToken::new();
        let holder = {
            let throttler = throttler.clone();
            let token = holder_cancel.clone();
            tokio::spawn(async move {
                throttler
                    .execute(&token, || async {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        Ok(())
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(throttler.available_slots(), 0);

        let cancel = CancellationToken::new();
        let waiter = {
            let throttler = throttler.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { throttler.execute(&cancel, || async { Ok(()) }).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        let err = waiter.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());

        holder_cancel.cancel();
        assert!(holder.await.unwrap().unwrap_err().is_cancelled());
        assert_eq!(throttler.available_slots(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_operation_frees_slot() {
        let throttler = RequestThrottler::new(2, Duration::from_millis(500));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let err = throttler
            .execute(&cancel, || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(throttler.available_slots(), 2);
    }

    #[test]
    fn zero_limit_is_raised_to_one() {
        let throttler = RequestThrottler::new(0, Duration::ZERO);
        assert_eq!(throttler.max_concurrent(), 1);
        assert_eq!(throttler.available_slots(), 1);
    }
}
