//! Rate limiter shared by every outbound provider and inference call.
//!
//! One limiter instance is constructed at startup and handed to each
//! collaborator that performs network I/O, so tests can substitute a
//! zero-delay limiter.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default minimum spacing between scheduled operation starts.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(2000);

/// Paces asynchronous operations so that two consecutive starts are
/// separated by at least the configured interval.
///
/// Operations run in submission order (the inner mutex queues waiters
/// FIFO). A failure inside a scheduled operation propagates to its own
/// caller only; the limiter state is untouched by operation outcomes.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

struct Inner {
    min_interval: Duration,
    /// Earliest instant at which the next operation may start.
    next_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                min_interval,
                next_start: Mutex::new(None),
            }),
        }
    }

    /// A limiter that imposes no spacing. For tests.
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Run `op`, delaying its start until the pacing slot is free.
    ///
    /// The slot is reserved before `op` begins, so the operation's own
    /// duration does not extend the spacing for the next caller.
    pub async fn schedule<F, T>(&self, op: F) -> T
    where
        F: Future<Output = T>,
    {
        {
            let mut next_start = self.inner.next_start.lock().await;
            if let Some(at) = *next_start
                && at > Instant::now()
            {
                tokio::time::sleep_until(at).await;
            }
            *next_start = Some(Instant::now() + self.inner.min_interval);
        }
        op.await
    }

    pub fn min_interval(&self) -> Duration {
        self.inner.min_interval
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
