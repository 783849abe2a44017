//! Token-bucket rate limiter for outbound API calls
//!
//! The bucket starts full and is refilled one token at a time by an
//! independent task, on a fixed period derived from the configured request
//! rate. Callers hold a token for each outbound call; when the bucket is
//! empty, acquisition re-checks on the refill period until a token appears.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::debug;

/// Configuration for the token bucket
#[derive(Debug, Clone)]
pub struct LimiterConfig {
    /// Outbound calls permitted per second
    pub requests_per_second: u32,

    /// Burst ceiling; defaults to `requests_per_second`
    pub burst_capacity: Option<u32>,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 2,
            burst_capacity: None,
        }
    }
}

impl LimiterConfig {
    /// Effective bucket capacity
    pub fn capacity(&self) -> u32 {
        self.burst_capacity
            .unwrap_or(self.requests_per_second)
            .max(1)
    }

    /// Period between single-token refills
    pub fn refill_period(&self) -> Duration {
        let millis = 1000 / u64::from(self.requests_per_second.max(1));
        Duration::from_millis(millis.max(1))
    }
}

/// Token-bucket admission gate
///
/// The available-token count stays within `[0, capacity]`: acquisition
/// decrements under the lock and the refill task increments clamped to
/// capacity. Safe to share across tasks behind an `Arc`.
pub struct TokenBucket {
    capacity: u32,
    available: Arc<Mutex<u32>>,
    refill_period: Duration,
    refill_task: JoinHandle<()>,
}

impl TokenBucket {
    /// Create a bucket and start its refill task
    ///
    /// Must be called from within a tokio runtime. The refill task stops
    /// when the bucket is dropped.
    pub fn new(config: LimiterConfig) -> Self {
        let capacity = config.capacity();
        let refill_period = config.refill_period();
        let available = Arc::new(Mutex::new(capacity));

        let refill_task = tokio::spawn(refill_loop(
            Arc::clone(&available),
            capacity,
            refill_period,
        ));

        Self {
            capacity,
            available,
            refill_period,
            refill_task,
        }
    }

    /// Suspend until a token is available, then consume it
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }
            debug!(
                wait_ms = self.refill_period.as_millis() as u64,
                "Rate limit reached, waiting for token"
            );
            tokio::time::sleep(self.refill_period).await;
        }
    }

    /// Consume a token if one is available
    pub fn try_acquire(&self) -> bool {
        let mut available = self.available.lock().unwrap();
        if *available > 0 {
            *available -= 1;
            true
        } else {
            false
        }
    }

    /// Current available-token count
    pub fn available(&self) -> u32 {
        *self.available.lock().unwrap()
    }

    /// Bucket capacity
    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

impl Drop for TokenBucket {
    fn drop(&mut self) {
        self.refill_task.abort();
    }
}

/// Add one token per period, clamped to capacity
async fn refill_loop(available: Arc<Mutex<u32>>, capacity: u32, period: Duration) {
    // First refill lands one full period after start; the bucket begins full.
    let mut timer = interval_at(Instant::now() + period, period);
    loop {
        timer.tick().await;
        let mut available = available.lock().unwrap();
        *available = (*available + 1).min(capacity);
    }
}
