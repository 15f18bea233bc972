//! Bounded-concurrency rate limiter (§4.1, §5).
//!
//! This replaces the teacher's callback-style promise queue with a bounded
//! worker pool: a `tokio::sync::Semaphore` already serves waiters in FIFO
//! order, which is exactly the fairness guarantee §5 asks for ("the limiter
//! preserves FIFO among waiters"). The populator limiter additionally enforces
//! a minimum gap between dispatches, tracked by the timestamp of the most
//! recently granted permit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

/// A permit held for the duration of one upstream call. Releases the
/// concurrency slot on drop.
pub struct RateLimitPermit(#[allow(dead_code)] OwnedSemaphorePermit);

/// Bounded concurrency, optionally with a minimum inter-dispatch gap.
///
/// One instance is constructed per process for the request-path fan-out
/// (`concurrency = 5`, no gap) and a second, distinct instance for the
/// scheduled populator (`concurrency = 8`, `min_gap = 250ms`), per §4.1.
#[derive(Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    min_gap: Option<Duration>,
    last_dispatch: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    pub fn new(concurrency: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            min_gap: None,
            last_dispatch: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_min_gap(concurrency: usize, min_gap: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            min_gap: Some(min_gap),
            last_dispatch: Arc::new(Mutex::new(None)),
        }
    }

    /// Request-path default: 5 concurrent outstanding requests, no gap.
    pub fn request_path() -> Self {
        Self::new(5)
    }

    /// Populator default: 8 concurrent, 250ms minimum gap between dispatches.
    pub fn populator() -> Self {
        Self::with_min_gap(8, Duration::from_millis(250))
    }

    /// Waits for a free concurrency slot (FIFO among waiters), then, if a
    /// minimum gap is configured, waits out whatever remains of that gap
    /// since the last dispatch before returning the permit.
    pub async fn acquire(&self) -> RateLimitPermit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("rate limiter semaphore never closes");

        if let Some(gap) = self.min_gap {
            let mut last = self.last_dispatch.lock().await;
            if let Some(previous) = *last {
                let elapsed = previous.elapsed();
                if elapsed < gap {
                    tokio::time::sleep(gap - elapsed).await;
                }
            }
            *last = Some(Instant::now());
        }

        RateLimitPermit(permit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn limits_concurrency() {
        let limiter = RateLimiter::new(2);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let limiter = limiter.clone();
            let in_flight = in_flight.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _permit = limiter.acquire().await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn waiters_are_served_fifo() {
        let limiter = RateLimiter::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));

        // Hold the only permit so the next three acquires queue up in order.
        let held = limiter.acquire().await;

        let mut handles = Vec::new();
        for i in 0..3 {
            let limiter = limiter.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                // Stagger spawn slightly so waiters enqueue in a known order.
                tokio::time::sleep(Duration::from_millis(5 * i as u64)).await;
                let _permit = limiter.acquire().await;
                order.lock().await.push(i);
            }));
        }
        // Give the spawned tasks time to start waiting before releasing.
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(held);

        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(*order.lock().await, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn enforces_minimum_gap() {
        let limiter = RateLimiter::with_min_gap(4, Duration::from_millis(50));
        let start = Instant::now();
        let _a = limiter.acquire().await;
        let _b = limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
