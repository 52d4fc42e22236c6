// =============================================================================
// Time-bound memoization for provider fetches
// =============================================================================
//
// Each upstream source gets its own typed `TtlCell`. A cell returns its stored
// value while it is younger than the TTL, otherwise it awaits the supplied
// fetcher and stores the result. Errors are never cached, so a failed source
// is retried on the next cycle.
//
// The clock is injected so tests can advance time deterministically. There is
// no cross-task fetch coalescing: two callers racing past an expired entry
// both fetch and the last write wins, which is acceptable at a five-minute
// TTL with a single refresh loop.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use parking_lot::RwLock;

/// Injectable time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Production clock backed by `std::time::Instant`.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A single-value memo slot with a freshness window.
pub struct TtlCell<T> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slot: RwLock<Option<(T, Instant)>>,
}

impl<T: Clone> TtlCell<T> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            slot: RwLock::new(None),
        }
    }

    /// Return the cached value if it is still fresh, without fetching.
    pub fn peek(&self) -> Option<T> {
        let slot = self.slot.read();
        match slot.as_ref() {
            Some((value, stored_at))
                if self.clock.now().duration_since(*stored_at) < self.ttl =>
            {
                Some(value.clone())
            }
            _ => None,
        }
    }

    /// Return the cached value if fresh; otherwise run `fetcher`, store its
    /// result on success, and return it. A fetcher error leaves the slot
    /// untouched (stale entries are not resurrected, failures are not cached).
    pub async fn get_or_fetch<F, Fut>(&self, fetcher: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.peek() {
            return Ok(value);
        }

        let value = fetcher().await?;
        *self.slot.write() = Some((value.clone(), self.clock.now()));
        Ok(value)
    }

    /// Drop any stored value, forcing the next access to fetch.
    pub fn invalidate(&self) {
        *self.slot.write() = None;
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Manually advanced clock for deterministic TTL tests.
    struct MockClock {
        base: Instant,
        offset: Mutex<Duration>,
    }

    impl MockClock {
        fn new() -> Self {
            Self {
                base: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            }
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock() += by;
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock()
        }
    }

    #[tokio::test]
    async fn second_call_within_ttl_hits_cache() {
        let clock = Arc::new(MockClock::new());
        let cell: TtlCell<u32> = TtlCell::new(Duration::from_secs(300), clock.clone());
        let calls = AtomicUsize::new(0);

        let first = cell
            .get_or_fetch(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await
            .unwrap();

        clock.advance(Duration::from_secs(299));
        let second = cell
            .get_or_fetch(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(8)
            })
            .await
            .unwrap();

        assert_eq!(first, 7);
        assert_eq!(second, 7, "fresh entry must be served, not refetched");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let clock = Arc::new(MockClock::new());
        let cell: TtlCell<u32> = TtlCell::new(Duration::from_secs(300), clock.clone());

        cell.get_or_fetch(|| async { Ok(1) }).await.unwrap();
        clock.advance(Duration::from_secs(300));

        let refreshed = cell.get_or_fetch(|| async { Ok(2) }).await.unwrap();
        assert_eq!(refreshed, 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let clock = Arc::new(MockClock::new());
        let cell: TtlCell<u32> = TtlCell::new(Duration::from_secs(300), clock.clone());

        let err = cell
            .get_or_fetch(|| async { anyhow::bail!("upstream down") })
            .await;
        assert!(err.is_err());
        assert!(cell.peek().is_none());

        // The very next call retries and succeeds.
        let ok = cell.get_or_fetch(|| async { Ok(3) }).await.unwrap();
        assert_eq!(ok, 3);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let clock = Arc::new(MockClock::new());
        let cell: TtlCell<u32> = TtlCell::new(Duration::from_secs(300), clock);

        cell.get_or_fetch(|| async { Ok(1) }).await.unwrap();
        cell.invalidate();
        assert!(cell.peek().is_none());

        let refetched = cell.get_or_fetch(|| async { Ok(9) }).await.unwrap();
        assert_eq!(refetched, 9);
    }
}
