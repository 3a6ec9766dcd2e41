//! Monotonic time source, generalized from the reference workspace's
//! dual real/paper `DataProvider` split (`LiveDataProvider` vs.
//! `SimulatedExecutionHandler`) applied to time instead of market data.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// A pluggable time source. The scheduler and round controller read `now()`
/// exclusively through this trait so that restart/recovery math (`max(0,
/// deadline - now)`) and round-timing tests are deterministic.
#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Suspends the caller for `dur`. Real clocks sleep on the Tokio
    /// reactor; fake clocks resolve immediately and rely on the test driving
    /// `FakeClock::advance` to move time forward instead.
    async fn sleep(&self, dur: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, dur: Duration) {
        tokio::time::sleep(dur).await;
    }
}

/// Test clock advanced explicitly by the driving test, never by wall time.
/// Stored as millis-since-epoch so it can be shared behind a plain
/// `Arc<FakeClock>` without a lock around a `DateTime`.
pub struct FakeClock {
    millis: AtomicI64,
}

impl FakeClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    pub fn advance(&self, dur: Duration) {
        self.millis
            .fetch_add(i64::try_from(dur.as_millis()).unwrap_or(i64::MAX), Ordering::SeqCst);
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_else(Utc::now)
    }

    /// Fake sleeps never block; tests advance the clock and poll instead.
    async fn sleep(&self, _dur: Duration) {
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_advances_explicitly() {
        let start = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let clock = FakeClock::new(start);
        assert_eq!(clock.now(), start);
        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(90));
    }
}
