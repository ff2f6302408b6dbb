//! Process-local sliding-window rate limiter.
//!
//! Each key (a user id) maps to the timestamps of its recorded requests. Checking a limit
//! prunes timestamps that fell out of the window and compares what is left against the limit.
//! State lives in this process only: it is lost on restart and not shared between instances,
//! so limits hold only for single-instance deployments.
//!
//! `check` does not record the request. A caller that checks and then records leaves a gap in
//! which a concurrent request from the same user can pass the same check.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::debug;

/// How often the background sweep runs
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Timestamps older than this are dropped by the sweep regardless of any caller's window
pub const SWEEP_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Source of "now" in milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock for tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    now: std::sync::atomic::AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: std::sync::atomic::AtomicI64::new(start_millis),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now
            .fetch_add(by.as_millis() as i64, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(std::sync::atomic::Ordering::SeqCst)
    }
}

pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    records: Mutex<HashMap<String, Vec<i64>>>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, Vec<i64>>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Prune `key` to its window and return how many requests remain inside it
    fn used(&self, key: &str, window: Duration) -> usize {
        let cutoff = self.clock.now_millis() - window.as_millis() as i64;
        let mut records = self.records();
        match records.get_mut(key) {
            Some(timestamps) => {
                timestamps.retain(|&at| at > cutoff);
                timestamps.len()
            }
            None => 0,
        }
    }

    /// True when `key` has already made `limit` or more requests inside `window`
    pub fn check(&self, key: &str, limit: u32, window: Duration) -> bool {
        self.used(key, window) >= limit as usize
    }

    /// Record a request for `key` at the current time
    pub fn record(&self, key: &str) {
        let now = self.clock.now_millis();
        self.records().entry(key.to_string()).or_default().push(now);
    }

    /// Requests `key` may still make inside `window`, never negative
    pub fn remaining(&self, key: &str, limit: u32, window: Duration) -> u32 {
        let used = self.used(key, window);
        (limit as usize).saturating_sub(used) as u32
    }

    /// Drop timestamps older than `retention` and forget keys left with none
    pub fn sweep(&self, retention: Duration) -> usize {
        let cutoff = self.clock.now_millis() - retention.as_millis() as i64;
        let mut records = self.records();
        records.retain(|_, timestamps| {
            timestamps.retain(|&at| at > cutoff);
            !timestamps.is_empty()
        });
        records.len()
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.records().len()
    }

    /// Spawn the periodic sweep on the current tokio runtime
    pub fn start_sweeper(self: &Arc<Self>, every: Duration, retention: Duration) -> SweeperHandle {
        let limiter = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let remaining = limiter.sweep(retention);
                debug!("Rate limiter sweep done, {} keys tracked", remaining);
            }
        });
        SweeperHandle { task: Some(task) }
    }
}

/// Handle to the background sweep; dropping it stops the sweep
pub struct SweeperHandle {
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> (Arc<ManualClock>, RateLimiter) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let limiter = RateLimiter::new(clock.clone());
        (clock, limiter)
    }

    const WINDOW: Duration = Duration::from_millis(1000);

    #[test]
    fn limit_is_reached_after_recording_limit_requests() {
        let (_clock, limiter) = limiter();
        for _ in 0..3 {
            assert!(!limiter.check("user-1", 3, WINDOW));
            limiter.record("user-1");
        }
        assert!(limiter.check("user-1", 3, WINDOW));
    }

    #[test]
    fn limit_resets_once_the_window_elapses() {
        let (clock, limiter) = limiter();
        for _ in 0..3 {
            limiter.record("user-1");
        }
        assert!(limiter.check("user-1", 3, WINDOW));

        clock.advance(Duration::from_millis(1001));
        assert!(!limiter.check("user-1", 3, WINDOW));
        assert_eq!(limiter.remaining("user-1", 3, WINDOW), 3);
    }

    #[test]
    fn check_does_not_record() {
        let (_clock, limiter) = limiter();
        for _ in 0..10 {
            assert!(!limiter.check("user-1", 1, WINDOW));
        }
        assert_eq!(limiter.remaining("user-1", 1, WINDOW), 1);
    }

    #[test]
    fn remaining_counts_down_and_never_goes_negative() {
        let (_clock, limiter) = limiter();
        assert_eq!(limiter.remaining("user-1", 5, WINDOW), 5);
        for n in 1..=4u32 {
            limiter.record("user-1");
            assert_eq!(limiter.remaining("user-1", 5, WINDOW), 5 - n);
        }
        for _ in 0..3 {
            limiter.record("user-1");
        }
        assert_eq!(limiter.remaining("user-1", 5, WINDOW), 0);
    }

    #[test]
    fn users_are_limited_independently() {
        let (_clock, limiter) = limiter();
        limiter.record("user-1");
        limiter.record("user-1");
        assert!(limiter.check("user-1", 2, WINDOW));
        assert!(!limiter.check("user-2", 2, WINDOW));
    }

    #[test]
    fn window_slides_per_timestamp() {
        let (clock, limiter) = limiter();
        limiter.record("user-1");
        clock.advance(Duration::from_millis(600));
        limiter.record("user-1");
        assert!(limiter.check("user-1", 2, WINDOW));

        // First request leaves the window, second is still inside it
        clock.advance(Duration::from_millis(500));
        assert!(!limiter.check("user-1", 2, WINDOW));
        assert_eq!(limiter.remaining("user-1", 2, WINDOW), 1);
    }

    #[test]
    fn sweep_drops_stale_timestamps_and_empty_keys() {
        let (clock, limiter) = limiter();
        limiter.record("stale");
        clock.advance(Duration::from_secs(30 * 60));
        limiter.record("fresh");
        assert_eq!(limiter.tracked_keys(), 2);

        clock.advance(Duration::from_secs(31 * 60));
        assert_eq!(limiter.sweep(SWEEP_RETENTION), 1);
        assert_eq!(limiter.remaining("fresh", 5, SWEEP_RETENTION), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_runs_on_its_interval_and_stops() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = Arc::new(RateLimiter::new(clock.clone()));
        limiter.record("user-1");
        clock.advance(Duration::from_secs(2 * 60 * 60));

        let mut handle = limiter.start_sweeper(SWEEP_INTERVAL, SWEEP_RETENTION);
        assert!(handle.is_running());
        tokio::time::sleep(SWEEP_INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(limiter.tracked_keys(), 0);

        handle.stop();
        assert!(!handle.is_running());
    }
}
