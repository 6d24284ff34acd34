//! Periodic job scheduling.
//!
//! Each job keeps its next due time in a global property so a restart picks
//! up the same cadence. Due times stay on the grid `due + k * frequency`: a
//! stale time is moved forward and a time too far ahead is pulled back, in
//! whole periods, to the first grid point not before now.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use board_core::GlobalKey;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::repository::{self, Store};
use crate::shutdown::ShutdownSignal;

/// Smallest `due + k * period` (k may be negative) that is not before `now`.
pub fn correct_time(due: DateTime<Utc>, period: TimeDelta, now: DateTime<Utc>) -> DateTime<Utc> {
    let period_ms = period.num_milliseconds();
    if period_ms <= 0 {
        return due.max(now);
    }

    let offset = (now - due).num_milliseconds();
    let periods = offset.div_euclid(period_ms) + i64::from(offset.rem_euclid(period_ms) != 0);
    let mut next = due + TimeDelta::milliseconds(periods * period_ms);
    // sub-millisecond remainder
    while next < now {
        next += period;
    }
    next
}

/// Runs jobs on their persisted cadence until shutdown.
pub struct Scheduler {
    store: Arc<dyn Store>,
    shutdown: ShutdownSignal,
}

impl Scheduler {
    pub fn new(store: Arc<dyn Store>, shutdown: ShutdownSignal) -> Self {
        Self { store, shutdown }
    }

    /// Reads the due time stored under `key`, realigns it and writes it back.
    /// A missing or unparsable value makes the job due immediately.
    pub fn next_due(
        &self,
        key: GlobalKey,
        period: TimeDelta,
        now: DateTime<Utc>,
    ) -> repository::Result<DateTime<Utc>> {
        let stored = self
            .store
            .property(key)?
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|due| due.with_timezone(&Utc));
        let due = correct_time(stored.unwrap_or(now), period, now);
        self.store.set_property(key, due.to_rfc3339())?;
        Ok(due)
    }

    /// Records that the run due at `due` happened.
    pub fn complete(
        &self,
        key: GlobalKey,
        due: DateTime<Utc>,
        period: TimeDelta,
    ) -> repository::Result<()> {
        self.store.set_property(key, (due + period).to_rfc3339())
    }

    /// Waits for each due time of `key` and runs `job`, until shutdown.
    pub async fn run<F, Fut>(&self, key: GlobalKey, frequency: Duration, mut job: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let period = TimeDelta::from_std(frequency).unwrap_or(TimeDelta::days(1));

        loop {
            let now = Utc::now();
            let due = self.next_due(key, period, now).unwrap_or_else(|e| {
                warn!("Failed to read schedule of {}: {}", key, e);
                now
            });
            let delay = (due - now).to_std().unwrap_or_default();
            info!("Next {} at {}", key, due.to_rfc3339());

            tokio::select! {
                _ = sleep(delay) => {}
                _ = self.shutdown.cancelled() => break,
            }

            job().await;

            if let Err(e) = self.complete(key, due, period) {
                warn!("Failed to record run of {}: {}", key, e);
            }
            if self.shutdown.is_triggered() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;

    use super::*;
    use crate::repository::{InMemoryStore, PropertyRepository};
    use crate::shutdown::shutdown_channel;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_correct_time_moves_stale_due_forward() {
        let next = correct_time(at(0, 0), TimeDelta::hours(1), at(3, 30));
        assert_eq!(next, at(4, 0));
    }

    #[test]
    fn test_correct_time_pulls_future_due_back() {
        let next = correct_time(at(10, 0), TimeDelta::hours(1), at(3, 30));
        assert_eq!(next, at(4, 0));
    }

    #[test]
    fn test_correct_time_keeps_exact_grid_point() {
        assert_eq!(correct_time(at(3, 0), TimeDelta::hours(1), at(5, 0)), at(5, 0));
        assert_eq!(correct_time(at(5, 0), TimeDelta::hours(1), at(5, 0)), at(5, 0));
    }

    #[test]
    fn test_next_due_persists_corrected_time() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set_property(GlobalKey::NextScoreSync, at(0, 0).to_rfc3339())
            .unwrap();
        let scheduler = Scheduler::new(store.clone(), ShutdownSignal::never());

        let due = scheduler
            .next_due(GlobalKey::NextScoreSync, TimeDelta::hours(1), at(3, 30))
            .unwrap();
        assert_eq!(due, at(4, 0));

        let stored = store.property(GlobalKey::NextScoreSync).unwrap().unwrap();
        assert_eq!(DateTime::parse_from_rfc3339(&stored).unwrap(), at(4, 0));
    }

    #[test]
    fn test_next_due_without_property_is_now() {
        let scheduler = Scheduler::new(Arc::new(InMemoryStore::new()), ShutdownSignal::never());
        let due = scheduler
            .next_due(GlobalKey::NextDemoSync, TimeDelta::hours(1), at(3, 30))
            .unwrap();
        assert_eq!(due, at(3, 30));
    }

    #[tokio::test]
    async fn test_run_executes_due_job_and_advances() {
        let store = Arc::new(InMemoryStore::new());
        let (trigger, signal) = shutdown_channel();
        let scheduler = Scheduler::new(store.clone(), signal);
        let runs = AtomicUsize::new(0);

        scheduler
            .run(GlobalKey::NextDemoSync, Duration::from_secs(3600), || {
                runs.fetch_add(1, Ordering::SeqCst);
                trigger.trigger();
                async {}
            })
            .await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        let stored = store.property(GlobalKey::NextDemoSync).unwrap().unwrap();
        let next = DateTime::parse_from_rfc3339(&stored).unwrap();
        assert!(next.with_timezone(&Utc) > Utc::now());
    }
}
