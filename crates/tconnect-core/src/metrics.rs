//! Upload metrics aggregator.
//!
//! One writer (the interception hook on the sync thread) and any number of
//! readers (health requests). Every operation takes the single state lock for
//! its full read-modify-write, window pruning included, and never calls out
//! while holding it.
//!
//! Untimed uploads (missing or unparsable `created_at`) count toward the
//! total but stay out of the 24h window and never move `last_entry_time`.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;

use crate::hook::RecordSink;
use crate::time::{parse_created_at, serialize_opt};

/// Width of the trailing arrival window.
pub const WINDOW_HOURS: i64 = 24;

/// Point-in-time view of the aggregator, shaped for `/health/data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_entries: u64,
    #[serde(serialize_with = "serialize_opt")]
    pub last_entry_time: Option<DateTime<FixedOffset>>,
    #[serde(rename = "entriesLast24Hours")]
    pub entries_window: u64,
    #[serde(serialize_with = "serialize_opt")]
    pub last_sync_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct MetricsState {
    total_entries: u64,
    last_entry_time: Option<DateTime<FixedOffset>>,
    last_sync_time: Option<DateTime<Utc>>,
    /// Arrival instants of timed uploads, oldest first.
    window: VecDeque<DateTime<Utc>>,
}

impl MetricsState {
    fn apply(&mut self, now: DateTime<Utc>, parsed: Option<DateTime<FixedOffset>>) {
        self.total_entries += 1;
        self.last_sync_time = Some(now);

        if let Some(ts) = parsed {
            if self.last_entry_time.map_or(true, |prev| ts > prev) {
                self.last_entry_time = Some(ts);
            }
            self.window.push_back(now);
        }

        self.prune(now);
    }

    fn snapshot(&mut self, now: DateTime<Utc>) -> MetricsSnapshot {
        self.prune(now);

        MetricsSnapshot {
            total_entries: self.total_entries,
            last_entry_time: self.last_entry_time,
            entries_window: self.window.len() as u64,
            last_sync_time: self.last_sync_time,
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::hours(WINDOW_HOURS);
        // Arrivals are appended under the lock, but the wall clock can step
        // backwards, so filter the whole buffer rather than trimming the front.
        self.window.retain(|arrived| *arrived > cutoff);
    }
}

/// Concurrency-safe upload counters plus the 24h arrival window.
///
/// Construct once at startup and share via `Arc`.
#[derive(Debug, Default)]
pub struct Metrics {
    state: Mutex<MetricsState>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observed upload at the current wall-clock time.
    ///
    /// The clock is read under the lock so `last_sync_time` follows lock
    /// order across concurrent writers.
    pub fn record(&self, created_at: Option<&str>) {
        let parsed = created_at.and_then(parse_created_at);
        let mut st = self.lock();
        st.apply(Utc::now(), parsed);
    }

    /// Record one observed upload that arrived at `now`.
    pub fn record_at(&self, now: DateTime<Utc>, created_at: Option<&str>) {
        let parsed = created_at.and_then(parse_created_at);
        self.lock().apply(now, parsed);
    }

    /// Snapshot at the current wall-clock time.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut st = self.lock();
        st.snapshot(Utc::now())
    }

    /// Prune arrivals older than the window relative to `now`, then snapshot.
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> MetricsSnapshot {
        self.lock().snapshot(now)
    }

    // Poisoning only means some other thread panicked mid-call; every update
    // above leaves the state consistent, so keep serving it.
    fn lock(&self) -> MutexGuard<'_, MetricsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordSink for Metrics {
    fn record(&self, created_at: Option<&str>) {
        Metrics::record(self, created_at);
    }
}
