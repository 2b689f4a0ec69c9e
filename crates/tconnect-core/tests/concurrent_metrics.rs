//! Concurrent writers and readers against one aggregator.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;

use tconnect_core::Metrics;

const WRITERS: usize = 8;
const PER_WRITER: usize = 2_000;

#[test]
fn no_lost_increments_under_contention() {
    let metrics = Arc::new(Metrics::new());

    let mut handles = Vec::new();
    for w in 0..WRITERS {
        let m = Arc::clone(&metrics);
        handles.push(thread::spawn(move || {
            for i in 0..PER_WRITER {
                match i % 3 {
                    0 => m.record(None),
                    1 => m.record(Some("not-a-date")),
                    _ => {
                        let ts = format!("2024-05-01T10:{:02}:00Z", w);
                        m.record(Some(ts.as_str()));
                    }
                }
            }
        }));
    }

    for _ in 0..4 {
        let m = Arc::clone(&metrics);
        handles.push(thread::spawn(move || {
            let mut last = 0;
            for _ in 0..PER_WRITER {
                let snap = m.snapshot();
                assert!(snap.total_entries >= last, "total_entries went backwards");
                assert!(snap.entries_window <= snap.total_entries);
                last = snap.total_entries;
            }
        }));
    }

    for h in handles {
        h.join().expect("worker panicked");
    }

    let snap = metrics.snapshot();
    let timed_per_writer = (0..PER_WRITER).filter(|i| i % 3 == 2).count();
    assert_eq!(snap.total_entries, (WRITERS * PER_WRITER) as u64);
    assert_eq!(snap.entries_window, (WRITERS * timed_per_writer) as u64);
    assert_eq!(
        snap.last_entry_time.map(|t| t.to_rfc3339()),
        Some(format!("2024-05-01T10:{:02}:00+00:00", WRITERS - 1))
    );
    assert!(snap.last_sync_time.is_some());
}
