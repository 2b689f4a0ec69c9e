//! Upload interception.
//!
//! The sync engine pushes each record through an [`Uploader`]. The
//! [`InterceptingUploader`] implements the same contract, reports every call to
//! a [`RecordSink`], then hands the call to the real uploader untouched.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;

/// Entity used when the engine does not name one.
pub const DEFAULT_ENTITY: &str = "treatments";

/// Receives one notification per observed upload.
pub trait RecordSink: Send + Sync {
    /// `created_at` is the raw field value, if the record carried a string.
    fn record(&self, created_at: Option<&str>);
}

/// Outcome of a successful push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub entity: String,
}

/// The engine's push-record operation.
pub trait Uploader: Send + Sync {
    fn upload_entry(&self, record: &Value, entity: &str) -> Result<UploadReceipt>;
}

impl<U: Uploader + ?Sized> Uploader for Arc<U> {
    fn upload_entry(&self, record: &Value, entity: &str) -> Result<UploadReceipt> {
        (**self).upload_entry(record, entity)
    }
}

/// Observes uploads without altering them.
pub struct InterceptingUploader<U> {
    inner: U,
    sink: Arc<dyn RecordSink>,
}

impl<U: Uploader> InterceptingUploader<U> {
    pub fn new(inner: U, sink: Arc<dyn RecordSink>) -> Self {
        Self { inner, sink }
    }

    pub fn inner(&self) -> &U {
        &self.inner
    }

    fn observe(&self, record: &Value, entity: &str) {
        let observed = catch_unwind(AssertUnwindSafe(|| {
            let created_at = record.get("created_at").and_then(Value::as_str);
            self.sink.record(created_at);
        }));

        match observed {
            Ok(()) => tracing::info!(entity = %entity, "Intercepted upload"),
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(entity = %entity, error = %reason, "error tracking metrics");
            }
        }
    }
}

impl<U: Uploader> Uploader for InterceptingUploader<U> {
    fn upload_entry(&self, record: &Value, entity: &str) -> Result<UploadReceipt> {
        self.observe(record, entity);
        self.inner.upload_entry(record, entity)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::error::ConnectorError;
    use crate::metrics::Metrics;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl Uploader for Recorder {
        fn upload_entry(&self, record: &Value, entity: &str) -> Result<UploadReceipt> {
            self.seen
                .lock()
                .unwrap()
                .push((record.to_string(), entity.to_string()));
            if self.fail {
                return Err(ConnectorError::Upload("nightscout said no".into()));
            }
            Ok(UploadReceipt { entity: entity.to_string() })
        }
    }

    struct PanickingSink;

    impl RecordSink for PanickingSink {
        fn record(&self, _created_at: Option<&str>) {
            panic!("sink exploded");
        }
    }

    #[test]
    fn records_then_delegates_unchanged() {
        let metrics = Arc::new(Metrics::new());
        let up = InterceptingUploader::new(Recorder::default(), metrics.clone());

        let rec = json!({"created_at": "2024-05-01T09:30:00Z", "eventType": "Bolus"});
        let receipt = up.upload_entry(&rec, "treatments").unwrap();

        assert_eq!(receipt, UploadReceipt { entity: "treatments".into() });
        let seen = up.inner().seen.lock().unwrap().clone();
        assert_eq!(seen, vec![(rec.to_string(), "treatments".to_string())]);

        let snap = metrics.snapshot();
        assert_eq!(snap.total_entries, 1);
        assert_eq!(snap.entries_window, 1);
        assert!(snap.last_entry_time.is_some());
    }

    #[test]
    fn inner_error_passes_through_after_recording() {
        let metrics = Arc::new(Metrics::new());
        let up = InterceptingUploader::new(
            Recorder { fail: true, ..Default::default() },
            metrics.clone(),
        );

        let err = up.upload_entry(&json!({}), "devicestatus").unwrap_err();
        assert!(matches!(err, ConnectorError::Upload(_)));
        assert_eq!(metrics.snapshot().total_entries, 1);
        assert_eq!(metrics.snapshot().entries_window, 0);
    }

    #[test]
    fn non_string_created_at_is_untimed() {
        let metrics = Arc::new(Metrics::new());
        let up = InterceptingUploader::new(Recorder::default(), metrics.clone());

        up.upload_entry(&json!({"created_at": 1714555800}), "entries").unwrap();
        up.upload_entry(&json!({"created_at": null}), "entries").unwrap();

        let snap = metrics.snapshot();
        assert_eq!(snap.total_entries, 2);
        assert_eq!(snap.entries_window, 0);
        assert!(snap.last_entry_time.is_none());
    }

    /// Reads the aggregator from inside the push, as a slow downstream might.
    struct SnapshottingUploader {
        metrics: Arc<Metrics>,
        seen_totals: Mutex<Vec<u64>>,
    }

    impl Uploader for SnapshottingUploader {
        fn upload_entry(&self, _record: &Value, entity: &str) -> Result<UploadReceipt> {
            let snap = self.metrics.snapshot();
            self.seen_totals.lock().unwrap().push(snap.total_entries);
            Ok(UploadReceipt { entity: entity.to_string() })
        }
    }

    #[test]
    fn sink_lock_released_before_delegating() {
        let metrics = Arc::new(Metrics::new());
        let inner = SnapshottingUploader {
            metrics: metrics.clone(),
            seen_totals: Mutex::new(Vec::new()),
        };
        let up = InterceptingUploader::new(inner, metrics.clone());

        up.upload_entry(&json!({"created_at": "2024-05-01T09:30:00Z"}), "treatments").unwrap();
        up.upload_entry(&json!({}), "entries").unwrap();

        // Each push already sees its own record.
        assert_eq!(*up.inner().seen_totals.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn sink_panic_never_blocks_delegation() {
        let up = InterceptingUploader::new(Recorder::default(), Arc::new(PanickingSink));

        let receipt = up.upload_entry(&json!({"created_at": "x"}), "treatments").unwrap();
        assert_eq!(receipt.entity, "treatments");
        assert_eq!(up.inner().seen.lock().unwrap().len(), 1);
    }
}
