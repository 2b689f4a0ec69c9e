//! tconnect core: the metrics aggregator, the upload interception hook, and
//! the shared error surface.
//!
//! This crate carries no runtime or HTTP dependencies. The connector crate
//! wires these pieces to the sync engine thread and the health endpoints.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Metrics recording sits inside the sync loop, so nothing in this crate may
//! take the loop down on malformed records.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod hook;
pub mod metrics;
pub mod time;

/// Shared result type.
pub use error::{ConnectorError, Result};
pub use hook::{InterceptingUploader, RecordSink, UploadReceipt, Uploader};
pub use metrics::{Metrics, MetricsSnapshot};
