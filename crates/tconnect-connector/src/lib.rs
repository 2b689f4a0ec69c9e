//! tconnect connector library entry.
//!
//! Wires the sync engine, the upload hook, the supervisor thread, and the
//! health endpoints into one process. Consumed by the binary (`main.rs`) and
//! by integration tests.

pub mod app_state;
pub mod config;
pub mod engine;
pub mod ops;
pub mod router;
pub mod supervisor;
