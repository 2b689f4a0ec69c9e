//! Top-level facade crate for tconnect.
//!
//! Re-exports the core aggregator/hook types and the connector library so
//! users can depend on a single crate.

pub mod core {
    pub use tconnect_core::*;
}

pub mod connector {
    pub use tconnect_connector::*;
}
