//! Shared error type across tconnect crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Unified error type used by core and connector.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("invalid config: {0}")]
    Config(String),
    #[error("sync engine: {0}")]
    Engine(String),
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl ConnectorError {
    /// Short stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectorError::Config(_) => "config",
            ConnectorError::Engine(_) => "engine",
            ConnectorError::Upload(_) => "upload",
            ConnectorError::Internal(_) => "internal",
        }
    }
}
