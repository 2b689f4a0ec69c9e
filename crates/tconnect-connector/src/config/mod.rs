//! Connector config loader (strict YAML + environment overrides).

pub mod schema;

use std::fs;

use tconnect_core::error::{ConnectorError, Result};

pub use schema::{ConnectorConfig, ConnectorSection, ServerSection, SyncSection};

/// Env var naming an optional YAML config file.
pub const CONFIG_PATH_ENV: &str = "TCONNECT_CONFIG";

pub fn load_from_file(path: &str) -> Result<ConnectorConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ConnectorError::Config(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ConnectorConfig> {
    let cfg: ConnectorConfig = serde_yaml::from_str(s)
        .map_err(|e| ConnectorError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Defaults, then the file named by `TCONNECT_CONFIG` if any, then env overrides.
pub fn load<F>(lookup: F) -> Result<ConnectorConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = match lookup(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        Some(path) => load_from_file(&path)?,
        None => ConnectorConfig::default(),
    };
    cfg.apply_env(&lookup)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Which engine credentials are present. Values are never kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialStatus {
    pub email: bool,
    pub password: bool,
}

impl CredentialStatus {
    pub fn from_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).is_some_and(|v| !v.is_empty());
        Self {
            email: present("TCONNECT_EMAIL"),
            password: present("TCONNECT_PASSWORD"),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.email && self.password
    }
}
