use std::net::{Ipv4Addr, SocketAddr};

use serde::Deserialize;
use tconnect_core::error::{ConnectorError, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectorConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub connector: ConnectorSection,

    #[serde(default)]
    pub sync: SyncSection,
}

impl ConnectorConfig {
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.connector.validate()?;
        self.sync.validate()?;
        Ok(())
    }

    /// Apply environment overrides. Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(port) = get("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| ConnectorError::Config(format!("PORT={port:?}: {e}")))?;
        }
        if let Some(region) = get("TCONNECT_REGION") {
            self.sync.region = Some(region);
        }
        if let Some(command) = get("TCONNECT_SYNC_COMMAND") {
            self.sync.command = command;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(ConnectorError::Config("server.port must not be 0".into()));
        }
        Ok(())
    }

    /// All interfaces on the configured port.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

fn default_port() -> u16 {
    8000
}

/// Static values echoed by `/health/data`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectorSection {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_connect_source")]
    pub connect_source: String,

    #[serde(default = "default_sync_interval_minutes")]
    pub sync_interval_minutes: u32,
}

impl Default for ConnectorSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            connect_source: default_connect_source(),
            sync_interval_minutes: default_sync_interval_minutes(),
        }
    }
}

impl ConnectorSection {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ConnectorError::Config("connector.name must not be empty".into()));
        }
        if self.sync_interval_minutes == 0 {
            return Err(ConnectorError::Config(
                "connector.sync_interval_minutes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_name() -> String {
    "Tandem Connector".into()
}
fn default_connect_source() -> String {
    "TConnectSync".into()
}
fn default_sync_interval_minutes() -> u32 {
    1
}

/// How the external sync engine is launched.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncSection {
    #[serde(default = "default_command")]
    pub command: String,

    /// Run continuously (`--auto-update`).
    #[serde(default = "default_true")]
    pub auto_update: bool,

    /// Verify the login before syncing (`--check-login`).
    #[serde(default = "default_true")]
    pub check_login: bool,

    #[serde(default)]
    pub region: Option<String>,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            command: default_command(),
            auto_update: true,
            check_login: true,
            region: None,
        }
    }
}

impl SyncSection {
    pub fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(ConnectorError::Config("sync.command must not be empty".into()));
        }
        Ok(())
    }
}

fn default_command() -> String {
    "tconnectsync".into()
}
fn default_true() -> bool {
    true
}
