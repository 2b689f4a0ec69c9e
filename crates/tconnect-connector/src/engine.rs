//! External sync engine adapter.
//!
//! The engine runs as a child process. Each stdout line that is a JSON object
//! carrying a `record` becomes one push through the supplied [`Uploader`];
//! everything else on stdout is treated as engine log output.

use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};
use std::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};
use tconnect_core::error::{ConnectorError, Result};
use tconnect_core::hook::DEFAULT_ENTITY;
use tconnect_core::{UploadReceipt, Uploader};

/// A blocking, long-running sync loop.
pub trait SyncEngine: Send + Sync {
    fn run(&self, args: &[String], uploader: &dyn Uploader) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct UploadLine {
    #[serde(default)]
    entity: Option<String>,
    record: Value,
}

#[derive(Debug, PartialEq)]
enum EngineLine {
    Upload { entity: String, record: Value },
    Log(String),
}

fn parse_line(line: &str) -> EngineLine {
    match serde_json::from_str::<UploadLine>(line) {
        Ok(up) => EngineLine::Upload {
            entity: up.entity.unwrap_or_else(|| DEFAULT_ENTITY.to_string()),
            record: up.record,
        },
        Err(_) => EngineLine::Log(line.to_string()),
    }
}

/// Runs the sync engine command and feeds its records to the uploader.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    command: String,
}

impl ProcessEngine {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl SyncEngine for ProcessEngine {
    fn run(&self, args: &[String], uploader: &dyn Uploader) -> Result<()> {
        let mut child = Command::new(&self.command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| ConnectorError::Engine(format!("spawn {} failed: {e}", self.command)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ConnectorError::Internal("engine stdout not captured".into()))?;

        tracing::info!(command = %self.command, pid = child.id(), "sync engine started");

        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ConnectorError::Engine(format!("reading engine output: {e}")));
                }
            }

            // Engine log output is not guaranteed to be UTF-8.
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);

            match parse_line(line) {
                EngineLine::Upload { entity, record } => {
                    // Retries belong to the engine; a failed push is only reported.
                    if let Err(e) = uploader.upload_entry(&record, &entity) {
                        tracing::warn!(entity = %entity, error = %e, "upload failed");
                    }
                }
                EngineLine::Log(text) => {
                    if !text.trim().is_empty() {
                        tracing::debug!(target: "tconnect_connector::engine::output", "{text}");
                    }
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| ConnectorError::Engine(format!("waiting for engine: {e}")))?;
        if !status.success() {
            return Err(ConnectorError::Engine(format!(
                "{} exited with {status}",
                self.command
            )));
        }
        Ok(())
    }
}

/// Delegate push: re-emits each record as one JSON line on a writer
/// (stdout by default) for a downstream uploader to consume.
pub struct RelayUploader<W> {
    out: Mutex<W>,
}

impl RelayUploader<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> RelayUploader<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<W: Write + Send> Uploader for RelayUploader<W> {
    fn upload_entry(&self, record: &Value, entity: &str) -> Result<UploadReceipt> {
        let line = json!({ "entity": entity, "record": record }).to_string();

        let mut out = self
            .out
            .lock()
            .map_err(|_| ConnectorError::Internal("relay writer poisoned".into()))?;
        writeln!(out, "{line}")
            .and_then(|_| out.flush())
            .map_err(|e| ConnectorError::Upload(format!("relay write failed: {e}")))?;

        Ok(UploadReceipt { entity: entity.to_string() })
    }
}
