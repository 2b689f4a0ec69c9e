//! Background sync loop supervision.
//!
//! The engine runs on one dedicated OS thread. The thread is never joined:
//! [`SyncHandle::detach`] drops the join handle, and when the foreground
//! server exits the process goes down with the loop still running. Engine
//! failures end the thread only; there is no restart.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tconnect_core::Uploader;

use crate::config::{CredentialStatus, SyncSection};
use crate::engine::SyncEngine;

const THREAD_NAME: &str = "sync-loop";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SyncState {
    Starting = 0,
    Running = 1,
    /// Engine returned normally.
    Exited = 2,
    /// Engine returned an error or panicked, or the thread never started.
    Crashed = 3,
}

impl SyncState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => SyncState::Starting,
            1 => SyncState::Running,
            2 => SyncState::Exited,
            _ => SyncState::Crashed,
        }
    }
}

#[derive(Debug, Clone)]
struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(SyncState::Starting as u8)))
    }
    fn set(&self, s: SyncState) {
        self.0.store(s as u8, Ordering::Release);
    }
    fn get(&self) -> SyncState {
        SyncState::from_u8(self.0.load(Ordering::Acquire))
    }
}

/// Engine invocation flags, in the order the engine expects them.
pub fn engine_args(cfg: &SyncSection) -> Vec<String> {
    let mut args = Vec::new();
    if cfg.auto_update {
        args.push("--auto-update".to_string());
    }
    if cfg.check_login {
        args.push("--check-login".to_string());
    }
    if let Some(region) = cfg.region.as_deref().filter(|r| !r.is_empty()) {
        args.push("--region".to_string());
        args.push(region.to_string());
    }
    args
}

pub struct SyncSupervisor {
    args: Vec<String>,
    credentials: CredentialStatus,
    engine: Arc<dyn SyncEngine>,
    uploader: Arc<dyn Uploader>,
}

impl SyncSupervisor {
    pub fn new(
        cfg: &SyncSection,
        credentials: CredentialStatus,
        engine: Arc<dyn SyncEngine>,
        uploader: Arc<dyn Uploader>,
    ) -> Self {
        Self {
            args: engine_args(cfg),
            credentials,
            engine,
            uploader,
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Launch the loop. Never fails: a spawn error is logged and reported as
    /// [`SyncState::Crashed`] on the returned handle.
    pub fn start(self) -> SyncHandle {
        if !self.credentials.is_complete() {
            tracing::warn!(
                email = self.credentials.email,
                password = self.credentials.password,
                "TCONNECT_EMAIL or TCONNECT_PASSWORD not set; starting sync engine anyway"
            );
        }

        let state = SharedState::new();
        let thread_state = state.clone();
        let Self { args, engine, uploader, .. } = self;

        let spawned = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || run_loop(thread_state, args, engine, uploader));

        match spawned {
            Ok(thread) => SyncHandle { state, thread: Some(thread) },
            Err(e) => {
                tracing::error!(error = %e, "failed to spawn sync loop thread");
                state.set(SyncState::Crashed);
                SyncHandle { state, thread: None }
            }
        }
    }
}

fn run_loop(
    state: SharedState,
    args: Vec<String>,
    engine: Arc<dyn SyncEngine>,
    uploader: Arc<dyn Uploader>,
) {
    state.set(SyncState::Running);
    tracing::info!(args = ?args, "starting sync loop");

    let outcome = catch_unwind(AssertUnwindSafe(|| engine.run(&args, uploader.as_ref())));

    match outcome {
        Ok(Ok(())) => {
            state.set(SyncState::Exited);
            tracing::info!("sync loop exited");
        }
        Ok(Err(e)) => {
            state.set(SyncState::Crashed);
            tracing::error!(error = %e, kind = e.kind(), "sync loop crashed");
        }
        Err(_) => {
            state.set(SyncState::Crashed);
            tracing::error!("sync loop panicked");
        }
    }
}

/// Observer for the background loop. Holding it does not keep the loop
/// alive, and dropping it does not stop the loop.
pub struct SyncHandle {
    state: SharedState,
    thread: Option<JoinHandle<()>>,
}

impl SyncHandle {
    pub fn state(&self) -> SyncState {
        self.state.get()
    }

    /// True once the loop thread has returned (or never started).
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Give up the handle without joining. The loop keeps running until it
    /// ends on its own or the process exits.
    pub fn detach(mut self) {
        drop(self.thread.take());
    }
}
