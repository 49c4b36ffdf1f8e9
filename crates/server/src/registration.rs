//! Registration state for the single hosted worker version.
//!
//! Tracks where the worker is in its lifecycle and records the two
//! capabilities the worker can invoke on its host.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use serde::Serialize;
use shellcache_client::Host;
use shellcache_core::Error;

use crate::error::HostError;

/// Lifecycle state of the hosted worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum WorkerState {
    /// Registered, install event not yet delivered.
    Parsed = 0,
    Installing = 1,
    /// Install finished, waiting for activation.
    Installed = 2,
    Activating = 3,
    /// Controlling clients; fetch events are delivered to the worker.
    Activated = 4,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => WorkerState::Installing,
            2 => WorkerState::Installed,
            3 => WorkerState::Activating,
            4 => WorkerState::Activated,
            _ => WorkerState::Parsed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
        }
    }

    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
pub struct Registration {
    state: AtomicU8,
    skip_waiting: AtomicBool,
    clients_claimed: AtomicBool,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Whether the worker asked to activate without waiting.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }

    /// Enter `installing`. Allowed once, from `parsed`; a failed install
    /// returns the registration there.
    pub fn begin_install(&self) -> Result<(), HostError> {
        self.transition(&[WorkerState::Parsed], WorkerState::Installing, "parsed")
    }

    pub fn finish_install(&self, succeeded: bool) {
        let next = if succeeded { WorkerState::Installed } else { WorkerState::Parsed };
        self.set(next);
    }

    /// Enter `activating`. Allowed after a completed install, including
    /// re-activation of an already active worker.
    pub fn begin_activate(&self) -> Result<(), HostError> {
        self.transition(
            &[WorkerState::Installed, WorkerState::Activated],
            WorkerState::Activating,
            "installed or activated",
        )
    }

    pub fn finish_activate(&self, succeeded: bool) {
        let next = if succeeded { WorkerState::Activated } else { WorkerState::Installed };
        self.set(next);
    }

    fn set(&self, next: WorkerState) {
        let previous = WorkerState::from_u8(self.state.swap(next as u8, Ordering::SeqCst));
        tracing::info!(from = %previous, to = %next, "worker state changed");
    }

    fn transition(&self, from: &[WorkerState], to: WorkerState, expected: &'static str) -> Result<(), HostError> {
        for candidate in from {
            if self
                .state
                .compare_exchange(*candidate as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                tracing::info!(from = %candidate, to = %to, "worker state changed");
                return Ok(());
            }
        }

        Err(HostError::InvalidState { expected, actual: self.state() })
    }
}

#[async_trait::async_trait]
impl Host for Registration {
    fn skip_waiting(&self) {
        tracing::debug!("worker requested skip waiting");
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        tracing::debug!("worker claimed clients");
        self.clients_claimed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
