//! sw_install and sw_activate tool implementations.
//!
//! Delivers lifecycle events to the worker and moves the registration
//! through its states around them.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;
use shellcache_client::{ActivationReport, CacheWorker, InstallReport};

use super::json_result;
use crate::registration::{Registration, WorkerState};

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize)]
pub struct InstallOutput {
    /// Registration state after the call.
    pub state: WorkerState,
    /// Whether the worker has claimed the open clients.
    pub controlling: bool,
    pub install: InstallReport,
    /// Present when the worker skipped waiting and was activated right away.
    pub activation: Option<ActivationReport>,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateOutput {
    pub state: WorkerState,
    pub controlling: bool,
    pub activation: ActivationReport,
}

/// Implementation of the sw_install tool.
pub async fn install_impl(worker: &CacheWorker, registration: &Registration) -> Result<CallToolResult, McpError> {
    registration.begin_install()?;

    let install = match worker.install().await {
        Ok(report) => {
            registration.finish_install(true);
            report
        }
        Err(e) => {
            registration.finish_install(false);
            return Err(e.into());
        }
    };

    let activation = if registration.skip_waiting_requested() {
        tracing::info!(cache = %worker.cache_name(), "skip waiting requested; activating immediately");
        Some(run_activation(worker, registration).await?)
    } else {
        None
    };

    json_result(&InstallOutput {
        state: registration.state(),
        controlling: registration.clients_claimed(),
        install,
        activation,
    })
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(worker: &CacheWorker, registration: &Registration) -> Result<CallToolResult, McpError> {
    let activation = run_activation(worker, registration).await?;
    json_result(&ActivateOutput { state: registration.state(), controlling: registration.clients_claimed(), activation })
}

async fn run_activation(worker: &CacheWorker, registration: &Registration) -> Result<ActivationReport, McpError> {
    registration.begin_activate()?;

    match worker.activate().await {
        Ok(report) => {
            registration.finish_activate(true);
            Ok(report)
        }
        Err(e) => {
            registration.finish_activate(false);
            Err(e.into())
        }
    }
}
