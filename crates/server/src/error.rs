//! Host-level errors for the shellcache-mcp server.
//!
//! Worker and storage failures arrive as `shellcache_core::Error` and carry
//! their own codes; these cover tool input and lifecycle ordering.

use rmcp::model::{ErrorCode, ErrorData as McpError};

use crate::registration::WorkerState;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Invalid tool parameters (e.g., empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Lifecycle event delivered out of order.
    #[error("INVALID_STATE: expected {expected}, worker is {actual}")]
    InvalidState { expected: &'static str, actual: WorkerState },
}

impl From<HostError> for McpError {
    fn from(err: HostError) -> Self {
        let code = match &err {
            HostError::InvalidInput(_) => -32602,
            HostError::InvalidState { .. } => -32011,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
