//! Dispatch error types.

use dispatch_session::{GatewayError, Phase};
use thiserror::Error;

/// Dispatch errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Missing or malformed request input
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Job popped while the session was not ready
    #[error("session not ready (phase: {0})")]
    NotReady(Phase),

    /// Gateway call failed
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Queue configuration rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
