//! Flow execution error types

use thiserror::Error;

/// Errors surfaced by the agent. Individual actions never produce these;
/// their failures are absorbed into step reports.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Inbound message could not be parsed
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Action payload error (not a list, backend error envelope)
    #[error("Action payload error: {0}")]
    Action(String),

    /// The sequence task panicked or was aborted
    #[error("Run task failed: {0}")]
    Task(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<action_primitives::ActionError> for FlowError {
    fn from(err: action_primitives::ActionError) -> Self {
        FlowError::Action(err.to_string())
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::InvalidMessage(err.to_string())
    }
}

impl From<tokio::task::JoinError> for FlowError {
    fn from(err: tokio::task::JoinError) -> Self {
        FlowError::Task(err.to_string())
    }
}
