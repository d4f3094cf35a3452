//! Error types for action primitives

use thiserror::Error;

/// Failure reported by a [`crate::PageHost`] while applying an effect.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HostError {
    /// The page went away (navigation, closed tab, detached frame)
    #[error("Page unavailable: {0}")]
    PageGone(String),

    /// A previously resolved element is no longer attached
    #[error("Stale element reference: {0}")]
    StaleElement(String),

    /// Script evaluation or transport failure
    #[error("Script evaluation failed: {0}")]
    Script(String),

    /// The host returned something the engine cannot interpret
    #[error("Unexpected host response: {0}")]
    Protocol(String),
}

/// Errors raised while decoding or interpreting actions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionError {
    /// The action list payload is not a list
    #[error("Invalid action payload: {0}")]
    InvalidPayload(String),

    /// The backend reported an error instead of actions
    #[error("Backend error: {0}")]
    Backend(String),

    /// Host-side failure while performing an action
    #[error(transparent)]
    Host(#[from] HostError),
}

impl ActionError {
    /// Whether this error only concerns a single action (and must therefore
    /// never abort the surrounding sequence)
    pub fn is_per_action(&self) -> bool {
        matches!(self, ActionError::Host(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_errors_are_per_action() {
        let err: ActionError = HostError::PageGone("navigated".into()).into();
        assert!(err.is_per_action());
        assert_eq!(err.to_string(), "Page unavailable: navigated");
        assert!(!ActionError::InvalidPayload("x".into()).is_per_action());
    }
}
