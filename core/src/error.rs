//! Structured error types for Tether
//!
//! Provides type-safe error handling with context for debugging and
//! user-friendly messages at the turn boundary.

use std::time::Duration;
use thiserror::Error;

/// Primary error type for Tether operations
#[derive(Error, Debug)]
pub enum TetherError {
    // =========================================================================
    // Remote Agent Errors
    // =========================================================================
    /// The agent process/endpoint could not be reached or started
    #[error("agent unavailable: {message}")]
    AgentUnavailable { message: String },

    /// The inbound event stream dropped mid-turn
    #[error("stream disconnected: {reason}")]
    StreamDisconnected { reason: String },

    /// The agent sent something the wire protocol does not allow
    #[error("protocol error: {detail}")]
    ProtocolError { detail: String },

    /// The agent reported a failure for the current turn
    #[error("agent error: {message}")]
    AgentError { message: String },

    /// Waiting on the agent took too long
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    // =========================================================================
    // Session / Input Errors
    // =========================================================================
    /// The input source closed while a response was still required
    #[error("input source closed")]
    InputClosed,

    /// A permission decision was required but the answer channel was gone
    #[error("permission channel closed for tool: {tool}")]
    PermissionChannelClosed { tool: String },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Missing required config
    #[error("missing required configuration: {key}")]
    MissingConfig { key: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal system error
    #[error("internal error: {message}")]
    Internal { message: String },

    // =========================================================================
    // External Error Wrappers
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),
}

impl TetherError {
    /// Errors that end the current turn but leave the session interactive.
    /// Everything else is fatal to the process (config, internal state).
    pub fn is_turn_fatal_only(&self) -> bool {
        matches!(
            self,
            Self::AgentUnavailable { .. }
                | Self::StreamDisconnected { .. }
                | Self::ProtocolError { .. }
                | Self::AgentError { .. }
                | Self::Timeout { .. }
                | Self::PermissionChannelClosed { .. }
        )
    }

    /// Get a user-friendly message for the single error line shown at the
    /// turn boundary. Never a raw stack trace.
    pub fn user_message(&self) -> String {
        match self {
            Self::AgentUnavailable { .. } => {
                "Could not reach the agent. Check the agent command in your configuration."
                    .to_string()
            }
            Self::StreamDisconnected { reason } => {
                format!("The agent stream dropped: {}", reason)
            }
            Self::Timeout { duration } => {
                format!("The agent did not respond within {:?}.", duration)
            }
            Self::InputClosed => "Input closed.".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Convert from serde_json::Error to TetherError
impl From<serde_json::Error> for TetherError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias using TetherError
pub type Result<T> = std::result::Result<T, TetherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_fatal_classification() {
        assert!(TetherError::StreamDisconnected {
            reason: "eof".to_string()
        }
        .is_turn_fatal_only());

        assert!(TetherError::AgentError {
            message: "tool crashed".to_string()
        }
        .is_turn_fatal_only());

        assert!(!TetherError::InvalidConfig {
            message: "empty model".to_string()
        }
        .is_turn_fatal_only());
    }

    #[test]
    fn test_user_messages() {
        let err = TetherError::AgentUnavailable {
            message: "spawn failed".to_string(),
        };
        assert!(err.user_message().contains("agent command"));

        let err = TetherError::StreamDisconnected {
            reason: "pipe closed".to_string(),
        };
        assert!(err.user_message().contains("pipe closed"));
    }
}
