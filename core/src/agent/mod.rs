//! Remote agent interface
//!
//! The agent itself is an external collaborator: an opaque bidirectional
//! streaming call that pulls outbound user messages and pushes back typed
//! events. This module owns the boundary types — a closed event set at the
//! wire edge, so unknown variants are rejected/logged there instead of
//! leaking malformed shapes into the session.

use crate::error::Result;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One outbound payload on a live turn's message stream.
///
/// `injected` marks text spliced into an ongoing turn (an interrupt) as
/// opposed to the prompt that started it. The marker prefix is already
/// applied by the session; the flag travels too so transports that speak a
/// richer protocol can tag it structurally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    pub text: String,
    pub injected: bool,
}

impl UserMessage {
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            injected: false,
        }
    }

    pub fn interjection(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            injected: true,
        }
    }
}

/// Typed inbound events from the remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// First event of a session: what the remote side is running
    SystemInit {
        model: String,
        tools: Vec<String>,
        servers: Vec<String>,
    },
    /// Incremental response text
    TextDelta { text: String },
    /// A tool invocation began
    ToolStart {
        name: String,
        input: serde_json::Value,
    },
    /// A tool invocation finished
    ToolComplete { name: String },
    /// The remote side echoing text it absorbed into the turn context
    UserEcho { text: String },
    /// Terminal event for the turn
    TurnResult {
        duration_ms: u64,
        input_tokens: u64,
        output_tokens: u64,
        cost_usd: Option<f64>,
    },
}

impl AgentEvent {
    /// Whether this event ends the current turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::TurnResult { .. })
    }
}

/// Context carried with a permission request from the remote side.
#[derive(Debug, Clone, Default)]
pub struct PermissionContext {
    /// Correlation id for the pending tool use, when the wire provides one
    pub tool_use_id: Option<String>,
    /// Human-readable reason the remote side attached to the request
    pub description: Option<String>,
}

/// The decision returned from a permission check.
#[derive(Debug, Clone, PartialEq)]
pub enum PermissionDecision {
    Allow {
        /// "Always allow" — the remote side may persist a rule for this tool
        always: bool,
        /// Updated permission rules carried back with an "always" grant
        updated_rules: Vec<String>,
    },
    Deny {
        message: String,
    },
}

impl PermissionDecision {
    pub fn allow_once() -> Self {
        Self::Allow {
            always: false,
            updated_rules: Vec::new(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

/// Invoked synchronously (from the remote call's view) while a tool is
/// about to execute.
#[async_trait::async_trait]
pub trait PermissionHandler: Send + Sync {
    async fn check(
        &self,
        tool_name: &str,
        input: &serde_json::Value,
        ctx: &PermissionContext,
    ) -> PermissionDecision;
}

pub type InboundStream = BoxStream<'static, Result<AgentEvent>>;
pub type OutboundStream = BoxStream<'static, UserMessage>;

/// The remote streaming call. `outbound` is pull-based: the implementation
/// requests the next message whenever it wants one and observes end-of-
/// stream when the session closes the turn's bridge.
#[async_trait::async_trait]
pub trait AgentClient: Send + Sync {
    async fn query(
        &self,
        outbound: OutboundStream,
        permissions: Arc<dyn PermissionHandler>,
    ) -> Result<InboundStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_turn_result_is_terminal() {
        assert!(AgentEvent::TurnResult {
            duration_ms: 10,
            input_tokens: 1,
            output_tokens: 2,
            cost_usd: None,
        }
        .is_terminal());

        assert!(!AgentEvent::TextDelta {
            text: "hi".to_string()
        }
        .is_terminal());
        assert!(!AgentEvent::ToolComplete {
            name: "shell".to_string()
        }
        .is_terminal());
    }

    #[test]
    fn message_constructors_tag_origin() {
        assert!(!UserMessage::prompt("hello").injected);
        assert!(UserMessage::interjection("[note] also this").injected);
    }
}
