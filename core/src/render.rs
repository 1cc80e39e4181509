//! Presentation boundary
//!
//! The session orchestrator never formats output itself; it calls through
//! this trait and moves on. Implementations live in the binary (console
//! renderer) and in tests (recording renderer).

use crate::agent::PermissionDecision;
use crate::session::SessionStats;

pub trait Renderer: Send + Sync {
    fn show_welcome(&self, model: &str);
    fn show_prompt(&self);
    fn show_continuation_prompt(&self);

    fn stream_token(&self, token: &str);
    fn complete_stream(&self);

    fn show_tool_start(&self, name: &str, input: &serde_json::Value);
    fn show_tool_complete(&self, name: &str);

    fn show_stats(&self, stats: &SessionStats);
    fn show_error(&self, message: &str);
    fn show_warning(&self, message: &str);
    fn show_info(&self, message: &str);

    fn show_permission_prompt(&self, tool_name: &str, input: &serde_json::Value);
    /// Re-shown in place after an unrecognized permission answer.
    fn show_permission_retry(&self);
    fn show_permission_result(&self, tool_name: &str, decision: &PermissionDecision);

    fn show_session_init(&self, model: &str, tools: &[String], servers: &[String]);
    fn show_help(&self);
    fn clear(&self);
}
