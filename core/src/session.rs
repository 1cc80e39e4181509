//! Session orchestrator
//!
//! Runs one user turn end-to-end and repeats: `Idle → Streaming → Idle`.
//! While a turn streams, the orchestrator is the only component touching
//! both the input layer and the outbound bridge, splicing captured
//! interrupts into the live turn in capture order. Cleanup (capture off,
//! `end_stream`) runs on every exit path of a turn.

use crate::agent::{
    AgentClient, AgentEvent, OutboundStream, PermissionContext, PermissionDecision,
    PermissionHandler, UserMessage,
};
use crate::bridge::MessageBridge;
use crate::config::{Config, PermissionMode};
use crate::error::Result;
use crate::input::{InputEvent, InputHandler, PermissionAnswer};
use crate::render::Renderer;
use crate::{debug_log, error_log};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::Notify;

/// Per-process session state.
#[derive(Debug, Default)]
pub struct SessionState {
    /// True only between submitting a turn's prompt and its terminal event
    pub is_streaming: bool,
    /// Interrupt text left over after a turn ended; seeds the next turn
    pub pending_interrupt: Option<String>,
    pub turn_count: u64,
}

/// Cumulative usage figures, fed by turn-result events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub turns: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
    pub duration_ms: u64,
}

pub struct Session {
    config: Config,
    client: Arc<dyn AgentClient>,
    renderer: Arc<dyn Renderer>,
    input: InputHandler,
    state: SessionState,
    stats: SessionStats,
}

impl Session {
    pub fn new(
        config: Config,
        client: Arc<dyn AgentClient>,
        renderer: Arc<dyn Renderer>,
        input: InputHandler,
    ) -> Self {
        Self {
            config,
            client,
            renderer,
            input,
            state: SessionState::default(),
            stats: SessionStats::default(),
        }
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// The outer loop: one iteration per input event, until Exit.
    pub async fn run(&mut self) -> Result<()> {
        self.renderer.show_welcome(&self.config.model);

        loop {
            if let Some(limit) = self.config.max_turns {
                if self.state.turn_count >= limit as u64 {
                    self.renderer
                        .show_info("Turn limit reached; ending session.");
                    break;
                }
            }

            let event = match self.state.pending_interrupt.take() {
                // Text captured too late for the previous turn starts the next one
                Some(text) => InputEvent::Interrupt(text),
                None => {
                    self.renderer.show_prompt();
                    self.input.next_event().await
                }
            };

            match event {
                InputEvent::Prompt(text) | InputEvent::Interrupt(text) => {
                    self.run_turn(text).await;
                }
                InputEvent::Command(cmd) => {
                    if !self.handle_command(&cmd) {
                        break;
                    }
                }
                InputEvent::Exit => break,
            }
        }

        self.input.close();
        Ok(())
    }

    /// One full turn: seed the bridge with the prompt, drain inbound
    /// events, splice interrupts, clean up unconditionally.
    async fn run_turn(&mut self, prompt: String) {
        self.state.is_streaming = true;
        self.state.turn_count += 1;
        self.input.enable_capture();

        // The callback is a wakeup hint; the queue poll below is the
        // source of truth, so a missed notification cannot lose text.
        let notify = Arc::new(Notify::new());
        let waker = notify.clone();
        self.input.set_interrupt_callback(move |_| waker.notify_one());

        let bridge = MessageBridge::new();
        debug_log!("turn {} started", self.state.turn_count);
        bridge.enqueue(UserMessage::prompt(prompt));

        let permissions: Arc<dyn PermissionHandler> = Arc::new(SessionPermissions {
            input: self.input.clone(),
            renderer: self.renderer.clone(),
            mode: self.config.permission_mode,
            allowed: self.config.allowed_tools.clone(),
            disallowed: self.config.disallowed_tools.clone(),
        });

        let result = self.stream_turn(&bridge, &notify, permissions).await;

        // Cleanup runs on success and failure alike
        self.state.is_streaming = false;
        self.input.disable_capture();
        self.input.clear_interrupt_callback();
        bridge.end_stream();

        if let Err(e) = result {
            error_log!("turn {} failed: {}", self.state.turn_count, e);
            self.renderer.show_error(&e.user_message());
        }

        // Anything still queued arrived after the terminal event; it seeds
        // the next turn rather than being dropped.
        let leftovers = self.input.drain_interrupts();
        if !leftovers.is_empty() {
            self.state.pending_interrupt = Some(leftovers.join("\n"));
        }
        debug_log!("turn {} finished", self.state.turn_count);
    }

    async fn stream_turn(
        &mut self,
        bridge: &MessageBridge,
        notify: &Notify,
        permissions: Arc<dyn PermissionHandler>,
    ) -> Result<()> {
        let outbound: OutboundStream = Box::pin(bridge.clone().into_stream());
        let mut inbound = self.client.query(outbound, permissions).await?;

        loop {
            tokio::select! {
                event = inbound.next() => match event {
                    Some(Ok(event)) => {
                        let terminal = event.is_terminal();
                        self.dispatch_event(event);
                        self.splice_interrupts(bridge);
                        if terminal {
                            return Ok(());
                        }
                    }
                    Some(Err(e)) => return Err(e),
                    // Stream ended without a turn result: still a turn end
                    None => return Ok(()),
                },
                _ = notify.notified() => self.splice_interrupts(bridge),
            }
        }
    }

    fn dispatch_event(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::SystemInit {
                model,
                tools,
                servers,
            } => self.renderer.show_session_init(&model, &tools, &servers),
            AgentEvent::TextDelta { text } => self.renderer.stream_token(&text),
            AgentEvent::ToolStart { name, input } => {
                self.renderer.show_tool_start(&name, &input)
            }
            AgentEvent::ToolComplete { name } => self.renderer.show_tool_complete(&name),
            AgentEvent::UserEcho { text } => self.renderer.show_info(&text),
            AgentEvent::TurnResult {
                duration_ms,
                input_tokens,
                output_tokens,
                cost_usd,
            } => {
                self.renderer.complete_stream();
                self.stats.turns += 1;
                self.stats.input_tokens += input_tokens;
                self.stats.output_tokens += output_tokens;
                self.stats.cost_usd += cost_usd.unwrap_or(0.0);
                self.stats.duration_ms += duration_ms;
                if self.config.ui.show_turn_stats {
                    let turn = SessionStats {
                        turns: 1,
                        input_tokens,
                        output_tokens,
                        cost_usd: cost_usd.unwrap_or(0.0),
                        duration_ms,
                    };
                    self.renderer.show_stats(&turn);
                }
            }
        }
    }

    /// Pull captured interrupts in order and splice them onto the live
    /// outbound stream, tagged with the configured marker.
    fn splice_interrupts(&self, bridge: &MessageBridge) {
        while let Some(text) = self.input.pop_interrupt() {
            self.renderer
                .show_info(&format!("Added to the current turn: {}", text));
            let tagged = format!("{} {}", self.config.interrupt_marker, text);
            bridge.enqueue(UserMessage::interjection(tagged));
        }
    }

    /// Slash commands run synchronously against the renderer and never
    /// touch the outbound bridge. Returns false to end the session.
    fn handle_command(&mut self, cmd: &str) -> bool {
        let parts: Vec<&str> = cmd.split_whitespace().collect();
        let name = parts.first().copied().unwrap_or("");

        match name {
            "help" => self.renderer.show_help(),
            "clear" => self.renderer.clear(),
            "exit" | "quit" => return false,
            "stats" => self.renderer.show_stats(&self.stats),
            "history" => {
                let items = self.input.recent_history(20);
                if items.is_empty() {
                    self.renderer.show_info("No history yet.");
                } else {
                    let listing = items
                        .iter()
                        .enumerate()
                        .map(|(i, line)| format!("{:>3}  {}", i + 1, line))
                        .collect::<Vec<_>>()
                        .join("\n");
                    self.renderer.show_info(&listing);
                }
            }
            "logs" => {
                let n = parts
                    .get(1)
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(20);
                let lines = crate::logger::get_recent_logs(n);
                if lines.is_empty() {
                    self.renderer.show_info("No logs recorded.");
                } else {
                    self.renderer.show_info(&lines.join("\n"));
                }
            }
            "" => self.renderer.show_warning("Empty command. Try /help."),
            other => self
                .renderer
                .show_warning(&format!("Unknown command: /{}. Try /help.", other)),
        }
        true
    }
}

/// Wires the remote call's permission checks to the input machine and the
/// renderer, honoring the configured mode and tool lists.
struct SessionPermissions {
    input: InputHandler,
    renderer: Arc<dyn Renderer>,
    mode: PermissionMode,
    allowed: Vec<String>,
    disallowed: Vec<String>,
}

#[async_trait::async_trait]
impl PermissionHandler for SessionPermissions {
    async fn check(
        &self,
        tool_name: &str,
        input: &serde_json::Value,
        ctx: &PermissionContext,
    ) -> PermissionDecision {
        if self.disallowed.iter().any(|t| t == tool_name) {
            let decision = PermissionDecision::Deny {
                message: format!("Tool '{}' is disallowed by configuration", tool_name),
            };
            self.renderer.show_permission_result(tool_name, &decision);
            return decision;
        }

        let pre_allowed = self.allowed.iter().any(|t| t == tool_name);
        if pre_allowed || self.mode == PermissionMode::AcceptAll {
            return PermissionDecision::allow_once();
        }

        if self.mode == PermissionMode::DenyAll {
            let decision = PermissionDecision::Deny {
                message: "Permission mode denies all tools".to_string(),
            };
            self.renderer.show_permission_result(tool_name, &decision);
            return decision;
        }

        if let Some(description) = &ctx.description {
            self.renderer.show_info(description);
        }
        self.renderer.show_permission_prompt(tool_name, input);

        let decision = match self.input.ask_permission().await {
            Some(PermissionAnswer::AllowOnce) => PermissionDecision::allow_once(),
            Some(PermissionAnswer::AllowAlways) => PermissionDecision::Allow {
                always: true,
                updated_rules: vec![tool_name.to_string()],
            },
            Some(PermissionAnswer::Deny) | None => PermissionDecision::Deny {
                message: "User denied the tool request".to_string(),
            },
        };
        self.renderer.show_permission_result(tool_name, &decision);
        decision
    }
}
