//! Subprocess agent transport
//!
//! Speaks JSON-lines over the stdio of a spawned agent process, one
//! process per turn. Outbound messages and permission responses go to
//! the child's stdin; typed events come back on stdout, one JSON object
//! per line. stderr is drained into the debug log.
//!
//! Permission requests are answered inline: they never surface as
//! session events. Unknown event types are logged and skipped so a newer
//! agent does not break an older front-end.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tether_core::agent::{
    AgentClient, AgentEvent, InboundStream, OutboundStream, PermissionContext,
    PermissionDecision, PermissionHandler,
};
use tether_core::config::Config;
use tether_core::error::{Result, TetherError};
use tether_core::{debug_log, error_log};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};
use tokio::sync::Mutex;

/// Lines written to the child's stdin.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireOut<'a> {
    /// Handshake, first line of every turn
    Start {
        model: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        working_dir: Option<&'a PathBuf>,
    },
    UserMessage {
        text: &'a str,
        injected: bool,
    },
    PermissionResponse {
        id: Option<&'a str>,
        behavior: &'a str,
        always: bool,
        updated_rules: &'a [String],
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<&'a str>,
    },
    /// The outbound stream ended; no further user input this turn
    EndTurn,
}

/// Lines read from the child's stdout.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireIn {
    SystemInit {
        model: String,
        #[serde(default)]
        tools: Vec<String>,
        #[serde(default)]
        servers: Vec<String>,
    },
    TextDelta {
        text: String,
    },
    ToolStart {
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    ToolComplete {
        name: String,
    },
    UserEcho {
        text: String,
    },
    TurnResult {
        #[serde(default)]
        duration_ms: u64,
        #[serde(default)]
        input_tokens: u64,
        #[serde(default)]
        output_tokens: u64,
        #[serde(default)]
        cost_usd: Option<f64>,
    },
    PermissionRequest {
        #[serde(default)]
        id: Option<String>,
        tool: String,
        #[serde(default)]
        input: serde_json::Value,
        #[serde(default)]
        description: Option<String>,
    },
    Error {
        message: String,
    },
}

impl WireIn {
    fn into_event(self) -> Option<AgentEvent> {
        match self {
            Self::SystemInit {
                model,
                tools,
                servers,
            } => Some(AgentEvent::SystemInit {
                model,
                tools,
                servers,
            }),
            Self::TextDelta { text } => Some(AgentEvent::TextDelta { text }),
            Self::ToolStart { name, input } => Some(AgentEvent::ToolStart { name, input }),
            Self::ToolComplete { name } => Some(AgentEvent::ToolComplete { name }),
            Self::UserEcho { text } => Some(AgentEvent::UserEcho { text }),
            Self::TurnResult {
                duration_ms,
                input_tokens,
                output_tokens,
                cost_usd,
            } => Some(AgentEvent::TurnResult {
                duration_ms,
                input_tokens,
                output_tokens,
                cost_usd,
            }),
            Self::PermissionRequest { .. } | Self::Error { .. } => None,
        }
    }
}

async fn write_line(stdin: &Mutex<ChildStdin>, value: &WireOut<'_>) -> Result<()> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    let mut guard = stdin.lock().await;
    guard.write_all(line.as_bytes()).await?;
    guard.flush().await?;
    Ok(())
}

pub struct ProcessAgentClient {
    command: String,
    args: Vec<String>,
    model: String,
    working_dir: Option<PathBuf>,
}

impl ProcessAgentClient {
    pub fn new(config: &Config) -> Self {
        Self {
            command: config.agent.command.clone(),
            args: config.agent.args.clone(),
            model: config.model.clone(),
            working_dir: config.working_dir.clone(),
        }
    }
}

#[async_trait::async_trait]
impl AgentClient for ProcessAgentClient {
    async fn query(
        &self,
        mut outbound: OutboundStream,
        permissions: Arc<dyn PermissionHandler>,
    ) -> Result<InboundStream> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TetherError::AgentUnavailable {
                message: format!("failed to spawn '{}': {}", self.command, e),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| TetherError::Internal {
            message: "child stdin not captured".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| TetherError::Internal {
            message: "child stdout not captured".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| TetherError::Internal {
            message: "child stderr not captured".to_string(),
        })?;

        let stdin = Arc::new(Mutex::new(stdin));

        write_line(
            &stdin,
            &WireOut::Start {
                model: &self.model,
                working_dir: self.working_dir.as_ref(),
            },
        )
        .await?;

        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug_log!("agent stderr: {}", line);
            }
        });

        // Forward the pull-based outbound stream into the child's stdin
        let writer = stdin.clone();
        tokio::spawn(async move {
            while let Some(message) = outbound.next().await {
                let out = WireOut::UserMessage {
                    text: &message.text,
                    injected: message.injected,
                };
                if let Err(e) = write_line(&writer, &out).await {
                    error_log!("outbound write failed: {}", e);
                    return;
                }
            }
            let _ = write_line(&writer, &WireOut::EndTurn).await;
        });

        let stream = async_stream::stream! {
            // Moved in so the process lives exactly as long as the stream
            let _child = child;
            let mut lines = BufReader::new(stdout).lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(TetherError::StreamDisconnected {
                            reason: e.to_string(),
                        });
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                let wire: WireIn = match serde_json::from_str(&line) {
                    Ok(wire) => wire,
                    Err(e) => {
                        debug_log!("skipping unparseable agent line: {}", e);
                        continue;
                    }
                };

                match wire {
                    WireIn::PermissionRequest {
                        id,
                        tool,
                        input,
                        description,
                    } => {
                        let ctx = PermissionContext {
                            tool_use_id: id.clone(),
                            description,
                        };
                        let decision = permissions.check(&tool, &input, &ctx).await;
                        let response = match &decision {
                            PermissionDecision::Allow {
                                always,
                                updated_rules,
                            } => WireOut::PermissionResponse {
                                id: id.as_deref(),
                                behavior: "allow",
                                always: *always,
                                updated_rules,
                                message: None,
                            },
                            PermissionDecision::Deny { message } => {
                                WireOut::PermissionResponse {
                                    id: id.as_deref(),
                                    behavior: "deny",
                                    always: false,
                                    updated_rules: &[],
                                    message: Some(message.as_str()),
                                }
                            }
                        };
                        if let Err(e) = write_line(&stdin, &response).await {
                            yield Err(TetherError::StreamDisconnected {
                                reason: format!("permission response write failed: {}", e),
                            });
                            break;
                        }
                    }
                    WireIn::Error { message } => {
                        yield Err(TetherError::AgentError { message });
                        break;
                    }
                    other => {
                        if let Some(event) = other.into_event() {
                            let terminal = event.is_terminal();
                            yield Ok(event);
                            if terminal {
                                break;
                            }
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
