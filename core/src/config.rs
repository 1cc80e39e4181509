//! Configuration management
//!
//! YAML configuration resolved from the platform config directory, with
//! defaults for every field so a missing file still yields a usable setup.
//! The configuration is validated before any of it reaches the session
//! core; the core trusts its shape afterwards.

use crate::error::{Result, TetherError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
const CONFIG_FILE_NAME: &str = "tether.yaml";

/// Default config directory name
const CONFIG_DIR_NAME: &str = "tether";

/// How tool-permission checks are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionMode {
    /// Prompt the user for every tool not already allowed
    #[default]
    Ask,
    /// Allow every tool without prompting
    AcceptAll,
    /// Deny every tool not explicitly allowed
    DenyAll,
}

/// Presentation settings consumed by the renderer at construction time.
/// Passed by value so no process-wide style tables exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub color: bool,
    #[serde(default = "default_prompt_symbol")]
    pub prompt_symbol: String,
    #[serde(default = "default_continuation_symbol")]
    pub continuation_symbol: String,
    /// Show token/cost figures after each turn
    #[serde(default = "default_true")]
    pub show_turn_stats: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            color: true,
            prompt_symbol: default_prompt_symbol(),
            continuation_symbol: default_continuation_symbol(),
            show_turn_stats: true,
        }
    }
}

/// How to reach the remote agent: a command spawned with JSON-lines stdio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_agent_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: default_agent_command(),
            args: Vec::new(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model identifier forwarded to the agent on session start
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum number of user turns before the session ends (None = unlimited)
    #[serde(default)]
    pub max_turns: Option<usize>,

    #[serde(default)]
    pub permission_mode: PermissionMode,

    /// Working directory announced to the agent
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Tools that never require a permission prompt
    #[serde(default)]
    pub allowed_tools: Vec<String>,

    /// Tools that are always denied, prompt or not
    #[serde(default)]
    pub disallowed_tools: Vec<String>,

    /// Prefix attached to interrupt text spliced into a live turn. The
    /// remote side may or may not treat it as meaningful; it is visible
    /// text either way, so it stays configurable.
    #[serde(default = "default_interrupt_marker")]
    pub interrupt_marker: String,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_turns: None,
            permission_mode: PermissionMode::Ask,
            working_dir: None,
            allowed_tools: Vec::new(),
            disallowed_tools: Vec::new(),
            interrupt_marker: default_interrupt_marker(),
            agent: AgentConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_prompt_symbol() -> String {
    "❯".to_string()
}

fn default_continuation_symbol() -> String {
    "…".to_string()
}

fn default_model() -> String {
    "default".to_string()
}

fn default_agent_command() -> String {
    "tether-agent".to_string()
}

fn default_interrupt_marker() -> String {
    "[user interjection]".to_string()
}

impl Config {
    /// Resolve the default config file path under the platform config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Resolve the data directory used for logs.
    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join(CONFIG_DIR_NAME))
    }

    /// Load configuration from `path`, or from the default location when
    /// `path` is None. A missing file yields defaults; a present but
    /// malformed file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let resolved = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };

        let config = match resolved {
            Some(p) if p.exists() => {
                let raw = fs::read_to_string(&p)?;
                serde_yml::from_str(&raw).map_err(|e| TetherError::InvalidConfig {
                    message: format!("{}: {}", p.display(), e),
                })?
            }
            _ => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the session core must never see.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(TetherError::InvalidConfig {
                message: "model must not be empty".to_string(),
            });
        }
        if self.agent.command.trim().is_empty() {
            return Err(TetherError::MissingConfig {
                key: "agent.command".to_string(),
            });
        }
        if let Some(0) = self.max_turns {
            return Err(TetherError::InvalidConfig {
                message: "max_turns must be at least 1 when set".to_string(),
            });
        }
        if let Some(dir) = &self.working_dir {
            if !dir.is_dir() {
                return Err(TetherError::InvalidConfig {
                    message: format!("working_dir does not exist: {}", dir.display()),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.permission_mode, PermissionMode::Ask);
        assert!(config.ui.color);
    }

    #[test]
    fn parses_partial_yaml() {
        let yaml = r#"
model: sonnet-large
max_turns: 10
permission_mode: accept-all
allowed_tools: ["read_file"]
agent:
  command: my-agent
  args: ["--serve"]
ui:
  color: false
"#;
        let config: Config = serde_yml::from_str(yaml).expect("parse");
        assert_eq!(config.model, "sonnet-large");
        assert_eq!(config.max_turns, Some(10));
        assert_eq!(config.permission_mode, PermissionMode::AcceptAll);
        assert_eq!(config.agent.args, vec!["--serve".to_string()]);
        assert!(!config.ui.color);
        // Untouched fields fall back to defaults
        assert_eq!(config.interrupt_marker, default_interrupt_marker());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_empty_model_and_zero_turns() {
        let mut config = Config {
            model: "  ".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        config.model = "ok".to_string();
        config.max_turns = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file_and_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tether.yaml");
        std::fs::write(&path, "model: test-model\n").expect("write");

        let config = Config::load(Some(&path)).expect("load");
        assert_eq!(config.model, "test-model");

        let missing = dir.path().join("nope.yaml");
        let config = Config::load(Some(&missing)).expect("defaults");
        assert_eq!(config.model, default_model());
    }
}
