//! CLI argument parsing using clap 4.x derive macros

use clap::Parser;
use std::path::PathBuf;
use tether_core::config::PermissionMode;

/// An interactive terminal front-end for a remote streaming agent
///
/// Holds a turn-based conversation with a tool-using agent over a
/// bidirectional stream, and lets you type more context into a turn
/// while the agent is still working on it.
#[derive(Parser, Debug)]
#[command(name = "tether")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file (defaults to the platform config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Model identifier forwarded to the agent (overrides config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Agent command to spawn, parsed shell-style ("my-agent --serve")
    #[arg(long, value_name = "CMD")]
    pub agent_cmd: Option<String>,

    /// How tool-permission checks are answered
    #[arg(long, value_enum)]
    pub permission_mode: Option<PermissionModeArg>,

    /// Maximum number of user turns before the session ends
    #[arg(long)]
    pub max_turns: Option<usize>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// clap-facing mirror of [`PermissionMode`]; the config type stays free of
/// clap derives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PermissionModeArg {
    Ask,
    AcceptAll,
    DenyAll,
}

impl From<PermissionModeArg> for PermissionMode {
    fn from(arg: PermissionModeArg) -> Self {
        match arg {
            PermissionModeArg::Ask => PermissionMode::Ask,
            PermissionModeArg::AcceptAll => PermissionMode::AcceptAll,
            PermissionModeArg::DenyAll => PermissionMode::DenyAll,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides() {
        let cli = Cli::parse_from([
            "tether",
            "--model",
            "sonnet-large",
            "--agent-cmd",
            "my-agent --serve",
            "--permission-mode",
            "accept-all",
            "--max-turns",
            "5",
            "--no-color",
        ]);
        assert_eq!(cli.model.as_deref(), Some("sonnet-large"));
        assert_eq!(cli.agent_cmd.as_deref(), Some("my-agent --serve"));
        assert_eq!(cli.permission_mode, Some(PermissionModeArg::AcceptAll));
        assert_eq!(cli.max_turns, Some(5));
        assert!(cli.no_color);
    }

    #[test]
    fn defaults_are_all_none() {
        let cli = Cli::parse_from(["tether"]);
        assert!(cli.config.is_none());
        assert!(cli.model.is_none());
        assert!(!cli.no_color);
    }
}
