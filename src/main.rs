//! `tether` - an interactive terminal front-end for a remote streaming agent
//!
//! This binary wires the session core to a real terminal and a spawned
//! agent process: raw-mode input driving the input state machine, a
//! console renderer, and a JSON-lines stdio transport.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use crate::cli::Cli;
use tether_core::config::Config;
use tether_core::input::InputHandler;
use tether_core::session::Session;

mod agent_proc;
mod cli;
mod render;
mod terminal;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // CLI flags override the file
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(cmd) = cli.agent_cmd {
        let mut parts = shell_words::split(&cmd)
            .map_err(|e| anyhow::anyhow!("invalid --agent-cmd: {}", e))?;
        if parts.is_empty() {
            anyhow::bail!("--agent-cmd must name a command");
        }
        config.agent.command = parts.remove(0);
        config.agent.args = parts;
    }
    if let Some(mode) = cli.permission_mode {
        config.permission_mode = mode.into();
    }
    if let Some(max_turns) = cli.max_turns {
        config.max_turns = Some(max_turns);
    }
    if cli.no_color {
        config.ui.color = false;
    }
    config.validate().context("Invalid configuration")?;

    if let Some(data_dir) = Config::data_dir() {
        tether_core::logger::init(data_dir);
    }

    let renderer = Arc::new(render::ConsoleRenderer::new(&config.ui));
    let client = Arc::new(agent_proc::ProcessAgentClient::new(&config));
    let input = InputHandler::new();

    let driver = terminal::TerminalDriver::new(
        input.clone(),
        renderer.clone(),
        config.ui.prompt_symbol.clone(),
        config.ui.continuation_symbol.clone(),
    );
    let driver_handle = tokio::spawn(driver.run());

    let mut session = Session::new(config, client, renderer, input.clone());
    let result = session.run().await;

    // The session closed the input handler; the driver observes it and stops
    input.close();
    let _ = driver_handle.await;

    result.context("Session ended with an error")
}
