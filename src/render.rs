//! Console renderer
//!
//! Formats session output with `console` styles. Styles are built once
//! from the UI configuration; nothing here is process-global. Raw-mode
//! output uses `\r\n` so lines stay aligned while the terminal driver
//! holds raw mode.

use console::Style;
use std::io::Write;
use tether_core::agent::PermissionDecision;
use tether_core::config::UiConfig;
use tether_core::render::Renderer;
use tether_core::session::SessionStats;

pub struct ConsoleRenderer {
    prompt_symbol: String,
    continuation_symbol: String,
    blue: Style,
    green: Style,
    yellow: Style,
    red: Style,
    dim: Style,
    bold: Style,
}

impl ConsoleRenderer {
    pub fn new(ui: &UiConfig) -> Self {
        let style = |s: Style| if ui.color { s } else { Style::new() };
        Self {
            prompt_symbol: ui.prompt_symbol.clone(),
            continuation_symbol: ui.continuation_symbol.clone(),
            blue: style(Style::new().blue()),
            green: style(Style::new().green()),
            yellow: style(Style::new().yellow()),
            red: style(Style::new().red()),
            dim: style(Style::new().dim()),
            bold: style(Style::new().bold()),
        }
    }

    fn line(&self, text: &str) {
        // Raw mode leaves the cursor column where it was on plain '\n'
        print!("\r{}\r\n", text);
        let _ = std::io::stdout().flush();
    }
}

impl Renderer for ConsoleRenderer {
    fn show_welcome(&self, model: &str) {
        self.line(&format!(
            "{} v{} — model {}",
            self.bold.apply_to("tether"),
            env!("CARGO_PKG_VERSION"),
            self.green.apply_to(model)
        ));
        self.line(&format!(
            "{}",
            self.dim
                .apply_to("Type a prompt, /help for commands, Ctrl+C twice to exit.")
        ));
    }

    fn show_prompt(&self) {
        print!("\r{} ", self.blue.apply_to(&self.prompt_symbol));
        let _ = std::io::stdout().flush();
    }

    fn show_continuation_prompt(&self) {
        print!("\r{} ", self.dim.apply_to(&self.continuation_symbol));
        let _ = std::io::stdout().flush();
    }

    fn stream_token(&self, token: &str) {
        // Tokens may contain newlines; normalize for raw mode
        print!("{}", token.replace('\n', "\r\n"));
        let _ = std::io::stdout().flush();
    }

    fn complete_stream(&self) {
        self.line("");
    }

    fn show_tool_start(&self, name: &str, input: &serde_json::Value) {
        let summary = serde_json::to_string(input).unwrap_or_default();
        let summary = if summary.chars().count() > 120 {
            let cut: String = summary.chars().take(120).collect();
            format!("{}…", cut)
        } else {
            summary
        };
        self.line(&format!(
            "{} {} {}",
            self.yellow.apply_to("⚙"),
            self.bold.apply_to(name),
            self.dim.apply_to(summary)
        ));
    }

    fn show_tool_complete(&self, name: &str) {
        self.line(&format!(
            "{} {} done",
            self.green.apply_to("✔"),
            self.bold.apply_to(name)
        ));
    }

    fn show_stats(&self, stats: &SessionStats) {
        self.line(&format!(
            "{}",
            self.dim.apply_to(format!(
                "turns: {} | tokens: {} in / {} out | cost: ${:.4} | {}ms",
                stats.turns,
                stats.input_tokens,
                stats.output_tokens,
                stats.cost_usd,
                stats.duration_ms
            ))
        ));
    }

    fn show_error(&self, message: &str) {
        self.line(&format!("{} {}", self.red.apply_to("✖"), message));
    }

    fn show_warning(&self, message: &str) {
        self.line(&format!("{} {}", self.yellow.apply_to("⚠"), message));
    }

    fn show_info(&self, message: &str) {
        for part in message.lines() {
            self.line(&format!("{}", self.dim.apply_to(part)));
        }
    }

    fn show_permission_prompt(&self, tool_name: &str, input: &serde_json::Value) {
        self.line(&format!(
            "{} The agent wants to run {}",
            self.yellow.apply_to("?"),
            self.bold.apply_to(tool_name)
        ));
        if let Ok(pretty) = serde_json::to_string_pretty(input) {
            for part in pretty.lines() {
                self.line(&format!("  {}", self.dim.apply_to(part)));
            }
        }
        self.line(&format!(
            "{}",
            self.yellow
                .apply_to("Allow? [y]es / [n]o / [a]lways allow")
        ));
        print!("\r{} ", self.yellow.apply_to(">"));
        let _ = std::io::stdout().flush();
    }

    fn show_permission_retry(&self) {
        self.line(&format!(
            "{}",
            self.yellow
                .apply_to("Please answer y, n, or a (always allow).")
        ));
        print!("\r{} ", self.yellow.apply_to(">"));
        let _ = std::io::stdout().flush();
    }

    fn show_permission_result(&self, tool_name: &str, decision: &PermissionDecision) {
        match decision {
            PermissionDecision::Allow { always, .. } => {
                let suffix = if *always { " (always)" } else { "" };
                self.line(&format!(
                    "{} {} allowed{}",
                    self.green.apply_to("✔"),
                    tool_name,
                    suffix
                ));
            }
            PermissionDecision::Deny { message } => {
                self.line(&format!(
                    "{} {} denied: {}",
                    self.red.apply_to("✖"),
                    tool_name,
                    message
                ));
            }
        }
    }

    fn show_session_init(&self, model: &str, tools: &[String], servers: &[String]) {
        self.line(&format!(
            "{} connected — model {}, {} tools, {} servers",
            self.green.apply_to("●"),
            self.bold.apply_to(model),
            tools.len(),
            servers.len()
        ));
    }

    fn show_help(&self) {
        self.line(&format!("{}", self.bold.apply_to("Commands:")));
        for (cmd, what) in [
            ("/help", "show this help"),
            ("/clear", "clear the screen"),
            ("/stats", "cumulative session usage"),
            ("/history", "recent submitted inputs"),
            ("/logs [n]", "recent debug log lines"),
            ("/exit, /quit", "end the session"),
        ] {
            self.line(&format!(
                "  {:<14} {}",
                self.green.apply_to(cmd),
                self.dim.apply_to(what)
            ));
        }
        self.line(&format!(
            "  {}",
            self.dim.apply_to(
                "End a line with \\ or press Alt+Enter to continue on the next line."
            )
        ));
        self.line(&format!(
            "  {}",
            self.dim.apply_to(
                "While the agent is working, anything you type is added to the live turn."
            )
        ));
    }

    fn clear(&self) {
        print!("\x1b[2J\x1b[H");
        let _ = std::io::stdout().flush();
    }
}
