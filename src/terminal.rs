//! Terminal driver
//!
//! Feeds the input state machine from the real terminal. Two modes:
//! raw keystrokes when stdin is a TTY (crossterm events pumped from a
//! blocking thread), and a plain line reader otherwise so the binary
//! stays scriptable. Raw mode is held for the whole session via an RAII
//! guard; cleanup is best-effort on drop.

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io::{IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tether_core::input::{CancelOutcome, InputHandler, LineDisposition};
use tether_core::render::Renderer;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

/// RAII guard that ensures terminal cleanup on drop
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn new() -> Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::event::EnableBracketedPaste
        )?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Best-effort cleanup, suppress all errors
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::DisableBracketedPaste,
            crossterm::cursor::Show
        );
    }
}

pub struct TerminalDriver {
    input: InputHandler,
    renderer: Arc<dyn Renderer>,
    prompt_symbol: String,
    continuation_symbol: String,
}

impl TerminalDriver {
    pub fn new(
        input: InputHandler,
        renderer: Arc<dyn Renderer>,
        prompt_symbol: String,
        continuation_symbol: String,
    ) -> Self {
        Self {
            input,
            renderer,
            prompt_symbol,
            continuation_symbol,
        }
    }

    /// Drive the input machine until the session closes.
    pub async fn run(self) -> Result<()> {
        if std::io::stdin().is_terminal() {
            self.run_raw().await
        } else {
            self.run_lines().await
        }
    }

    async fn run_raw(self) -> Result<()> {
        let _guard = RawModeGuard::new()?;

        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let stop = Arc::new(AtomicBool::new(false));
        let pump_stop = stop.clone();
        tokio::task::spawn_blocking(move || {
            while !pump_stop.load(Ordering::Relaxed) {
                match crossterm::event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        if let Ok(event) = crossterm::event::read() {
                            if tx.send(event).is_err() {
                                break;
                            }
                        }
                    }
                    Ok(false) => {}
                    Err(_) => break,
                }
            }
        });

        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        if !self.handle_key(key) {
                            break;
                        }
                    }
                    Some(Event::Paste(text)) => {
                        self.input.insert_str(&text);
                        self.repaint();
                    }
                    Some(_) => {}
                    None => break,
                },
                // The session ends on /exit or the turn limit without any
                // further keystroke; don't sit in recv() waiting for one.
                _ = self.input.closed() => break,
            }
            if self.input.is_closed() {
                break;
            }
        }

        stop.store(true, Ordering::Relaxed);
        self.input.close();
        Ok(())
    }

    /// One keystroke. Returns false when the driver should stop.
    fn handle_key(&self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Char('c') if ctrl => match self.input.cancel_key() {
                CancelOutcome::ClearedMultiline => {
                    self.renderer.show_info("Multiline input discarded.");
                    self.renderer.show_prompt();
                }
                CancelOutcome::InterruptFlushed => self.repaint(),
                CancelOutcome::Warned => {
                    self.renderer
                        .show_warning("Press Ctrl+C again within 2s to exit.");
                    self.repaint();
                }
                CancelOutcome::Exit => return false,
            },
            KeyCode::Char('d') if ctrl => {
                self.input.close();
                return false;
            }
            KeyCode::Char('u') if ctrl => {
                self.input.kill_to_start();
                self.repaint();
            }
            KeyCode::Char('k') if ctrl => {
                self.input.kill_to_end();
                self.repaint();
            }
            KeyCode::Char('j') if ctrl => self.start_continuation(),
            KeyCode::Enter if alt => self.start_continuation(),
            KeyCode::Enter => {
                print!("\r\n");
                let _ = std::io::stdout().flush();
                match self.input.submit_current_line() {
                    LineDisposition::Continuation => self.renderer.show_continuation_prompt(),
                    LineDisposition::PermissionRetry => self.renderer.show_permission_retry(),
                    LineDisposition::Ignored | LineDisposition::Skipped => {
                        if !self.input.is_capturing() && !self.input.awaiting_permission() {
                            self.renderer.show_prompt();
                        }
                    }
                    LineDisposition::Resolved
                    | LineDisposition::InterruptQueued
                    | LineDisposition::PermissionAnswered => {}
                }
            }
            KeyCode::Backspace => {
                self.input.backspace();
                self.repaint();
            }
            KeyCode::Delete => {
                self.input.delete_at_cursor();
                self.repaint();
            }
            KeyCode::Left => {
                self.input.move_left();
                self.repaint();
            }
            KeyCode::Right => {
                self.input.move_right();
                self.repaint();
            }
            KeyCode::Home => {
                self.input.move_home();
                self.repaint();
            }
            KeyCode::End => {
                self.input.move_end();
                self.repaint();
            }
            KeyCode::Up => {
                self.input.history_prev();
                self.repaint();
            }
            KeyCode::Down => {
                self.input.history_next();
                self.repaint();
            }
            KeyCode::Char(c) if !ctrl => {
                self.input.insert_char(c);
                self.repaint();
            }
            _ => {}
        }
        true
    }

    fn start_continuation(&self) {
        print!("\r\n");
        let _ = std::io::stdout().flush();
        self.input.newline_key_direct();
        self.renderer.show_continuation_prompt();
    }

    /// Redraw the composer line in place and restore the cursor column.
    fn repaint(&self) {
        let (line, cursor) = self.input.line_snapshot();
        let symbol = if self.input.multiline_active() {
            &self.continuation_symbol
        } else {
            &self.prompt_symbol
        };
        print!("\r\x1b[2K{} {}", symbol, line);
        let tail = line.chars().count().saturating_sub(cursor);
        if tail > 0 {
            print!("\x1b[{}D", tail);
        }
        let _ = std::io::stdout().flush();
    }

    /// Line-based fallback for pipes and scripts. The terminal echoes
    /// input itself; only dispositions that need feedback print anything.
    async fn run_lines(self) -> Result<()> {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => match self.input.submit_line(&line) {
                        LineDisposition::Continuation => {
                            self.renderer.show_continuation_prompt()
                        }
                        LineDisposition::PermissionRetry => {
                            self.renderer.show_permission_retry()
                        }
                        _ => {}
                    },
                    None => {
                        self.input.close();
                        break;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    match self.input.cancel_key() {
                        CancelOutcome::Exit => break,
                        CancelOutcome::Warned => self
                            .renderer
                            .show_warning("Press Ctrl+C again within 2s to exit."),
                        _ => {}
                    }
                }
                _ = self.input.closed() => break,
            }
            if self.input.is_closed() {
                break;
            }
        }
        Ok(())
    }
}
