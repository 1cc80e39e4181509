//! Input state machine
//!
//! Converts the raw line/keystroke stream into [`InputEvent`]s and manages
//! three mutually-exclusive interaction sub-modes: normal prompt, multiline
//! composition, and permission response. A pending permission waiter
//! preempts everything else for every incoming line.
//!
//! There are no fatal errors here: unrecognized input is either ignored or
//! re-prompted.

pub mod editor;
pub mod interrupts;

use editor::LineEditor;
use interrupts::InterruptQueue;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, Notify};

/// Submitted inputs kept for recall, oldest evicted past this.
const HISTORY_CAPACITY: usize = 100;

/// Window in which a second cancel press exits the session.
const CANCEL_EXIT_WINDOW: Duration = Duration::from_secs(2);

/// Semantic event produced by the input machine, consumed by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A completed, non-empty, non-command submission
    Prompt(String),
    /// A `/`-prefixed line, lower-cased, prefix stripped
    Command(String),
    /// Text captured while streaming; delivered out-of-band via the
    /// interrupt queue, never through the prompt waiter
    Interrupt(String),
    /// The input source closed while a prompt was pending
    Exit,
}

/// A parsed permission response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionAnswer {
    AllowOnce,
    AllowAlways,
    Deny,
}

/// What `submit_line` did with a line; drives what the terminal shows next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDisposition {
    /// One-shot skip flag consumed (artifact line after the newline key)
    Skipped,
    /// A pending permission waiter was resolved
    PermissionAnswered,
    /// Unrecognized permission answer; re-show the permission prompt
    PermissionRetry,
    /// Line buffered into the multiline composer
    Continuation,
    /// The prompt waiter was resolved with a Prompt or Command
    Resolved,
    /// Captured into the interrupt queue
    InterruptQueued,
    /// Empty submission or nothing awaiting input; idle no-op
    Ignored,
}

/// Outcome of the cancel key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Active multiline buffer discarded
    ClearedMultiline,
    /// Non-empty partial capture flushed as an immediate interrupt
    InterruptFlushed,
    /// First press: warn, arm the exit window
    Warned,
    /// Second press within the window: session exit
    Exit,
}

/// Case-insensitive permission response parsing. `None` means re-prompt.
pub fn parse_permission_response(text: &str) -> Option<PermissionAnswer> {
    match text.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(PermissionAnswer::AllowOnce),
        "n" | "no" => Some(PermissionAnswer::Deny),
        "a" | "always" | "always allow" => Some(PermissionAnswer::AllowAlways),
        _ => None,
    }
}

struct InputState {
    editor: LineEditor,
    prompt_waiter: Option<oneshot::Sender<InputEvent>>,
    permission_waiter: Option<oneshot::Sender<PermissionAnswer>>,
    multiline: Vec<String>,
    multiline_active: bool,
    history: VecDeque<String>,
    hist_cursor: Option<usize>,
    hist_stash: String,
    capturing: bool,
    interrupts: InterruptQueue,
    skip_next_line: bool,
    last_cancel: Option<Instant>,
    closed: bool,
}

impl InputState {
    fn new() -> Self {
        Self {
            editor: LineEditor::new(),
            prompt_waiter: None,
            permission_waiter: None,
            multiline: Vec::new(),
            multiline_active: false,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
            hist_cursor: None,
            hist_stash: String::new(),
            capturing: false,
            interrupts: InterruptQueue::new(),
            skip_next_line: false,
            last_cancel: None,
            closed: false,
        }
    }

    fn push_history(&mut self, text: &str) {
        if self.history.back().map(|s| s.as_str()) == Some(text) {
            return;
        }
        if self.history.len() >= HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(text.to_string());
    }
}

/// Shared handle to the input machine. Cloning is cheap; all clones see the
/// same state. The terminal driver feeds it; the session consumes it.
#[derive(Clone)]
pub struct InputHandler {
    state: Arc<Mutex<InputState>>,
    close_signal: Arc<Notify>,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(InputState::new())),
            close_signal: Arc::new(Notify::new()),
        }
    }

    // =========================================================================
    // Session-facing waiters
    // =========================================================================

    /// Await the next semantic input event. Registers the single prompt
    /// waiter slot; a previously registered waiter (a bug upstream) is
    /// dropped and observes Exit.
    pub async fn next_event(&self) -> InputEvent {
        let rx = {
            let mut st = self.state.lock();
            if st.closed {
                return InputEvent::Exit;
            }
            let (tx, rx) = oneshot::channel();
            st.prompt_waiter = Some(tx);
            rx
        };
        rx.await.unwrap_or(InputEvent::Exit)
    }

    /// Await a permission answer for the current prompt. Returns None only
    /// when the input source closed before the user answered.
    pub async fn ask_permission(&self) -> Option<PermissionAnswer> {
        let rx = {
            let mut st = self.state.lock();
            if st.closed {
                return None;
            }
            let (tx, rx) = oneshot::channel();
            st.permission_waiter = Some(tx);
            rx
        };
        rx.await.ok()
    }

    /// Whether a permission waiter is currently pending.
    pub fn awaiting_permission(&self) -> bool {
        self.state.lock().permission_waiter.is_some()
    }

    // =========================================================================
    // Line dispatch
    // =========================================================================

    /// Dispatch one completed line. Order: permission waiter first, then
    /// continuation handling, then multiline flush, then classification.
    pub fn submit_line(&self, line: &str) -> LineDisposition {
        let mut st = self.state.lock();

        if st.skip_next_line {
            st.skip_next_line = false;
            return LineDisposition::Skipped;
        }

        if st.permission_waiter.is_some() {
            return match parse_permission_response(line) {
                Some(answer) => {
                    if let Some(tx) = st.permission_waiter.take() {
                        let _ = tx.send(answer);
                    }
                    LineDisposition::PermissionAnswered
                }
                None => LineDisposition::PermissionRetry,
            };
        }

        if let Some(stripped) = line.strip_suffix('\\') {
            st.multiline.push(stripped.to_string());
            st.multiline_active = true;
            return LineDisposition::Continuation;
        }

        let text = if st.multiline_active {
            st.multiline.push(line.to_string());
            let joined = st.multiline.join("\n");
            st.multiline.clear();
            st.multiline_active = false;
            joined
        } else {
            line.trim().to_string()
        };

        Self::classify(&mut st, text)
    }

    /// Classify submitted text. Capture mode outranks command detection:
    /// while a turn is streaming, a `/`-line is context for the agent, not
    /// a new command.
    fn classify(st: &mut InputState, text: String) -> LineDisposition {
        if !text.is_empty() {
            st.push_history(&text);
        }
        st.hist_cursor = None;

        if st.capturing {
            if text.is_empty() {
                return LineDisposition::Ignored;
            }
            st.interrupts.capture(text);
            return LineDisposition::InterruptQueued;
        }

        if text.starts_with('/') && !text.contains('\n') {
            let name = text[1..].trim().to_lowercase();
            if let Some(tx) = st.prompt_waiter.take() {
                let _ = tx.send(InputEvent::Command(name));
                return LineDisposition::Resolved;
            }
            return LineDisposition::Ignored;
        }

        if text.is_empty() {
            return LineDisposition::Ignored;
        }

        if let Some(tx) = st.prompt_waiter.take() {
            let _ = tx.send(InputEvent::Prompt(text));
            LineDisposition::Resolved
        } else {
            LineDisposition::Ignored
        }
    }

    // =========================================================================
    // Keystroke-level operations (raw interactive mode)
    // =========================================================================

    /// The cancel combination. Scoped: multiline discard first, then
    /// partial-capture flush, then the double-press exit window.
    pub fn cancel_key(&self) -> CancelOutcome {
        self.cancel_key_at(Instant::now())
    }

    fn cancel_key_at(&self, now: Instant) -> CancelOutcome {
        let mut st = self.state.lock();

        if st.multiline_active {
            st.multiline.clear();
            st.multiline_active = false;
            st.skip_next_line = false;
            st.editor.clear();
            return CancelOutcome::ClearedMultiline;
        }

        if st.capturing {
            let partial = st.editor.take().trim().to_string();
            if !partial.is_empty() {
                st.push_history(&partial);
                st.interrupts.capture(partial);
                return CancelOutcome::InterruptFlushed;
            }
        }

        match st.last_cancel {
            Some(prev) if now.duration_since(prev) <= CANCEL_EXIT_WINDOW => {
                st.last_cancel = None;
                st.closed = true;
                if let Some(tx) = st.prompt_waiter.take() {
                    let _ = tx.send(InputEvent::Exit);
                }
                self.close_signal.notify_one();
                CancelOutcome::Exit
            }
            _ => {
                st.last_cancel = Some(now);
                CancelOutcome::Warned
            }
        }
    }

    /// The add-newline combination: push the partial line into the
    /// multiline buffer and arm the one-shot flag that suppresses the
    /// line-completed event the source will emit for the now-empty line.
    pub fn newline_key(&self) {
        let mut st = self.state.lock();
        let partial = st.editor.take();
        st.multiline.push(partial);
        st.multiline_active = true;
        st.skip_next_line = true;
    }

    /// Same as [`newline_key`](Self::newline_key) for key sources that do
    /// not emit a trailing completed line for the combination; the skip
    /// flag stays unarmed.
    pub fn newline_key_direct(&self) {
        let mut st = self.state.lock();
        let partial = st.editor.take();
        st.multiline.push(partial);
        st.multiline_active = true;
    }

    /// Take the editor line and dispatch it as a completed line.
    pub fn submit_current_line(&self) -> LineDisposition {
        let line = {
            let mut st = self.state.lock();
            st.editor.take()
        };
        self.submit_line(&line)
    }

    pub fn multiline_active(&self) -> bool {
        self.state.lock().multiline_active
    }

    // =========================================================================
    // Capture mode & interrupt queue
    // =========================================================================

    /// Idempotent.
    pub fn enable_capture(&self) {
        self.state.lock().capturing = true;
    }

    /// Idempotent; clears any partial in-progress capture, including a
    /// multiline continuation started during the turn.
    pub fn disable_capture(&self) {
        let mut st = self.state.lock();
        if st.capturing {
            st.editor.clear();
            st.multiline.clear();
            st.multiline_active = false;
            st.skip_next_line = false;
        }
        st.capturing = false;
    }

    pub fn is_capturing(&self) -> bool {
        self.state.lock().capturing
    }

    pub fn set_interrupt_callback(&self, callback: impl Fn(&str) + Send + Sync + 'static) {
        self.state.lock().interrupts.set_callback(callback);
    }

    pub fn clear_interrupt_callback(&self) {
        self.state.lock().interrupts.clear_callback();
    }

    pub fn has_pending_interrupts(&self) -> bool {
        self.state.lock().interrupts.has_pending()
    }

    pub fn pop_interrupt(&self) -> Option<String> {
        self.state.lock().interrupts.pop_next()
    }

    pub fn drain_interrupts(&self) -> Vec<String> {
        self.state.lock().interrupts.drain()
    }

    // =========================================================================
    // Editor surface for the terminal driver
    // =========================================================================

    pub fn insert_char(&self, c: char) {
        self.state.lock().editor.insert_char(c);
    }

    pub fn insert_str(&self, text: &str) {
        self.state.lock().editor.insert_str(text);
    }

    pub fn backspace(&self) {
        self.state.lock().editor.backspace();
    }

    pub fn delete_at_cursor(&self) {
        self.state.lock().editor.delete_at_cursor();
    }

    pub fn move_left(&self) {
        self.state.lock().editor.move_left();
    }

    pub fn move_right(&self) {
        self.state.lock().editor.move_right();
    }

    pub fn move_home(&self) {
        self.state.lock().editor.move_home();
    }

    pub fn move_end(&self) {
        self.state.lock().editor.move_end();
    }

    pub fn kill_to_end(&self) {
        self.state.lock().editor.kill_to_end();
    }

    pub fn kill_to_start(&self) {
        self.state.lock().editor.kill_to_start();
    }

    pub fn line_snapshot(&self) -> (String, usize) {
        self.state.lock().editor.snapshot()
    }

    // =========================================================================
    // History recall
    // =========================================================================

    pub fn history_prev(&self) {
        let mut st = self.state.lock();
        if st.history.is_empty() {
            return;
        }
        match st.hist_cursor {
            None => {
                st.hist_stash = st.editor.line().to_string();
                st.hist_cursor = Some(st.history.len() - 1);
            }
            Some(0) => {}
            Some(i) => st.hist_cursor = Some(i - 1),
        }
        if let Some(i) = st.hist_cursor {
            let entry = st.history[i].clone();
            st.editor.set_line(entry);
        }
    }

    pub fn history_next(&self) {
        let mut st = self.state.lock();
        match st.hist_cursor {
            None => {}
            Some(i) if i + 1 < st.history.len() => {
                st.hist_cursor = Some(i + 1);
                let entry = st.history[i + 1].clone();
                st.editor.set_line(entry);
            }
            Some(_) => {
                st.hist_cursor = None;
                let stash = std::mem::take(&mut st.hist_stash);
                st.editor.set_line(stash);
            }
        }
    }

    /// Most recent submitted inputs, newest last.
    pub fn recent_history(&self, n: usize) -> Vec<String> {
        let st = self.state.lock();
        st.history
            .iter()
            .rev()
            .take(n)
            .rev()
            .cloned()
            .collect()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// The input source closed (EOF or teardown). A pending prompt waiter
    /// observes Exit; a pending permission waiter observes closure.
    pub fn close(&self) {
        {
            let mut st = self.state.lock();
            st.closed = true;
            if let Some(tx) = st.prompt_waiter.take() {
                let _ = tx.send(InputEvent::Exit);
            }
            st.permission_waiter.take();
        }
        self.close_signal.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Resolve once the machine is closed. Completes immediately when it
    /// already is; otherwise suspends until [`close`](Self::close) or a
    /// double-cancel exit. Lets blocked consumers (the terminal driver)
    /// stop without waiting for one more input event.
    pub async fn closed(&self) {
        while !self.is_closed() {
            self.close_signal.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn non_empty_line_resolves_prompt_waiter_with_trimmed_text() {
        let handler = InputHandler::new();
        let fut = handler.next_event();
        tokio::pin!(fut);
        assert!(futures::poll!(fut.as_mut()).is_pending());

        assert_eq!(
            handler.submit_line("  hello there  "),
            LineDisposition::Resolved
        );
        assert_eq!(fut.await, InputEvent::Prompt("hello there".to_string()));
    }

    #[tokio::test]
    async fn empty_line_does_not_resolve_waiter() {
        let handler = InputHandler::new();
        let fut = handler.next_event();
        tokio::pin!(fut);
        assert!(futures::poll!(fut.as_mut()).is_pending());

        assert_eq!(handler.submit_line("   "), LineDisposition::Ignored);
        assert!(futures::poll!(fut.as_mut()).is_pending());

        handler.submit_line("hi");
        assert_eq!(fut.await, InputEvent::Prompt("hi".to_string()));
    }

    #[tokio::test]
    async fn slash_line_resolves_as_lowercased_command() {
        let handler = InputHandler::new();
        let fut = handler.next_event();
        tokio::pin!(fut);
        assert!(futures::poll!(fut.as_mut()).is_pending());

        handler.submit_line("/HELP");
        assert_eq!(fut.await, InputEvent::Command("help".to_string()));
    }

    #[tokio::test]
    async fn continuation_lines_join_into_one_prompt() {
        let handler = InputHandler::new();
        let fut = handler.next_event();
        tokio::pin!(fut);
        assert!(futures::poll!(fut.as_mut()).is_pending());

        assert_eq!(handler.submit_line("a\\"), LineDisposition::Continuation);
        assert!(futures::poll!(fut.as_mut()).is_pending());
        assert_eq!(handler.submit_line("b\\"), LineDisposition::Continuation);
        assert!(futures::poll!(fut.as_mut()).is_pending());
        assert_eq!(handler.submit_line("c"), LineDisposition::Resolved);

        assert_eq!(fut.await, InputEvent::Prompt("a\nb\nc".to_string()));
    }

    #[tokio::test]
    async fn slash_inside_multiline_is_not_a_command() {
        let handler = InputHandler::new();
        let fut = handler.next_event();
        tokio::pin!(fut);
        assert!(futures::poll!(fut.as_mut()).is_pending());

        handler.submit_line("/help\\");
        handler.submit_line("more");
        assert_eq!(fut.await, InputEvent::Prompt("/help\nmore".to_string()));
    }

    #[tokio::test]
    async fn permission_waiter_preempts_command_dispatch() {
        let handler = InputHandler::new();
        let perm = handler.ask_permission();
        tokio::pin!(perm);
        assert!(futures::poll!(perm.as_mut()).is_pending());

        // "/help" while awaiting permission is an invalid answer, not a command
        assert_eq!(
            handler.submit_line("/help"),
            LineDisposition::PermissionRetry
        );
        assert!(futures::poll!(perm.as_mut()).is_pending());

        assert_eq!(handler.submit_line("a"), LineDisposition::PermissionAnswered);
        assert_eq!(perm.await, Some(PermissionAnswer::AllowAlways));
    }

    #[test]
    fn permission_parsing_table() {
        assert_eq!(
            parse_permission_response("Y"),
            Some(PermissionAnswer::AllowOnce)
        );
        assert_eq!(
            parse_permission_response(" yes "),
            Some(PermissionAnswer::AllowOnce)
        );
        assert_eq!(
            parse_permission_response("no"),
            Some(PermissionAnswer::Deny)
        );
        assert_eq!(
            parse_permission_response("Always Allow"),
            Some(PermissionAnswer::AllowAlways)
        );
        assert_eq!(parse_permission_response("maybe"), None);
        assert_eq!(parse_permission_response(""), None);
    }

    #[test]
    fn capture_mode_routes_lines_to_interrupt_queue() {
        let handler = InputHandler::new();
        let hits = std::sync::Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        handler.set_interrupt_callback(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        handler.enable_capture();
        assert_eq!(
            handler.submit_line("check main.go"),
            LineDisposition::InterruptQueued
        );
        // Commands route to interrupts too while streaming
        assert_eq!(
            handler.submit_line("/clear"),
            LineDisposition::InterruptQueued
        );

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(handler.pop_interrupt().as_deref(), Some("check main.go"));
        assert_eq!(handler.pop_interrupt().as_deref(), Some("/clear"));
        assert_eq!(handler.pop_interrupt(), None);
    }

    #[test]
    fn disable_capture_clears_partial_and_is_idempotent() {
        let handler = InputHandler::new();
        handler.enable_capture();
        handler.enable_capture();
        handler.insert_str("half-typed");

        handler.disable_capture();
        handler.disable_capture();
        assert!(!handler.is_capturing());
        assert_eq!(handler.line_snapshot().0, "");
    }

    #[tokio::test]
    async fn disable_capture_drops_inflight_continuation() {
        let handler = InputHandler::new();
        handler.enable_capture();
        assert_eq!(
            handler.submit_line("note part one\\"),
            LineDisposition::Continuation
        );
        assert!(handler.multiline_active());

        // Turn ends mid-continuation
        handler.disable_capture();
        assert!(!handler.multiline_active());

        // The next submission is a clean prompt, not a joined leftover
        let fut = handler.next_event();
        tokio::pin!(fut);
        assert!(futures::poll!(fut.as_mut()).is_pending());
        assert_eq!(handler.submit_line("hello"), LineDisposition::Resolved);
        assert_eq!(fut.await, InputEvent::Prompt("hello".to_string()));
    }

    #[test]
    fn cancel_clears_multiline_first() {
        let handler = InputHandler::new();
        handler.submit_line("start\\");
        assert!(handler.multiline_active());

        assert_eq!(handler.cancel_key(), CancelOutcome::ClearedMultiline);
        assert!(!handler.multiline_active());
        // The same press never doubles as an exit arm
        assert_eq!(handler.cancel_key(), CancelOutcome::Warned);
    }

    #[test]
    fn cancel_flushes_partial_capture_as_interrupt() {
        let handler = InputHandler::new();
        handler.enable_capture();
        handler.insert_str("wait, also check main.go");

        assert_eq!(handler.cancel_key(), CancelOutcome::InterruptFlushed);
        assert_eq!(
            handler.pop_interrupt().as_deref(),
            Some("wait, also check main.go")
        );
        assert_eq!(handler.line_snapshot().0, "");
    }

    #[test]
    fn double_cancel_exit_window() {
        let handler = InputHandler::new();
        let t0 = Instant::now();

        assert_eq!(handler.cancel_key_at(t0), CancelOutcome::Warned);
        assert_eq!(
            handler.cancel_key_at(t0 + Duration::from_millis(1500)),
            CancelOutcome::Exit
        );
        assert!(handler.is_closed());
    }

    #[test]
    fn cancel_after_window_restarts_warning() {
        let handler = InputHandler::new();
        let t0 = Instant::now();

        assert_eq!(handler.cancel_key_at(t0), CancelOutcome::Warned);
        assert_eq!(
            handler.cancel_key_at(t0 + Duration::from_secs(3)),
            CancelOutcome::Warned
        );
        assert!(!handler.is_closed());
        assert_eq!(
            handler.cancel_key_at(t0 + Duration::from_secs(4)),
            CancelOutcome::Exit
        );
    }

    #[tokio::test]
    async fn newline_key_buffers_partial_and_skips_artifact_line() {
        let handler = InputHandler::new();
        let fut = handler.next_event();
        tokio::pin!(fut);
        assert!(futures::poll!(fut.as_mut()).is_pending());

        handler.insert_str("hello");
        handler.newline_key();
        assert!(handler.multiline_active());
        assert_eq!(handler.line_snapshot().0, "");

        // The line source emits a completed line for the now-empty line
        assert_eq!(handler.submit_line(""), LineDisposition::Skipped);
        assert!(futures::poll!(fut.as_mut()).is_pending());

        handler.submit_line("world");
        assert_eq!(fut.await, InputEvent::Prompt("hello\nworld".to_string()));
    }

    #[tokio::test]
    async fn direct_newline_does_not_arm_skip_flag() {
        let handler = InputHandler::new();
        let fut = handler.next_event();
        tokio::pin!(fut);
        assert!(futures::poll!(fut.as_mut()).is_pending());

        handler.insert_str("hello");
        handler.newline_key_direct();
        assert!(handler.multiline_active());

        handler.insert_str("world");
        assert_eq!(handler.submit_current_line(), LineDisposition::Resolved);
        assert_eq!(fut.await, InputEvent::Prompt("hello\nworld".to_string()));
    }

    #[tokio::test]
    async fn close_resolves_pending_waiter_with_exit() {
        let handler = InputHandler::new();
        let fut = handler.next_event();
        tokio::pin!(fut);
        assert!(futures::poll!(fut.as_mut()).is_pending());

        handler.close();
        assert_eq!(fut.await, InputEvent::Exit);
        // And any later wait returns Exit immediately
        assert_eq!(handler.next_event().await, InputEvent::Exit);
    }

    #[tokio::test]
    async fn close_wakes_suspended_shutdown_waiter() {
        let handler = InputHandler::new();
        let fut = handler.closed();
        tokio::pin!(fut);
        assert!(futures::poll!(fut.as_mut()).is_pending());

        handler.close();
        fut.await;
        // Already-closed machines resolve without suspending
        handler.closed().await;
    }

    #[tokio::test]
    async fn double_cancel_exit_wakes_shutdown_waiter() {
        let handler = InputHandler::new();
        let fut = handler.closed();
        tokio::pin!(fut);
        assert!(futures::poll!(fut.as_mut()).is_pending());

        let t0 = Instant::now();
        assert_eq!(handler.cancel_key_at(t0), CancelOutcome::Warned);
        assert!(futures::poll!(fut.as_mut()).is_pending());
        assert_eq!(
            handler.cancel_key_at(t0 + Duration::from_millis(500)),
            CancelOutcome::Exit
        );
        fut.await;
    }

    #[test]
    fn history_is_bounded_and_recallable() {
        let handler = InputHandler::new();
        for i in 0..(HISTORY_CAPACITY + 10) {
            handler.submit_line(&format!("entry {}", i));
        }
        let recent = handler.recent_history(HISTORY_CAPACITY + 10);
        assert_eq!(recent.len(), HISTORY_CAPACITY);
        assert_eq!(recent.first().map(String::as_str), Some("entry 10"));
        assert_eq!(
            recent.last().map(String::as_str),
            Some(&*format!("entry {}", HISTORY_CAPACITY + 9))
        );

        handler.history_prev();
        assert_eq!(
            handler.line_snapshot().0,
            format!("entry {}", HISTORY_CAPACITY + 9)
        );
        handler.history_prev();
        assert_eq!(
            handler.line_snapshot().0,
            format!("entry {}", HISTORY_CAPACITY + 8)
        );
        handler.history_next();
        handler.history_next();
        // Walked past the newest entry: back to the stashed (empty) line
        assert_eq!(handler.line_snapshot().0, "");
    }
}
