//! Line editing - cursor movement and text editing for the composer line
//!
//! Pure state: the terminal driver applies key events here and repaints
//! from `snapshot()`. Cursor positions are char indices, not bytes.

#[derive(Debug, Default)]
pub struct LineEditor {
    line: String,
    cursor: usize,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    // Cursor movement
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        let char_count = self.line.chars().count();
        if self.cursor < char_count {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.line.chars().count();
    }

    // Text input
    pub fn insert_char(&mut self, new_char: char) {
        if new_char == '\r' {
            return;
        }

        if self.cursor >= self.line.chars().count() {
            self.line.push(new_char);
        } else {
            let byte_idx = self
                .line
                .char_indices()
                .nth(self.cursor)
                .map(|(i, _)| i)
                .unwrap_or(self.line.len());
            self.line.insert(byte_idx, new_char);
        }
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, text: &str) {
        let clean_text = text.replace('\r', "");
        if clean_text.is_empty() {
            return;
        }

        if self.cursor >= self.line.chars().count() {
            self.line.push_str(&clean_text);
        } else {
            let byte_idx = self
                .line
                .char_indices()
                .nth(self.cursor)
                .map(|(i, _)| i)
                .unwrap_or(self.line.len());
            self.line.insert_str(byte_idx, &clean_text);
        }

        self.cursor += clean_text.chars().count();
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let mut chars: Vec<char> = self.line.chars().collect();
            chars.remove(self.cursor - 1);
            self.line = chars.into_iter().collect();
            self.move_left();
        }
    }

    pub fn delete_at_cursor(&mut self) {
        let char_count = self.line.chars().count();
        if self.cursor < char_count {
            let mut chars: Vec<char> = self.line.chars().collect();
            chars.remove(self.cursor);
            self.line = chars.into_iter().collect();
        }
    }

    pub fn kill_to_end(&mut self) {
        let byte_idx = self
            .line
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.line.len());
        self.line.truncate(byte_idx);
    }

    pub fn kill_to_start(&mut self) {
        let byte_idx = self
            .line
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.line.len());
        self.line = self.line[byte_idx..].to_string();
        self.cursor = 0;
    }

    // Content access
    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    /// Current line and cursor position (char index) for repainting.
    pub fn snapshot(&self) -> (String, usize) {
        (self.line.clone(), self.cursor)
    }

    pub fn set_line(&mut self, line: String) {
        self.cursor = line.chars().count();
        self.line = line;
    }

    /// Remove and return the current line, resetting the cursor.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.line)
    }

    pub fn clear(&mut self) {
        self.line.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_cursor_are_char_based() {
        let mut ed = LineEditor::new();
        ed.insert_str("héllo");
        assert_eq!(ed.line(), "héllo");
        ed.move_home();
        ed.move_right();
        ed.insert_char('X');
        assert_eq!(ed.line(), "hXéllo");
    }

    #[test]
    fn backspace_and_delete() {
        let mut ed = LineEditor::new();
        ed.insert_str("abc");
        ed.backspace();
        assert_eq!(ed.line(), "ab");
        ed.move_home();
        ed.delete_at_cursor();
        assert_eq!(ed.line(), "b");
    }

    #[test]
    fn kill_operations() {
        let mut ed = LineEditor::new();
        ed.insert_str("hello world");
        ed.move_home();
        for _ in 0..5 {
            ed.move_right();
        }
        ed.kill_to_end();
        assert_eq!(ed.line(), "hello");

        ed.move_end();
        ed.kill_to_start();
        assert_eq!(ed.line(), "");
        assert_eq!(ed.snapshot().1, 0);
    }

    #[test]
    fn take_resets_state() {
        let mut ed = LineEditor::new();
        ed.insert_str("keep typing");
        let taken = ed.take();
        assert_eq!(taken, "keep typing");
        assert!(ed.is_empty());
        assert_eq!(ed.snapshot().1, 0);
    }
}
