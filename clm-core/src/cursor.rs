/// Cursor over the document's plain text.
///
/// `row`/`col` count lines and characters; offsets are byte offsets into the
/// content, which is what highlight ranges store.
#[derive(Debug, Clone)]
pub struct CursorState {
    pub row: usize,
    pub col: usize,
    /// Byte offset where each line starts
    line_starts: Vec<usize>,
    lines: Vec<String>,
}

impl CursorState {
    pub fn new() -> Self {
        Self {
            row: 0,
            col: 0,
            line_starts: vec![0],
            lines: Vec::new(),
        }
    }

    /// Load content and compute line offsets
    pub fn set_content(&mut self, content: &str) {
        self.lines = content.split('\n').map(String::from).collect();
        self.line_starts.clear();
        self.line_starts.push(0);

        for (i, c) in content.char_indices() {
            if c == '\n' {
                self.line_starts.push(i + 1);
            }
        }

        self.row = 0;
        self.col = 0;
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map(|l| l.chars().count()).unwrap_or(0)
    }

    /// Convert (row, col) to a byte offset. Past-the-end positions clamp to
    /// the end of the line or content.
    pub fn cursor_to_offset(&self, row: usize, col: usize) -> usize {
        let (Some(&start), Some(line)) = (self.line_starts.get(row), self.lines.get(row)) else {
            return self.line_starts.last().copied().unwrap_or(0)
                + self.lines.last().map(|l| l.len()).unwrap_or(0);
        };
        let within = line
            .char_indices()
            .nth(col)
            .map(|(i, _)| i)
            .unwrap_or(line.len());
        start + within
    }

    /// Convert a byte offset to (row, col)
    pub fn offset_to_cursor(&self, offset: usize) -> (usize, usize) {
        for (i, &start) in self.line_starts.iter().enumerate().rev() {
            if offset >= start {
                let col = self
                    .lines
                    .get(i)
                    .map(|line| line.char_indices().take_while(|(b, _)| start + b < offset).count())
                    .unwrap_or(0);
                return (i, col);
            }
        }
        (0, 0)
    }

    pub fn offset(&self) -> usize {
        self.cursor_to_offset(self.row, self.col)
    }

    pub fn set_cursor_offset(&mut self, offset: usize) {
        let (row, col) = self.offset_to_cursor(offset);
        self.row = row;
        self.col = col;
    }

    pub fn current_line(&self) -> Option<&str> {
        self.lines.get(self.row).map(|s| s.as_str())
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(|s| s.as_str())
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(self.line_len(self.row));
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(self.line_len(self.row));
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.line_len(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_to_start(&mut self) {
        self.col = 0;
    }

    pub fn move_to_end(&mut self) {
        self.col = self.line_len(self.row);
    }

    pub fn move_to_top(&mut self) {
        self.row = 0;
        self.col = 0;
    }

    pub fn move_to_bottom(&mut self) {
        if !self.lines.is_empty() {
            self.row = self.lines.len() - 1;
            self.col = 0;
        }
    }

    /// Start of the next word, crossing blank lines.
    pub fn move_word_forward(&mut self) {
        let Some(line) = self.lines.get(self.row) else {
            return;
        };
        let chars: Vec<char> = line.chars().collect();
        let mut col = self.col;

        while col < chars.len() && !chars[col].is_whitespace() {
            col += 1;
        }
        while col < chars.len() && chars[col].is_whitespace() {
            col += 1;
        }

        if col >= chars.len() && self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
            while self.line_len(self.row) == 0 && self.row + 1 < self.lines.len() {
                self.row += 1;
            }
        } else {
            self.col = col;
        }
    }

    /// Just past the end of the current or next word. Selections end here.
    pub fn move_word_end(&mut self) {
        let Some(line) = self.lines.get(self.row) else {
            return;
        };
        let chars: Vec<char> = line.chars().collect();
        let mut col = self.col;

        while col < chars.len() && chars[col].is_whitespace() {
            col += 1;
        }
        while col < chars.len() && !chars[col].is_whitespace() {
            col += 1;
        }
        self.col = col;
    }

    pub fn move_word_back(&mut self) {
        if self.col == 0 {
            if self.row > 0 {
                self.row -= 1;
                self.col = self.line_len(self.row);
            }
            return;
        }

        if let Some(line) = self.lines.get(self.row) {
            let chars: Vec<char> = line.chars().collect();
            let mut col = self.col.min(chars.len());

            while col > 0 && chars[col - 1].is_whitespace() {
                col -= 1;
            }
            while col > 0 && !chars[col - 1].is_whitespace() {
                col -= 1;
            }

            self.col = col;
        }
    }
}

impl Default for CursorState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_movement() {
        let mut cursor = CursorState::new();
        cursor.set_content("Hello\nWorld\nTest");

        assert_eq!(cursor.cursor(), (0, 0));

        cursor.move_down();
        assert_eq!(cursor.cursor(), (1, 0));

        cursor.move_right();
        cursor.move_right();
        assert_eq!(cursor.cursor(), (1, 2));

        cursor.move_up();
        assert_eq!(cursor.cursor(), (0, 2));
    }

    #[test]
    fn test_offset_conversion() {
        let mut cursor = CursorState::new();
        cursor.set_content("Hello\nWorld");

        assert_eq!(cursor.cursor_to_offset(0, 0), 0);
        assert_eq!(cursor.cursor_to_offset(0, 5), 5);
        assert_eq!(cursor.cursor_to_offset(1, 0), 6);
        assert_eq!(cursor.cursor_to_offset(1, 5), 11);

        assert_eq!(cursor.offset_to_cursor(0), (0, 0));
        assert_eq!(cursor.offset_to_cursor(6), (1, 0));
        assert_eq!(cursor.offset_to_cursor(8), (1, 2));
    }

    #[test]
    fn test_multibyte_offsets() {
        let mut cursor = CursorState::new();
        cursor.set_content("Zoë [Job Title]");

        // 'ë' is two bytes
        assert_eq!(cursor.cursor_to_offset(0, 4), 5);
        assert_eq!(cursor.offset_to_cursor(5), (0, 4));
        cursor.set_cursor_offset(5);
        assert_eq!(cursor.offset(), 5);
    }

    #[test]
    fn test_word_motions_cross_blank_lines() {
        let mut cursor = CursorState::new();
        cursor.set_content("one two\n\nthree");

        cursor.move_word_end();
        assert_eq!(cursor.cursor(), (0, 3));
        cursor.move_word_forward();
        assert_eq!(cursor.cursor(), (0, 4));
        cursor.move_word_forward();
        assert_eq!(cursor.cursor(), (2, 0));
        cursor.move_word_back();
        assert_eq!(cursor.cursor(), (1, 0));
    }
}
