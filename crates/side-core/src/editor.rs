/// Zero-based cursor; `column` counts chars, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
    PageUp(usize),
    PageDown(usize),
    DocumentStart,
    DocumentEnd,
}

/// Buffer for the active file. Content is replaced wholesale when the active
/// file changes; there is no per-file history.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    pub content: String,
    pub is_modified: bool,
    pub cursor: CursorPosition,
    pub scroll_top: usize,
    pub scroll_left: usize,
    pub center_on_cursor: bool,
    /// Bumped on every load and edit; a save only clears `is_modified` when
    /// the buffer is still at the revision it wrote.
    pub revision: u64,
}

impl EditorState {
    /// Loads fresh content: cursor home, modified flag cleared.
    pub fn load(&mut self, content: String) {
        self.content = content;
        self.is_modified = false;
        self.cursor = CursorPosition::default();
        self.scroll_top = 0;
        self.scroll_left = 0;
        self.center_on_cursor = false;
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        self.load(String::new());
    }

    /// Replaces the in-memory content and marks the buffer modified.
    pub fn edit(&mut self, content: String) {
        self.content = content;
        self.is_modified = true;
        self.revision = self.revision.wrapping_add(1);
        self.clamp_cursor();
    }

    pub fn line_count(&self) -> usize {
        self.content.split('\n').count()
    }

    pub fn line(&self, idx: usize) -> Option<&str> {
        self.content.split('\n').nth(idx)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.split('\n')
    }

    fn line_len(&self, idx: usize) -> usize {
        self.line(idx).map_or(0, |line| line.chars().count())
    }

    /// Places the cursor at the start of a one-based line and asks the view
    /// to center on it.
    pub fn reveal_line(&mut self, line_number: usize) {
        let last = self.line_count().saturating_sub(1);
        self.cursor = CursorPosition {
            line: line_number.saturating_sub(1).min(last),
            column: 0,
        };
        self.center_on_cursor = true;
    }

    pub fn move_cursor(&mut self, movement: CursorMove) {
        let last_line = self.line_count().saturating_sub(1);
        let CursorPosition { line, column } = self.cursor;
        self.cursor = match movement {
            CursorMove::Left if column > 0 => CursorPosition {
                line,
                column: column - 1,
            },
            CursorMove::Left if line > 0 => CursorPosition {
                line: line - 1,
                column: self.line_len(line - 1),
            },
            CursorMove::Left => self.cursor,
            CursorMove::Right if column < self.line_len(line) => CursorPosition {
                line,
                column: column + 1,
            },
            CursorMove::Right if line < last_line => CursorPosition {
                line: line + 1,
                column: 0,
            },
            CursorMove::Right => self.cursor,
            CursorMove::Up => self.vertical_target(line.saturating_sub(1), column),
            CursorMove::Down => self.vertical_target((line + 1).min(last_line), column),
            CursorMove::PageUp(rows) => self.vertical_target(line.saturating_sub(rows), column),
            CursorMove::PageDown(rows) => {
                self.vertical_target(line.saturating_add(rows).min(last_line), column)
            }
            CursorMove::LineStart => CursorPosition { line, column: 0 },
            CursorMove::LineEnd => CursorPosition {
                line,
                column: self.line_len(line),
            },
            CursorMove::DocumentStart => CursorPosition::default(),
            CursorMove::DocumentEnd => CursorPosition {
                line: last_line,
                column: self.line_len(last_line),
            },
        };
    }

    /// Inserts text at the cursor through [`EditorState::edit`].
    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let offset = self.offset_of(self.cursor);
        let mut next = String::with_capacity(self.content.len() + text.len());
        next.push_str(&self.content[..offset]);
        next.push_str(text);
        next.push_str(&self.content[offset..]);

        let newlines = text.matches('\n').count();
        let cursor = if newlines == 0 {
            CursorPosition {
                line: self.cursor.line,
                column: self.cursor.column + text.chars().count(),
            }
        } else {
            let tail = text.rsplit('\n').next().unwrap_or_default();
            CursorPosition {
                line: self.cursor.line + newlines,
                column: tail.chars().count(),
            }
        };
        self.edit(next);
        self.cursor = cursor;
    }

    /// Deletes the char before the cursor, joining lines at column zero.
    /// Returns false when there is nothing to delete.
    pub fn backspace(&mut self) -> bool {
        let CursorPosition { line, column } = self.cursor;
        if column == 0 && line == 0 {
            return false;
        }
        let end = self.offset_of(self.cursor);
        let cursor = if column > 0 {
            CursorPosition {
                line,
                column: column - 1,
            }
        } else {
            CursorPosition {
                line: line - 1,
                column: self.line_len(line - 1),
            }
        };
        let start = self.offset_of(cursor);
        let mut next = self.content.clone();
        next.replace_range(start..end, "");
        self.edit(next);
        self.cursor = cursor;
        true
    }

    /// Deletes the char under the cursor, joining with the next line at the
    /// end of a line. Returns false at the end of the document.
    pub fn delete_forward(&mut self) -> bool {
        let start = self.offset_of(self.cursor);
        let Some(ch) = self.content[start..].chars().next() else {
            return false;
        };
        let mut next = self.content.clone();
        next.replace_range(start..start + ch.len_utf8(), "");
        self.edit(next);
        true
    }

    /// Adjusts the scroll offsets so the cursor is inside a viewport of
    /// `rows` x `cols`, centering it after a reveal.
    pub fn scroll_into_view(&mut self, rows: usize, cols: usize) {
        if rows == 0 || cols == 0 {
            return;
        }
        let line = self.cursor.line;
        if self.center_on_cursor {
            self.scroll_top = line.saturating_sub(rows / 2);
            self.center_on_cursor = false;
        } else if line < self.scroll_top {
            self.scroll_top = line;
        } else if line >= self.scroll_top + rows {
            self.scroll_top = line + 1 - rows;
        }

        let column = self.cursor.column;
        if column < self.scroll_left {
            self.scroll_left = column;
        } else if column >= self.scroll_left + cols {
            self.scroll_left = column + 1 - cols;
        }
    }

    fn vertical_target(&self, line: usize, column: usize) -> CursorPosition {
        CursorPosition {
            line,
            column: column.min(self.line_len(line)),
        }
    }

    fn clamp_cursor(&mut self) {
        let last = self.line_count().saturating_sub(1);
        let line = self.cursor.line.min(last);
        self.cursor = CursorPosition {
            line,
            column: self.cursor.column.min(self.line_len(line)),
        };
    }

    fn offset_of(&self, pos: CursorPosition) -> usize {
        let mut offset = 0;
        for (idx, line) in self.content.split('\n').enumerate() {
            if idx == pos.line {
                let within = line
                    .char_indices()
                    .nth(pos.column)
                    .map_or(line.len(), |(byte, _)| byte);
                return offset + within;
            }
            offset += line.len() + 1;
        }
        self.content.len()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn editor(content: &str) -> EditorState {
        let mut editor = EditorState::default();
        editor.load(content.to_string());
        editor
    }

    #[test]
    fn loads_and_edits_bump_the_revision() {
        let mut editor = editor("a");
        let loaded = editor.revision;
        editor.insert_text("b");
        assert!(editor.revision != loaded);
        let edited = editor.revision;
        editor.move_cursor(CursorMove::Left);
        assert_eq!(editor.revision, edited);
        editor.load("c".to_string());
        assert!(editor.revision != edited);
    }

    #[test]
    fn insert_marks_modified_and_advances_cursor() {
        let mut editor = editor("fn main() {}");
        editor.move_cursor(CursorMove::LineEnd);
        editor.insert_text("\n// done");
        assert_eq!(editor.content, "fn main() {}\n// done");
        assert_eq!(editor.cursor, CursorPosition { line: 1, column: 7 });
        assert!(editor.is_modified);
    }

    #[test]
    fn backspace_joins_lines_at_column_zero() {
        let mut editor = editor("ab\ncd");
        editor.move_cursor(CursorMove::Down);
        assert!(editor.backspace());
        assert_eq!(editor.content, "abcd");
        assert_eq!(editor.cursor, CursorPosition { line: 0, column: 2 });
    }

    #[test]
    fn backspace_at_document_start_is_noop() {
        let mut editor = editor("ab");
        assert!(!editor.backspace());
        assert!(!editor.is_modified);
    }

    #[test]
    fn delete_forward_handles_multibyte_chars() {
        let mut editor = editor("é!");
        assert!(editor.delete_forward());
        assert_eq!(editor.content, "!");
        editor.move_cursor(CursorMove::DocumentEnd);
        assert!(!editor.delete_forward());
    }

    #[test]
    fn vertical_moves_clamp_column_to_line_length() {
        let mut editor = editor("long line\nab\nanother long line");
        editor.move_cursor(CursorMove::LineEnd);
        editor.move_cursor(CursorMove::Down);
        assert_eq!(editor.cursor, CursorPosition { line: 1, column: 2 });
        editor.move_cursor(CursorMove::PageDown(10));
        assert_eq!(editor.cursor, CursorPosition { line: 2, column: 2 });
    }

    #[test]
    fn reveal_line_centers_viewport() {
        let content: Vec<String> = (1..=100).map(|n| format!("line {n}")).collect();
        let mut editor = editor(&content.join("\n"));
        editor.reveal_line(50);
        editor.scroll_into_view(20, 80);
        assert_eq!(editor.cursor, CursorPosition { line: 49, column: 0 });
        assert_eq!(editor.scroll_top, 39);
        assert!(!editor.center_on_cursor);
    }

    #[test]
    fn reveal_past_end_clamps_to_last_line() {
        let mut editor = editor("a\nb");
        editor.reveal_line(40);
        assert_eq!(editor.cursor.line, 1);
    }
}
