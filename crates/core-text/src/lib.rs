//! Rope-based text model bound to the editor widget.
//!
//! Positions follow the widget convention: 1-based lines and 1-based columns,
//! where a column counts Unicode scalar values within the line (excluding the
//! line terminator). Every position handed to a mutating call is clamped first,
//! so callers may pass caret positions reported by an external source without
//! validating them.

use ropey::Rope;

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone, Default)]
pub struct Buffer {
    rope: Rope,
}

/// A caret position: (1-based line, 1-based column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
    pub fn origin() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::origin()
    }
}

/// A selection range. `start <= end` always holds for values built through
/// [`Selection::new`]; a collapsed selection is a plain caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    /// Construct a selection normalizing ordering so that start <= end.
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn caret(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<&str> for Buffer {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

impl Buffer {
    pub fn new(content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
        }
    }

    /// Full buffer contents.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Total number of lines (an empty buffer still has one line).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Number of characters on a 1-based line, excluding its terminator.
    /// Returns 0 for lines outside the buffer.
    pub fn line_len(&self, line: usize) -> usize {
        if line == 0 || line > self.rope.len_lines() {
            return 0;
        }
        let slice = self.rope.line(line - 1);
        let mut len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len -= 1;
            if len > 0 && slice.char(len - 1) == '\r' {
                len -= 1;
            }
        }
        len
    }

    /// Content of a 1-based line without its terminator.
    pub fn line(&self, line: usize) -> Option<String> {
        if line == 0 || line > self.rope.len_lines() {
            return None;
        }
        let len = self.line_len(line);
        Some(self.rope.line(line - 1).slice(..len).to_string())
    }

    /// Clamp a position into the buffer: line into `1..=line_count`, column
    /// into `1..=line_len + 1` (the slot after the last character).
    pub fn clamp(&self, pos: Position) -> Position {
        let line = pos.line.clamp(1, self.line_count());
        let column = pos.column.clamp(1, self.line_len(line) + 1);
        Position { line, column }
    }

    /// Absolute char index of a (clamped) position.
    pub fn char_index(&self, pos: Position) -> usize {
        let pos = self.clamp(pos);
        self.rope.line_to_char(pos.line - 1) + pos.column - 1
    }

    /// Position of an absolute char index (clamped to the end of the buffer).
    pub fn position_at(&self, char_idx: usize) -> Position {
        let idx = char_idx.min(self.rope.len_chars());
        let line0 = self.rope.char_to_line(idx);
        let column = idx - self.rope.line_to_char(line0) + 1;
        Position {
            line: line0 + 1,
            column,
        }
    }

    /// Replace the entire contents.
    pub fn replace_all(&mut self, content: &str) {
        self.rope = Rope::from_str(content);
    }

    /// Replace the text covered by `range` with `text`. Returns the position
    /// directly after the inserted text.
    pub fn replace_range(&mut self, range: Selection, text: &str) -> Position {
        let start = self.char_index(range.start);
        let end = self.char_index(range.end).max(start);
        if end > start {
            self.rope.remove(start..end);
        }
        self.rope.insert(start, text);
        self.position_at(start + text.chars().count())
    }

    /// Position of the slot after the last character.
    pub fn end_position(&self) -> Position {
        self.position_at(self.rope.len_chars())
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Contents stay out of debug output; only shape.
        f.debug_struct("Buffer")
            .field("len_bytes", &self.rope.len_bytes())
            .field("lines", &self.rope.len_lines())
            .finish()
    }
}
