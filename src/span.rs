//! Source location tracking
//!
//! Spans are byte ranges into a single file's text. The frontend reports
//! positions as 1-based line/column pairs; the LSP adapter converts those to
//! the protocol's 0-based coordinates.

use ropey::Rope;
use std::fmt;

/// A byte range in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    /// Start position (byte offset)
    pub start: usize,
    /// End position (byte offset, exclusive)
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create a span for a single position
    pub fn point(pos: usize) -> Self {
        Self { start: pos, end: pos + 1 }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans into one that covers both
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Check whether the span contains a byte offset
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Get the source text for this span
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A 1-based line/column pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    /// Line number (1-indexed)
    pub line: u32,
    /// Column number (1-indexed)
    pub col: u32,
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Line information cache for efficient span-to-position conversion
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Cumulative byte offsets for each line start
    line_starts: Vec<usize>,
    /// The source text as a rope for efficient slicing
    rope: Rope,
}

impl LineIndex {
    /// Create a new line index from source text
    pub fn new(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts, rope }
    }

    /// Convert a byte offset to a 1-based line/column pair
    pub fn line_col(&self, offset: usize) -> LineCol {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        LineCol {
            line: line as u32 + 1,
            col: (offset - line_start) as u32 + 1,
        }
    }

    /// Convert a 1-based line/column pair back to a byte offset
    pub fn offset(&self, pos: LineCol) -> usize {
        let line = pos.line.saturating_sub(1) as usize;
        if line >= self.line_starts.len() {
            return self.rope.len_bytes();
        }
        let line_start = self.line_starts[line];
        let line_end = self
            .line_starts
            .get(line + 1)
            .map(|&s| s.saturating_sub(1))
            .unwrap_or_else(|| self.rope.len_bytes());
        (line_start + pos.col.saturating_sub(1) as usize).min(line_end)
    }

    /// Get the text content of a span
    pub fn span_text(&self, span: Span) -> String {
        let start = self.rope.byte_to_char(span.start.min(self.rope.len_bytes()));
        let end = self.rope.byte_to_char(span.end.min(self.rope.len_bytes()));
        self.rope.slice(start..end).to_string()
    }

    /// Total length in bytes
    pub fn len(&self) -> usize {
        self.rope.len_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_bytes() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let text = "fn main() {\n    let x = 5\n}";
        let index = LineIndex::new(text);

        assert_eq!(index.line_col(0), LineCol { line: 1, col: 1 });
        // "main" starts at offset 3
        assert_eq!(index.line_col(3), LineCol { line: 1, col: 4 });
        // Start of second line (after "fn main() {\n")
        assert_eq!(index.line_col(12), LineCol { line: 2, col: 1 });
    }

    #[test]
    fn test_offset_round_trip() {
        let text = "let a = 1\nlet b = 2\n";
        let index = LineIndex::new(text);
        for offset in [0, 4, 9, 10, 14] {
            assert_eq!(index.offset(index.line_col(offset)), offset);
        }
    }

    #[test]
    fn test_offset_clamps_past_line_end() {
        let text = "ab\ncd";
        let index = LineIndex::new(text);
        assert_eq!(index.offset(LineCol { line: 1, col: 99 }), 2);
        assert_eq!(index.offset(LineCol { line: 9, col: 1 }), 5);
    }

    #[test]
    fn test_span_merge() {
        let a = Span::new(0, 5);
        let b = Span::new(3, 10);
        assert_eq!(a.merge(b), Span::new(0, 10));
    }

    #[test]
    fn test_span_text() {
        let source = "hello world";
        assert_eq!(Span::new(0, 5).text(source), "hello");
    }
}
