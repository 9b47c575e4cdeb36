//! Conversion helpers for the LSP adapter
//!
//! Internally the frontend reports 1-based line/column pairs; LSP uses
//! 0-based lines and characters. Everything crossing the boundary goes
//! through here.

use crate::diag::Severity;
use crate::span::{LineCol, LineIndex, Span};
use crate::SOURCE_EXTENSIONS;
use std::path::Path;
use tower_lsp::lsp_types::{DiagnosticSeverity, Position, Range};

/// What kind of file a URI refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Source,
    Config,
}

/// Classify a path: configuration documents are `.json` files and
/// `.artic-lsp` files, everything else is treated as source
pub fn file_kind(path: &Path) -> FileKind {
    if path.extension().is_some_and(|ext| ext == "json") {
        return FileKind::Config;
    }
    if path.file_name().is_some_and(|name| name == ".artic-lsp") {
        return FileKind::Config;
    }
    FileKind::Source
}

/// Whether the path carries a recognized source extension
pub fn is_source_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Convert a byte span to an LSP range (1-based internal → 0-based LSP)
pub fn span_to_range(index: &LineIndex, span: Span) -> Range {
    Range {
        start: line_col_to_position(index.line_col(span.start)),
        end: line_col_to_position(index.line_col(span.end)),
    }
}

pub fn line_col_to_position(pos: LineCol) -> Position {
    Position {
        line: pos.line.saturating_sub(1),
        character: pos.col.saturating_sub(1),
    }
}

/// Convert an LSP position to a byte offset (0-based LSP → 1-based internal)
pub fn position_to_offset(index: &LineIndex, position: Position) -> usize {
    index.offset(LineCol { line: position.line + 1, col: position.character + 1 })
}

pub fn severity_to_lsp(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Info => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    }
}

/// Every occurrence of `literal` in `text`, as LSP ranges.
///
/// Configuration diagnostics carry a literal context instead of a position;
/// the ranges are recovered by scanning the document line by line.
pub fn literal_ranges(text: &str, literal: &str) -> Vec<Range> {
    let mut ranges = Vec::new();
    if literal.is_empty() {
        return ranges;
    }
    for (line_number, line) in text.lines().enumerate() {
        let mut from = 0;
        while let Some(found) = line[from..].find(literal) {
            let start = from + found;
            ranges.push(Range {
                start: Position { line: line_number as u32, character: start as u32 },
                end: Position {
                    line: line_number as u32,
                    character: (start + literal.len()) as u32,
                },
            });
            from = start + 1;
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind() {
        assert_eq!(file_kind(Path::new("/w/artic.json")), FileKind::Config);
        assert_eq!(file_kind(Path::new("/w/.artic-lsp")), FileKind::Config);
        assert_eq!(file_kind(Path::new("/w/main.art")), FileKind::Source);
        assert_eq!(file_kind(Path::new("/w/main.impala")), FileKind::Source);
    }

    #[test]
    fn test_is_source_path() {
        assert!(is_source_path(Path::new("/w/a.art")));
        assert!(is_source_path(Path::new("/w/a.impala")));
        assert!(!is_source_path(Path::new("/w/a.json")));
    }

    #[test]
    fn test_span_round_trip() {
        let text = "fn f() {\n    let x = 1\n}";
        let index = LineIndex::new(text);
        let span = Span::new(17, 18); // the `x`
        let range = span_to_range(&index, span);
        assert_eq!(range.start, Position { line: 1, character: 8 });
        assert_eq!(position_to_offset(&index, range.start), 17);
    }

    #[test]
    fn test_literal_ranges_finds_every_occurrence() {
        let text = "\"name\": \"lib\",\n\"dependencies\": [\"lib\"]";
        let ranges = literal_ranges(text, "\"lib\"");
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].start, Position { line: 0, character: 8 });
        assert_eq!(ranges[1].start, Position { line: 1, character: 17 });
    }

    #[test]
    fn test_literal_ranges_empty_literal() {
        assert!(literal_ranges("anything", "").is_empty());
    }
}
