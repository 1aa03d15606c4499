//! Immutable document text with offset and line/column mapping.

use serde::Serialize;

/// Zero-based line and column. Columns count chars, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    /// Zero-based column within the line.
    pub column: u32,
    /// Zero-based line number.
    pub line: u32,
}

/// Document text plus a table of line start offsets.
#[derive(Debug, Clone)]
pub struct SourceText {
    line_starts: Vec<usize>,
    text: String,
}

impl SourceText {
    /// Take ownership of `text` and index its line starts.
    pub fn new(text: String) -> Self {
        let mut line_starts = vec![0];
        for (idx, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx.saturating_add(1));
            }
        }
        return Self { line_starts, text };
    }

    /// The raw text.
    pub fn as_str(&self) -> &str {
        return &self.text;
    }

    /// Byte offset of `position`, or `None` if the line or column is out of range.
    pub fn offset(&self, position: Position) -> Option<usize> {
        let line = usize::try_from(position.line).ok()?;
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line.saturating_add(1))
            .copied()
            .unwrap_or(self.text.len());
        let line_text = self.text.get(start..end)?;
        let column = usize::try_from(position.column).ok()?;

        if column == line_text.chars().count() {
            return Some(end);
        }
        return line_text
            .char_indices()
            .nth(column)
            .map(|(idx, _)| return start.saturating_add(idx));
    }

    /// Line and column of `offset`. Offsets past the end map to the last position.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = self
            .line_starts
            .partition_point(|&start| return start <= offset)
            .saturating_sub(1);
        let start = self.line_starts.get(line).copied().unwrap_or(0);
        let column = self
            .text
            .get(start..offset)
            .map_or(0, |prefix| return prefix.chars().count());

        return Position {
            column: u32::try_from(column).unwrap_or(u32::MAX),
            line: u32::try_from(line).unwrap_or(u32::MAX),
        };
    }
}
