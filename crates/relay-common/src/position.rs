//! Line/column positions for diagnostics.
//!
//! The syntax tree works in byte offsets; drivers that render diagnostics
//! want line/column pairs. `LineMap` converts between the two.

/// A position in a source file (0-indexed line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column in bytes from the line start
    pub column: u32,
}

impl Position {
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Line map for offset -> position conversion.
/// Stores the starting offset of each line.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Starting offset of each line (`line_starts[0]` is always 0)
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Build a line map from source text.
    #[must_use]
    pub fn build(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a line/column position.
    #[must_use]
    pub fn position(&self, offset: u32) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_point) => insert_point.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        Position {
            line: u32::try_from(line).unwrap_or(u32::MAX),
            column: offset.saturating_sub(line_start),
        }
    }

    /// Number of lines in the mapped source.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_of_offsets() {
        let map = LineMap::build("event a;\nevent b;\n");
        assert_eq!(map.position(0), Position::new(0, 0));
        assert_eq!(map.position(6), Position::new(0, 6));
        assert_eq!(map.position(9), Position::new(1, 0));
        assert_eq!(map.position(15), Position::new(1, 6));
        assert_eq!(map.line_count(), 3);
    }

    #[test]
    fn empty_source_has_one_line() {
        let map = LineMap::build("");
        assert_eq!(map.line_count(), 1);
        assert_eq!(map.position(0), Position::new(0, 0));
    }
}
