//! Source locations and ranges shared by every feature.

use serde::{Deserialize, Serialize};

/// A single point in a source file (1-based line, 0-based column).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// File path, as reported by the parser front-end
    pub file: String,
    /// 1-based line number
    pub line: u32,
    /// 0-based column
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Inclusive source range covered by a declaration or statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: Location,
    pub end: Location,
}

impl SourceRange {
    pub fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }

    /// Range spanning the given lines of a file, columns zeroed.
    pub fn lines(file: impl Into<String>, start_line: u32, end_line: u32) -> Self {
        let file = file.into();
        Self {
            start: Location::new(file.clone(), start_line, 0),
            end: Location::new(file, end_line, 0),
        }
    }

    /// True when `location` lies within this range's line span of the same file.
    pub fn contains_line(&self, location: &Location) -> bool {
        location.file == self.start.file
            && location.line >= self.start.line
            && location.line <= self.end.line
    }

    /// True when the line spans of two same-file ranges intersect.
    pub fn overlaps_lines(&self, other: &SourceRange) -> bool {
        self.start.file == other.start.file
            && self.start.line <= other.end.line
            && other.start.line <= self.end.line
    }
}
