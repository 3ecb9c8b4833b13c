//! Domain models for matches, file groups, and jump targets.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Opaque identity of an open source resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 1-based line and column inside a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            line: line.max(1),
            column: column.max(1),
        }
    }
}

/// A point the user can navigate back to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: PathBuf,
    pub position: Position,
}

impl Location {
    pub fn new(path: impl Into<PathBuf>, position: Position) -> Self {
        Self {
            path: path.into(),
            position,
        }
    }

    /// Parse `path:line` or `path:line:column`. A bare path points at line 1.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let Some((head, tail)) = raw.rsplit_once(':') else {
            return Some(Self::new(raw, Position::new(1, 1)));
        };
        let Ok(trailing) = tail.parse::<usize>() else {
            return Some(Self::new(raw, Position::new(1, 1)));
        };

        if let Some((path, line)) = head.rsplit_once(':')
            && let Ok(line) = line.parse::<usize>()
            && !path.is_empty()
        {
            return Some(Self::new(path, Position::new(line, trailing)));
        }

        if head.is_empty() {
            return None;
        }
        Some(Self::new(head, Position::new(trailing, 1)))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.path.display(),
            self.position.line,
            self.position.column
        )
    }
}

/// Durable copy of one probe result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub source: SourceId,
    pub locator: PathBuf,
    pub line_text: String,
    pub position: Position,
}

/// Matches from one source, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGroup {
    pub locator: PathBuf,
    pub source: SourceId,
    pub matches: Vec<Match>,
}

impl FileGroup {
    pub fn locator(&self) -> &Path {
        &self.locator
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Where the host should take the user after a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpTarget {
    pub locator: PathBuf,
    pub position: Position,
    pub other_window: bool,
}

impl JumpTarget {
    pub fn location(&self) -> Location {
        Location::new(self.locator.clone(), self.position)
    }
}

impl fmt::Display for JumpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.location().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_path_line_and_column() {
        let location = Location::parse("src/lib.rs:12:5").unwrap();
        assert_eq!(location.path, PathBuf::from("src/lib.rs"));
        assert_eq!(location.position, Position::new(12, 5));
    }

    #[test]
    fn parses_path_and_line() {
        let location = Location::parse("src/lib.rs:12").unwrap();
        assert_eq!(location.position, Position::new(12, 1));
    }

    #[test]
    fn bare_path_points_at_first_line() {
        let location = Location::parse("README.md").unwrap();
        assert_eq!(location.path, PathBuf::from("README.md"));
        assert_eq!(location.position, Position::new(1, 1));
        assert!(Location::parse("  ").is_none());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let location = Location::new("a/b.rs", Position::new(3, 7));
        assert_eq!(Location::parse(&location.to_string()), Some(location));
    }
}
