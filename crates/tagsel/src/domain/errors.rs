//! Domain-specific errors.

use std::fmt;

use thiserror::Error;

use crate::domain::model::JumpTarget;

/// Scan direction used when reporting a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("last"),
            Direction::Backward => f.write_str("first"),
        }
    }
}

/// User-visible, non-fatal outcomes of tag lookup and selection.
#[derive(Debug, Error)]
pub enum TagError {
    #[error("no matches for tag `{identifier}`")]
    NoMatches { identifier: String },
    #[error("tag lookup ended early")]
    ProbeExhausted,
    #[error("line {line} is not a tag line")]
    CursorNotOnTagLine { line: usize },
    #[error("no tag numbered {number}")]
    TagNumberNotFound { number: String },
    #[error("already at the {direction} tag")]
    BoundaryReached { direction: Direction },
    #[error("failed to open {target}")]
    Jump {
        target: JumpTarget,
        #[source]
        source: anyhow::Error,
    },
}

impl TagError {
    pub fn no_matches(identifier: impl Into<String>) -> Self {
        Self::NoMatches {
            identifier: identifier.into(),
        }
    }

    /// Boundary alerts are informational; everything else is an error to report.
    pub fn is_alert(&self) -> bool {
        matches!(self, Self::BoundaryReached { .. })
    }
}
