//! The one-match-at-a-time lookup primitive and its in-memory table backend.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::artifacts::ResourceRegistry;
use crate::app::history::NavigationHistory;
use crate::domain::model::{Location, Position, SourceId};

/// Result of one successful probe. Only probes construct these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchHandle {
    pub source: SourceId,
    pub locator: PathBuf,
    pub position: Position,
    pub line_text: String,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("lookup has not been started")]
    NotStarted,
    #[error("no more matches")]
    Exhausted,
    #[error("failed to open {}", path.display())]
    Visit {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("search failed in {}: {message}", path.display())]
    Search { path: PathBuf, message: String },
}

/// Host services a probe may touch while it runs.
pub struct ProbeContext<'a> {
    pub history: &'a mut dyn NavigationHistory,
    pub resources: &'a mut dyn ResourceRegistry,
}

/// Stateful enumeration of matches for one identifier.
///
/// `next` is only meaningful after a successful `first`; anything else yields an error that
/// callers treat as the end of the enumeration.
pub trait Probe {
    fn first(
        &mut self,
        identifier: &str,
        ctx: &mut ProbeContext<'_>,
    ) -> Result<Option<MatchHandle>, ProbeError>;

    fn next(
        &mut self,
        identifier: &str,
        ctx: &mut ProbeContext<'_>,
    ) -> Result<Option<MatchHandle>, ProbeError>;
}

/// One row of a host-supplied tag table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    pub name: String,
    pub path: PathBuf,
    pub line: usize,
    #[serde(default = "TagEntry::default_column")]
    pub column: usize,
    #[serde(default)]
    pub text: String,
}

impl TagEntry {
    fn default_column() -> usize {
        1
    }
}

/// Classic lookup over an in-memory table of entries.
///
/// Like a traditional find-tag, every visited match leaves a mark on the navigation history.
#[derive(Debug, Clone, Default)]
pub struct TableProbe {
    entries: Vec<TagEntry>,
    ignore_case: bool,
    cursor: Option<usize>,
    finished: bool,
}

impl TableProbe {
    pub fn new(entries: Vec<TagEntry>) -> Self {
        Self {
            entries,
            ignore_case: false,
            cursor: None,
            finished: false,
        }
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn matches(&self, entry: &TagEntry, identifier: &str) -> bool {
        if self.ignore_case {
            entry.name.eq_ignore_ascii_case(identifier)
        } else {
            entry.name == identifier
        }
    }

    fn advance(
        &mut self,
        from: usize,
        identifier: &str,
        ctx: &mut ProbeContext<'_>,
    ) -> Result<Option<MatchHandle>, ProbeError> {
        let found = self.entries[from.min(self.entries.len())..]
            .iter()
            .position(|entry| self.matches(entry, identifier))
            .map(|offset| from + offset);

        let Some(index) = found else {
            self.cursor = Some(self.entries.len());
            self.finished = true;
            return Ok(None);
        };
        self.cursor = Some(index + 1);

        let entry = &self.entries[index];
        let source = ctx
            .resources
            .visit(&entry.path)
            .map_err(|source| ProbeError::Visit {
                path: entry.path.clone(),
                source,
            })?;
        let position = Position::new(entry.line, entry.column);
        ctx.history
            .push(Location::new(entry.path.clone(), position));

        Ok(Some(MatchHandle {
            source,
            locator: entry.path.clone(),
            position,
            line_text: entry.text.clone(),
        }))
    }
}

impl Probe for TableProbe {
    fn first(
        &mut self,
        identifier: &str,
        ctx: &mut ProbeContext<'_>,
    ) -> Result<Option<MatchHandle>, ProbeError> {
        self.finished = false;
        self.advance(0, identifier, ctx)
    }

    fn next(
        &mut self,
        identifier: &str,
        ctx: &mut ProbeContext<'_>,
    ) -> Result<Option<MatchHandle>, ProbeError> {
        match self.cursor {
            None => Err(ProbeError::NotStarted),
            Some(_) if self.finished => Err(ProbeError::Exhausted),
            Some(cursor) => self.advance(cursor, identifier, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::app::history::MarkStack;
    use crate::infra::workspace::Workspace;

    fn entry(name: &str, path: &std::path::Path, line: usize) -> TagEntry {
        TagEntry {
            name: name.into(),
            path: path.to_path_buf(),
            line,
            column: 1,
            text: format!("fn {name}()"),
        }
    }

    #[test]
    fn enumerates_matching_entries_in_table_order() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("a.rs");
        std::fs::write(&file, "fn run() {}\nfn other() {}\nfn run() {}\n")?;

        let mut probe = TableProbe::new(vec![
            entry("run", &file, 1),
            entry("other", &file, 2),
            entry("run", &file, 3),
        ]);
        let mut history = MarkStack::new();
        let mut workspace = Workspace::new();
        let mut ctx = ProbeContext {
            history: &mut history,
            resources: &mut workspace,
        };

        let first = probe.first("run", &mut ctx)?.expect("first match");
        assert_eq!(first.position.line, 1);
        let second = probe.next("run", &mut ctx)?.expect("second match");
        assert_eq!(second.position.line, 3);
        assert!(probe.next("run", &mut ctx)?.is_none());
        assert!(matches!(probe.next("run", &mut ctx), Err(ProbeError::Exhausted)));
        assert_eq!(history.depth(), 2);
        Ok(())
    }

    #[test]
    fn trailing_match_still_ends_cleanly() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("a.rs");
        std::fs::write(&file, "fn run() {}\n")?;

        let mut probe = TableProbe::new(vec![entry("run", &file, 1)]);
        let mut history = MarkStack::new();
        let mut workspace = Workspace::new();
        let mut ctx = ProbeContext {
            history: &mut history,
            resources: &mut workspace,
        };

        assert!(probe.first("run", &mut ctx)?.is_some());
        assert!(probe.next("run", &mut ctx)?.is_none());
        assert!(matches!(probe.next("run", &mut ctx), Err(ProbeError::Exhausted)));

        assert!(probe.first("run", &mut ctx)?.is_some());
        assert!(probe.next("run", &mut ctx)?.is_none());
        Ok(())
    }

    #[test]
    fn next_before_first_is_an_error() {
        let mut probe = TableProbe::new(Vec::new());
        let mut history = MarkStack::new();
        let mut workspace = Workspace::new();
        let mut ctx = ProbeContext {
            history: &mut history,
            resources: &mut workspace,
        };
        assert!(matches!(probe.next("x", &mut ctx), Err(ProbeError::NotStarted)));
    }

    #[test]
    fn case_folding_is_opt_in() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("a.rs");
        std::fs::write(&file, "struct Widget;\n")?;

        let mut history = MarkStack::new();
        let mut workspace = Workspace::new();
        let mut ctx = ProbeContext {
            history: &mut history,
            resources: &mut workspace,
        };

        let mut strict = TableProbe::new(vec![entry("Widget", &file, 1)]);
        assert!(strict.first("widget", &mut ctx)?.is_none());

        let mut folded = TableProbe::new(vec![entry("Widget", &file, 1)]).ignore_case(true);
        assert!(folded.first("widget", &mut ctx)?.is_some());
        Ok(())
    }
}
