//! Mark stack persistence between command-line invocations.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::app::history::{MarkStack, NavigationHistory};
use crate::domain::model::Location;

const STORE_DIR: &str = ".tagsel";
const STORE_FILE: &str = "history.json";

/// Serialized form of the mark stack.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct HistoryRecord {
    /// Marks from oldest to newest.
    pub marks: Vec<Location>,
    /// When the record was last written.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub saved_at: Option<OffsetDateTime>,
}

impl HistoryRecord {
    pub fn from_stack(stack: &MarkStack) -> Self {
        Self {
            marks: stack.iter().cloned().collect(),
            saved_at: None,
        }
    }

    /// Rebuild a stack, keeping at most `capacity` of the newest marks.
    pub fn into_stack(self, capacity: usize) -> MarkStack {
        let mut stack = MarkStack::with_capacity(capacity);
        for mark in self.marks {
            stack.push(mark);
        }
        stack
    }
}

/// Persists the mark stack to a JSON file under `.tagsel/`.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    root: PathBuf,
    path: PathBuf,
}

impl HistoryStore {
    /// Create a new store rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let path = root.join(STORE_DIR).join(STORE_FILE);
        Self { root, path }
    }

    /// Location of the persisted history file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw persisted record; empty when nothing was saved yet.
    pub fn load_record(&self) -> Result<HistoryRecord> {
        if !self.path.exists() {
            return Ok(HistoryRecord::default());
        }

        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read history file at {}", self.path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("invalid history data in {}", self.path.display()))
    }

    /// Load the persisted stack, keeping at most `capacity` of the newest marks.
    pub fn load(&self, capacity: usize) -> Result<MarkStack> {
        Ok(self.load_record()?.into_stack(capacity))
    }

    /// Persist the stack, creating parent directories as needed.
    pub fn save(&self, stack: &MarkStack) -> Result<()> {
        let dir = self.path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create history directory {}", dir.display()))?;

        let mut record = HistoryRecord::from_stack(stack);
        record.saved_at = Some(OffsetDateTime::now_utc());
        let data =
            serde_json::to_string_pretty(&record).context("failed to serialize mark stack")?;
        fs::write(&self.path, data)
            .with_context(|| format!("failed to write history file to {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), depth = stack.depth(), "history saved");
        Ok(())
    }
}
