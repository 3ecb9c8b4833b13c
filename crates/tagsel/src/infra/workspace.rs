//! In-process buffer registry backing the command-line host.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::app::artifacts::ResourceRegistry;
use crate::domain::model::SourceId;

/// A source file held open in memory.
#[derive(Debug, Clone)]
pub struct Buffer {
    pub path: PathBuf,
    pub text: String,
}

impl Buffer {
    /// Text of the 1-based `line`, without its terminator.
    pub fn line(&self, line: usize) -> Option<&str> {
        self.text.lines().nth(line.checked_sub(1)?)
    }
}

/// Open buffers keyed by identity, with a path index for reuse.
#[derive(Debug, Default)]
pub struct Workspace {
    buffers: BTreeMap<SourceId, Buffer>,
    by_path: HashMap<PathBuf, SourceId>,
    next_id: u64,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self, source: SourceId) -> Option<&Buffer> {
        self.buffers.get(&source)
    }

    pub fn source_for(&self, path: &Path) -> Option<SourceId> {
        self.by_path.get(&normalize(path)).copied()
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl ResourceRegistry for Workspace {
    fn open_resources(&self) -> Vec<SourceId> {
        self.buffers.keys().copied().collect()
    }

    fn visit(&mut self, path: &Path) -> io::Result<SourceId> {
        let key = normalize(path);
        if let Some(source) = self.by_path.get(&key) {
            return Ok(*source);
        }

        let bytes = fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes).into_owned();

        self.next_id += 1;
        let source = SourceId::new(self.next_id);
        self.buffers.insert(
            source,
            Buffer {
                path: path.to_path_buf(),
                text,
            },
        );
        self.by_path.insert(key, source);
        tracing::trace!(%source, path = %path.display(), "buffer opened");
        Ok(source)
    }

    fn close_silently(&mut self, source: SourceId) {
        if let Some(buffer) = self.buffers.remove(&source) {
            self.by_path.remove(&normalize(&buffer.path));
            tracing::trace!(%source, path = %buffer.path.display(), "buffer closed");
        }
    }

    fn is_open(&self, source: SourceId) -> bool {
        self.buffers.contains_key(&source)
    }
}

fn normalize(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
