//! Loading host-supplied tag tables from disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::probe::{TableProbe, TagEntry};
use crate::infra::config::Lookup;

/// Read a JSON array of tag entries. Relative entry paths resolve against `base`.
pub fn load_entries(path: &Path, base: &Path) -> Result<Vec<TagEntry>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read tag table: {}", path.display()))?;
    let mut entries: Vec<TagEntry> = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse tag table: {}", path.display()))?;

    if base != Path::new(".") {
        for entry in entries.iter_mut().filter(|entry| entry.path.is_relative()) {
            entry.path = base.join(&entry.path);
        }
    }
    tracing::debug!(path = %path.display(), entries = entries.len(), "loaded tag table");
    Ok(entries)
}

/// Build a [`TableProbe`] from the table configured under `root`.
pub fn open_table(root: &Path, lookup: &Lookup) -> Result<TableProbe> {
    let table = resolve(root, &lookup.table);
    let entries = load_entries(&table, root)?;
    Ok(TableProbe::new(entries).ignore_case(lookup.ignore_case))
}

fn resolve(root: &Path, table: &Path) -> PathBuf {
    if table.is_absolute() {
        table.to_path_buf()
    } else {
        root.join(table)
    }
}
