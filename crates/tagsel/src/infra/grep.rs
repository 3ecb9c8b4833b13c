//! Lookup backend that searches the working tree for whole-word occurrences.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use grep_regex::{RegexMatcher, RegexMatcherBuilder};
use grep_searcher::sinks::Lossy;
use grep_searcher::{BinaryDetection, Searcher, SearcherBuilder};
use ignore::WalkBuilder;
use regex::{Regex, RegexBuilder};

use crate::app::probe::{MatchHandle, Probe, ProbeContext, ProbeError};
use crate::domain::model::Position;
use crate::infra::config::Lookup;

/// Compiled search for one identifier.
struct Query {
    identifier: String,
    matcher: RegexMatcher,
    column: Regex,
}

struct Hit {
    line: usize,
    column: usize,
    text: String,
}

/// Walks files under `root` in path order and yields every whole-word hit.
pub struct GrepProbe {
    root: PathBuf,
    ignore_case: bool,
    exclude: Arc<GlobSet>,
    query: Option<Query>,
    files: Vec<PathBuf>,
    next_file: usize,
    pending: VecDeque<MatchHandle>,
    finished: bool,
}

impl GrepProbe {
    pub fn new(root: impl Into<PathBuf>, lookup: &Lookup) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            ignore_case: lookup.ignore_case,
            exclude: Arc::new(build_exclude_set(&lookup.exclude)?),
            query: None,
            files: Vec::new(),
            next_file: 0,
            pending: VecDeque::new(),
            finished: false,
        })
    }

    fn compile(&self, identifier: &str) -> Result<Query, ProbeError> {
        let escaped = regex::escape(identifier);
        let search_error = |message: String| ProbeError::Search {
            path: self.root.clone(),
            message,
        };

        let matcher = RegexMatcherBuilder::new()
            .case_insensitive(self.ignore_case)
            .word(true)
            .build(&escaped)
            .map_err(|err| search_error(err.to_string()))?;
        let column = RegexBuilder::new(&format!(r"(?:^|\W)({escaped})(?:\W|$)"))
            .case_insensitive(self.ignore_case)
            .build()
            .map_err(|err| search_error(err.to_string()))?;

        Ok(Query {
            identifier: identifier.to_string(),
            matcher,
            column,
        })
    }

    fn collect_files(&self) -> Vec<PathBuf> {
        let root = self.root.clone();
        let exclude = Arc::clone(&self.exclude);
        let mut builder = WalkBuilder::new(&self.root);
        builder.git_ignore(true).sort_by_file_path(|a, b| a.cmp(b));
        builder.filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let rel = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            !exclude.is_match(rel)
        });

        let mut files = Vec::new();
        for result in builder.build() {
            match result {
                Ok(entry) if entry.file_type().is_some_and(|kind| kind.is_file()) => {
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(err) => tracing::warn!(error = %err, "walk error"),
            }
        }
        files
    }

    fn advance(&mut self, ctx: &mut ProbeContext<'_>) -> Result<Option<MatchHandle>, ProbeError> {
        loop {
            if let Some(handle) = self.pending.pop_front() {
                return Ok(Some(handle));
            }
            let Some(path) = self.files.get(self.next_file).cloned() else {
                self.finished = true;
                return Ok(None);
            };
            self.next_file += 1;

            let Some(query) = self.query.as_ref() else {
                return Err(ProbeError::NotStarted);
            };
            let hits = match search_file(query, &path) {
                Ok(hits) => hits,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable file");
                    continue;
                }
            };
            if hits.is_empty() {
                continue;
            }

            let source = ctx
                .resources
                .visit(&path)
                .map_err(|source| ProbeError::Visit {
                    path: path.clone(),
                    source,
                })?;
            let locator = display_path(&path);
            tracing::trace!(
                identifier = %query.identifier,
                path = %locator.display(),
                hits = hits.len(),
                "file matched"
            );
            self.pending.extend(hits.into_iter().map(|hit| MatchHandle {
                source,
                locator: locator.clone(),
                position: Position::new(hit.line, hit.column),
                line_text: hit.text,
            }));
        }
    }
}

impl Probe for GrepProbe {
    fn first(
        &mut self,
        identifier: &str,
        ctx: &mut ProbeContext<'_>,
    ) -> Result<Option<MatchHandle>, ProbeError> {
        self.query = Some(self.compile(identifier)?);
        self.files = self.collect_files();
        self.next_file = 0;
        self.pending.clear();
        self.finished = false;
        tracing::debug!(identifier, files = self.files.len(), root = %self.root.display(), "grep lookup started");
        self.advance(ctx)
    }

    fn next(
        &mut self,
        identifier: &str,
        ctx: &mut ProbeContext<'_>,
    ) -> Result<Option<MatchHandle>, ProbeError> {
        match &self.query {
            None => return Err(ProbeError::NotStarted),
            Some(query) if query.identifier != identifier => return Err(ProbeError::NotStarted),
            Some(_) => {}
        }
        if self.finished {
            return Err(ProbeError::Exhausted);
        }
        self.advance(ctx)
    }
}

fn search_file(query: &Query, path: &Path) -> std::io::Result<Vec<Hit>> {
    let mut searcher: Searcher = SearcherBuilder::new()
        .line_number(true)
        .binary_detection(BinaryDetection::quit(b'\x00'))
        .build();

    let mut hits = Vec::new();
    searcher.search_path(
        &query.matcher,
        path,
        Lossy(|line_number, line| {
            let text = line.trim_end_matches(['\r', '\n']).to_string();
            let column = query
                .column
                .captures(&text)
                .and_then(|caps| caps.get(1))
                .map(|found| text[..found.start()].chars().count() + 1)
                .unwrap_or(1);
            hits.push(Hit {
                line: line_number as usize,
                column,
                text,
            });
            Ok(true)
        }),
    )?;
    Ok(hits)
}

fn display_path(path: &Path) -> PathBuf {
    path.strip_prefix(".").unwrap_or(path).to_path_buf()
}

fn build_exclude_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        for expanded in expand_dir_pattern(pattern) {
            let glob = Glob::new(&expanded)
                .with_context(|| format!("invalid exclude pattern '{pattern}'"))?;
            builder.add(glob);
        }
    }
    builder.build().context("failed to build exclude matcher")
}

fn expand_dir_pattern(raw: &str) -> Vec<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    vec![
        trimmed.to_owned(),
        format!("{trimmed}/**"),
        format!("**/{trimmed}"),
        format!("**/{trimmed}/**"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::app::history::MarkStack;
    use crate::infra::workspace::Workspace;

    fn drain(probe: &mut GrepProbe, identifier: &str) -> anyhow::Result<Vec<(String, usize, usize)>> {
        let mut history = MarkStack::new();
        let mut workspace = Workspace::new();
        let mut ctx = ProbeContext {
            history: &mut history,
            resources: &mut workspace,
        };
        let mut out = Vec::new();
        let mut current = probe.first(identifier, &mut ctx)?;
        while let Some(handle) = current {
            let name = handle
                .locator
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            out.push((name, handle.position.line, handle.position.column));
            current = probe.next(identifier, &mut ctx)?;
        }
        Ok(out)
    }

    #[test]
    fn finds_whole_words_in_path_order() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        fs::create_dir_all(root.join("src"))?;
        fs::write(root.join("src/b.rs"), "fn render() {}\nlet x = render();\n")?;
        fs::write(root.join("src/a.rs"), "use crate::render;\nfn renderer() {}\n")?;

        let mut probe = GrepProbe::new(root, &Lookup::default())?;
        let hits = drain(&mut probe, "render")?;

        assert_eq!(
            hits,
            vec![
                ("a.rs".to_string(), 1, 12),
                ("b.rs".to_string(), 1, 4),
                ("b.rs".to_string(), 2, 9),
            ]
        );
        Ok(())
    }

    #[test]
    fn column_skips_longer_words_earlier_on_the_line() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("a.rs"), "let renderer = render();\nrender_all(render);\n")?;

        let mut probe = GrepProbe::new(dir.path(), &Lookup::default())?;
        let hits = drain(&mut probe, "render")?;

        assert_eq!(
            hits,
            vec![("a.rs".to_string(), 1, 16), ("a.rs".to_string(), 2, 12)]
        );
        Ok(())
    }

    #[test]
    fn respects_exclude_patterns() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        fs::create_dir_all(root.join("target/debug"))?;
        fs::create_dir_all(root.join("src"))?;
        fs::write(root.join("target/debug/gen.rs"), "fn render() {}\n")?;
        fs::write(root.join("src/lib.rs"), "fn render() {}\n")?;

        let mut probe = GrepProbe::new(root, &Lookup::default())?;
        let hits = drain(&mut probe, "render")?;

        assert_eq!(hits, vec![("lib.rs".to_string(), 1, 4)]);
        Ok(())
    }

    #[test]
    fn ignore_case_is_configurable() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("a.rs"), "struct Widget;\n")?;

        let mut strict = GrepProbe::new(dir.path(), &Lookup::default())?;
        assert!(drain(&mut strict, "widget")?.is_empty());

        let lookup = Lookup {
            ignore_case: true,
            ..Lookup::default()
        };
        let mut folded = GrepProbe::new(dir.path(), &lookup)?;
        assert_eq!(drain(&mut folded, "widget")?.len(), 1);
        Ok(())
    }

    #[test]
    fn next_after_exhaustion_errors() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("a.rs"), "fn solo() {}\n")?;

        let mut probe = GrepProbe::new(dir.path(), &Lookup::default())?;
        let mut history = MarkStack::new();
        let mut workspace = Workspace::new();
        let mut ctx = ProbeContext {
            history: &mut history,
            resources: &mut workspace,
        };

        assert!(matches!(probe.next("solo", &mut ctx), Err(ProbeError::NotStarted)));
        assert!(probe.first("solo", &mut ctx)?.is_some());
        assert!(probe.next("solo", &mut ctx)?.is_none());
        assert!(matches!(probe.next("solo", &mut ctx), Err(ProbeError::Exhausted)));
        assert_eq!(workspace.len(), 1);
        Ok(())
    }
}
