//! Highlighted excerpts of a file centred on a jump target.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::domain::model::JumpTarget;
use crate::infra::config::Ui;
use crate::infra::highlight::{Highlighted, Highlighter};

const FALLBACK_HEIGHT: usize = 40;

/// A slice of a file ready for display.
#[derive(Debug, Clone)]
pub struct PreviewWindow {
    pub path: PathBuf,
    /// 1-based number of the first line in `highlighted`.
    pub first_line: usize,
    /// 1-based line the window is centred on.
    pub focus_line: usize,
    pub highlighted: Highlighted,
    pub notice: Option<String>,
}

impl PreviewWindow {
    pub fn last_line(&self) -> usize {
        self.first_line + self.highlighted.lines.len().saturating_sub(1)
    }

    /// Index into `highlighted.lines` of the focus line, if it is inside the window.
    pub fn focus_offset(&self) -> Option<usize> {
        let offset = self.focus_line.checked_sub(self.first_line)?;
        (offset < self.highlighted.lines.len()).then_some(offset)
    }
}

#[derive(Debug, Default)]
pub struct PreviewService {
    highlighter: Highlighter,
}

impl PreviewService {
    pub fn new() -> Self {
        Self {
            highlighter: Highlighter::new(),
        }
    }

    pub fn around(&self, target: &JumpTarget, ui: &Ui) -> Result<PreviewWindow> {
        self.window(&target.locator, target.position.line, ui)
    }

    /// Read about `ui.preview_lines` lines with `line` near the middle.
    pub fn window(&self, path: &Path, line: usize, ui: &Ui) -> Result<PreviewWindow> {
        if !path.exists() {
            bail!("file not found: {}", path.display());
        }

        let height = if ui.preview_lines == 0 {
            FALLBACK_HEIGHT
        } else {
            ui.preview_lines
        };
        let focus_line = line.max(1);
        let start = focus_line.saturating_sub(height / 2 + 1);

        if is_binary(path)? {
            return Ok(PreviewWindow {
                path: path.to_path_buf(),
                first_line: start + 1,
                focus_line,
                highlighted: self.highlighter.highlight(path, &[], &ui.theme),
                notice: Some(format!("{} looks binary; nothing to show.", path.display())),
            });
        }

        let (lines, lossy) = read_lines(path, start, height)?;
        let (highlighted, notice) = if lossy {
            // Lossy text stays uncoloured.
            let plain = self
                .highlighter
                .highlight(Path::new(""), &lines, &ui.theme);
            (plain, Some("Shown without colours: file is not valid UTF-8.".to_string()))
        } else {
            (self.highlighter.highlight(path, &lines, &ui.theme), None)
        };

        Ok(PreviewWindow {
            path: path.to_path_buf(),
            first_line: start + 1,
            focus_line,
            highlighted,
            notice,
        })
    }
}

fn is_binary(path: &Path) -> Result<bool> {
    let mut file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut buf = [0u8; 1024];
    let read = file.read(&mut buf)?;
    Ok(buf[..read].contains(&0))
}

/// Lines `start..start + count` (0-based), plus whether any needed lossy decoding.
fn read_lines(path: &Path, start: usize, count: usize) -> Result<(Vec<String>, bool)> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut raw = Vec::new();
    let mut lines = Vec::with_capacity(count);
    let mut lossy = false;
    let mut index = 0;

    while lines.len() < count {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        if index >= start {
            while raw.last().is_some_and(|byte| *byte == b'\n' || *byte == b'\r') {
                raw.pop();
            }
            let text = String::from_utf8_lossy(&raw);
            lossy |= matches!(text, Cow::Owned(_));
            lines.push(text.into_owned());
        }
        index += 1;
    }

    Ok((lines, lossy))
}
