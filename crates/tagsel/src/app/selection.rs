//! Numbered, file-grouped presentation of aggregated matches and its navigation state machine.

use std::collections::BTreeMap;

use crate::app::find::Navigator;
use crate::app::history::NavigationHistory;
use crate::app::naming::SessionNames;
use crate::domain::errors::{Direction, TagError};
use crate::domain::model::{FileGroup, JumpTarget, Match};
use crate::infra::config::Select;

/// What a rendered line represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Header,
    Blank,
    FileHeader,
    Match { number: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderLine {
    pub kind: LineKind,
    pub text: String,
}

impl RenderLine {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn number(&self) -> Option<usize> {
        match self.kind {
            LineKind::Match { number } => Some(number),
            _ => None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.number().is_some()
    }
}

/// How a typed digit resolves to a tag number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumberChoice {
    /// The digit alone names the tag.
    Immediate(String),
    /// The user must complete the number, starting from `initial`.
    NeedsCompletion { initial: String },
}

#[derive(Debug, Clone)]
struct IndexedMatch {
    number: usize,
    entry: Match,
}

/// One aggregation's results, numbered and navigable.
#[derive(Debug, Clone)]
pub struct SelectionSession {
    name: String,
    identifier: String,
    lines: Vec<RenderLine>,
    index: BTreeMap<usize, IndexedMatch>,
    cursor: usize,
}

impl SelectionSession {
    /// Number matches 1..N across `groups` and lay out the render model.
    pub fn build(
        name: impl Into<String>,
        identifier: &str,
        groups: Vec<FileGroup>,
    ) -> Result<Self, TagError> {
        let mut lines = vec![RenderLine::new(
            LineKind::Header,
            format!("Finding tag: {identifier}"),
        )];
        let mut index = BTreeMap::new();
        let mut number = 0;

        for group in groups.into_iter().filter(|group| !group.is_empty()) {
            lines.push(RenderLine::new(LineKind::Blank, ""));
            lines.push(RenderLine::new(
                LineKind::FileHeader,
                format!("In: {}", group.locator.display()),
            ));
            for entry in group.matches {
                number += 1;
                index.insert(lines.len(), IndexedMatch { number, entry: entry.clone() });
                lines.push(RenderLine::new(
                    LineKind::Match { number },
                    format!("{number} {}", entry.line_text.trim_end()),
                ));
            }
        }

        let Some(&cursor) = index.keys().next() else {
            return Err(TagError::no_matches(identifier));
        };

        Ok(Self {
            name: name.into(),
            identifier: identifier.to_string(),
            lines,
            index,
            cursor,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn lines(&self) -> &[RenderLine] {
        &self.lines
    }

    pub fn cursor_line(&self) -> usize {
        self.cursor
    }

    /// Move the cursor anywhere, clamped to the render model.
    pub fn set_cursor_line(&mut self, line: usize) {
        self.cursor = line.min(self.lines.len().saturating_sub(1));
    }

    pub fn match_count(&self) -> usize {
        self.index.len()
    }

    /// Matches in number order.
    pub fn matches(&self) -> impl Iterator<Item = (usize, &Match)> {
        self.index.values().map(|indexed| (indexed.number, &indexed.entry))
    }

    /// Jump target for a rendered line, when it is a match line.
    pub fn target_at(&self, line: usize, other_window: bool) -> Option<JumpTarget> {
        self.index.get(&line).map(|indexed| JumpTarget {
            locator: indexed.entry.locator.clone(),
            position: indexed.entry.position,
            other_window,
        })
    }

    /// Plain-text rendering of the whole model.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }

    /// Move to the next match line. At the end the cursor stays put.
    pub fn next_tag(&mut self) -> Result<usize, TagError> {
        let found = self
            .index
            .range(self.cursor + 1..)
            .next()
            .map(|(line, _)| *line);
        self.land(found, Direction::Forward)
    }

    /// Move to the previous match line. At the start the cursor stays put.
    pub fn previous_tag(&mut self) -> Result<usize, TagError> {
        let found = self
            .index
            .range(..self.cursor)
            .next_back()
            .map(|(line, _)| *line);
        self.land(found, Direction::Backward)
    }

    fn land(&mut self, found: Option<usize>, direction: Direction) -> Result<usize, TagError> {
        match found {
            Some(line) => {
                self.cursor = line;
                Ok(line)
            }
            None => Err(TagError::BoundaryReached { direction }),
        }
    }

    /// Jump to the match under the cursor, recording where the user came from.
    pub fn goto_tag(
        &mut self,
        other_window: bool,
        options: &Select,
        history: &mut dyn NavigationHistory,
        navigator: &mut dyn Navigator,
    ) -> Result<JumpTarget, TagError> {
        let target = self
            .target_at(self.cursor, other_window)
            .ok_or(TagError::CursorNotOnTagLine {
                line: self.cursor + 1,
            })?;

        let before = history.snapshot();
        if let Some(origin) = navigator.current_location() {
            history.push(origin);
        }

        if let Err(source) = navigator.open(&target) {
            history.restore(before);
            return Err(TagError::Jump { target, source });
        }
        tracing::info!(tag = %self.identifier, target = %target, other_window, "jumped to tag");

        if options.highlight_after_jump() {
            navigator.highlight(&target, options.highlight_duration());
        }
        Ok(target)
    }

    /// Decide whether `digit` already names a tag or needs completing.
    pub fn resolve_number_prefix(&self, digit: char, options: &Select) -> NumberChoice {
        let prefix = digit.to_string();
        let candidates = self
            .index
            .values()
            .filter(|indexed| indexed.number.to_string().starts_with(&prefix))
            .take(2)
            .count();

        if options.go_if_unambiguous() && candidates < 2 {
            NumberChoice::Immediate(prefix)
        } else {
            NumberChoice::NeedsCompletion { initial: prefix }
        }
    }

    /// Jump to the tag numbered exactly `number`.
    pub fn select_number(
        &mut self,
        number: &str,
        other_window: bool,
        options: &Select,
        history: &mut dyn NavigationHistory,
        navigator: &mut dyn Navigator,
    ) -> Result<JumpTarget, TagError> {
        let wanted = number.trim();
        let line = self
            .index
            .iter()
            .find(|(_, indexed)| indexed.number.to_string() == wanted)
            .map(|(line, _)| *line);

        let Some(line) = line else {
            return Err(TagError::TagNumberNotFound {
                number: wanted.to_string(),
            });
        };
        self.cursor = line;
        self.goto_tag(other_window, options, history, navigator)
    }

    /// Digit-key selection: jump directly when unambiguous, otherwise ask for the full number.
    pub fn select_by_number(
        &mut self,
        digit: char,
        other_window: bool,
        options: &Select,
        history: &mut dyn NavigationHistory,
        navigator: &mut dyn Navigator,
    ) -> Result<JumpTarget, TagError> {
        let number = match self.resolve_number_prefix(digit, options) {
            NumberChoice::Immediate(number) => number,
            NumberChoice::NeedsCompletion { initial } => {
                match navigator.read_tag_number(&initial) {
                    Some(number) => number,
                    None => return Err(TagError::TagNumberNotFound { number: initial }),
                }
            }
        };
        self.select_number(&number, other_window, options, history, navigator)
    }

    /// Dispose of the session.
    pub fn quit(self, names: &mut SessionNames) {
        names.release(&self.name);
        tracing::debug!(session = %self.name, "session closed");
    }
}
