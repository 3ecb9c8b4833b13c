//! Navigation history (the mark stack) and scoped restore around probing.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::domain::model::Location;

/// Back-navigation history owned by the host.
pub trait NavigationHistory {
    fn push(&mut self, location: Location);
    fn pop(&mut self) -> Option<Location>;
    fn depth(&self) -> usize;
    fn snapshot(&self) -> MarkStackSnapshot;
    fn restore(&mut self, snapshot: MarkStackSnapshot);
}

/// Opaque value copy of a history stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkStackSnapshot {
    entries: VecDeque<Location>,
}

/// In-memory mark stack. When `capacity` is set the oldest marks fall off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkStack {
    entries: VecDeque<Location>,
    #[serde(default)]
    capacity: Option<usize>,
}

impl MarkStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: (capacity > 0).then_some(capacity),
        }
    }

    /// Most recent mark, if any.
    pub fn peek(&self) -> Option<&Location> {
        self.entries.back()
    }

    /// Marks from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn trim(&mut self) {
        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                self.entries.pop_front();
            }
        }
    }
}

impl NavigationHistory for MarkStack {
    fn push(&mut self, location: Location) {
        self.entries.push_back(location);
        self.trim();
    }

    fn pop(&mut self) -> Option<Location> {
        self.entries.pop_back()
    }

    fn depth(&self) -> usize {
        self.entries.len()
    }

    fn snapshot(&self) -> MarkStackSnapshot {
        MarkStackSnapshot {
            entries: self.entries.clone(),
        }
    }

    fn restore(&mut self, snapshot: MarkStackSnapshot) {
        self.entries = snapshot.entries;
    }
}

/// Restores the history to its value at construction when dropped.
///
/// Dropping happens on every exit path of the owning scope, including `?` returns and panics,
/// so no partially restored state is ever observable by the caller.
pub struct MarkStackGuard<'a, H: NavigationHistory + ?Sized> {
    history: &'a mut H,
    snapshot: Option<MarkStackSnapshot>,
}

impl<'a, H: NavigationHistory + ?Sized> MarkStackGuard<'a, H> {
    pub fn new(history: &'a mut H) -> Self {
        let snapshot = history.snapshot();
        tracing::trace!(depth = history.depth(), "mark stack saved");
        Self {
            history,
            snapshot: Some(snapshot),
        }
    }
}

impl<H: NavigationHistory + ?Sized> Deref for MarkStackGuard<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.history
    }
}

impl<H: NavigationHistory + ?Sized> DerefMut for MarkStackGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.history
    }
}

impl<H: NavigationHistory + ?Sized> Drop for MarkStackGuard<'_, H> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.history.restore(snapshot);
            tracing::trace!(depth = self.history.depth(), "mark stack restored");
        }
    }
}

/// Run `body` with the history restored afterwards, whatever `body` did to it.
pub fn with_restored_history<H, R>(history: &mut H, body: impl FnOnce(&mut H) -> R) -> R
where
    H: NavigationHistory + ?Sized,
{
    let mut guard = MarkStackGuard::new(history);
    body(&mut *guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::panic::{AssertUnwindSafe, catch_unwind};

    use crate::domain::model::Position;

    fn loc(path: &str, line: usize) -> Location {
        Location::new(path, Position::new(line, 1))
    }

    #[test]
    fn restores_after_pushes_and_pops() {
        let mut stack = MarkStack::new();
        stack.push(loc("a.rs", 1));
        stack.push(loc("b.rs", 2));
        let before = stack.clone();

        let popped = with_restored_history(&mut stack, |history| {
            let first = history.pop();
            history.pop();
            history.push(loc("c.rs", 3));
            history.push(loc("d.rs", 4));
            first
        });

        assert_eq!(popped, Some(loc("b.rs", 2)));
        assert_eq!(stack, before);
    }

    #[test]
    fn restores_when_body_fails() {
        let mut stack = MarkStack::new();
        stack.push(loc("a.rs", 1));
        let before = stack.clone();

        let result: Result<(), &str> = with_restored_history(&mut stack, |history| {
            history.push(loc("x.rs", 9));
            Err("probe failed")
        });

        assert!(result.is_err());
        assert_eq!(stack, before);
    }

    #[test]
    fn restores_when_body_panics() {
        let mut stack = MarkStack::new();
        stack.push(loc("a.rs", 1));
        let before = stack.clone();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            with_restored_history(&mut stack, |history| {
                if history.pop().is_some() {
                    panic!("boom");
                }
            })
        }));

        assert!(outcome.is_err());
        assert_eq!(stack, before);
    }

    #[test]
    fn capacity_drops_oldest_marks() {
        let mut stack = MarkStack::with_capacity(2);
        stack.push(loc("a.rs", 1));
        stack.push(loc("b.rs", 1));
        stack.push(loc("c.rs", 1));

        let paths: Vec<_> = stack.iter().map(|l| l.path.display().to_string()).collect();
        assert_eq!(paths, vec!["b.rs", "c.rs"]);
        assert_eq!(stack.peek(), Some(&loc("c.rs", 1)));
    }
}
