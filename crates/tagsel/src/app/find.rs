//! Top-level find-tag operation and the host interface it drives.

use std::time::Duration;

use crate::app::aggregate::MatchAggregator;
use crate::app::artifacts::ResourceRegistry;
use crate::app::history::NavigationHistory;
use crate::app::naming::SessionNames;
use crate::app::probe::Probe;
use crate::app::selection::SelectionSession;
use crate::domain::errors::TagError;
use crate::domain::model::{FileGroup, JumpTarget, Location};
use crate::infra::config::{Config, Select};

/// Editor-side operations a selection needs from its host.
pub trait Navigator {
    /// Where the user is right now, pushed onto the history before a jump.
    fn current_location(&self) -> Option<Location>;

    /// Show `target`, in an alternate view when `target.other_window` is set.
    fn open(&mut self, target: &JumpTarget) -> anyhow::Result<()>;

    /// Briefly emphasise the jumped-to region. Purely cosmetic.
    fn highlight(&mut self, target: &JumpTarget, duration: Duration);

    /// Ask the user for a complete tag number, pre-filled with `initial`. `None` cancels.
    fn read_tag_number(&mut self, initial: &str) -> Option<String>;

    /// Surface a non-fatal notification.
    fn alert(&mut self, error: &TagError) {
        tracing::info!(%error, "tag alert");
    }
}

/// Result of a find-tag request.
#[derive(Debug)]
pub enum FindOutcome {
    /// A lone match was opened directly; no session remains.
    Jumped(JumpTarget),
    /// Several matches (or single-match shortcut disabled); the session is live.
    Session(SelectionSession),
}

/// Owns the options and the set of live session names.
#[derive(Debug, Default)]
pub struct TagFinder {
    options: Select,
    names: SessionNames,
}

impl TagFinder {
    pub fn new(options: Select) -> Self {
        Self {
            options,
            names: SessionNames::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.select.clone())
    }

    pub fn options(&self) -> &Select {
        &self.options
    }

    pub fn names(&self) -> &SessionNames {
        &self.names
    }

    /// Aggregate every match for `identifier` and present or jump to them.
    pub fn find_tag(
        &mut self,
        identifier: &str,
        probe: &mut dyn Probe,
        history: &mut dyn NavigationHistory,
        resources: &mut dyn ResourceRegistry,
        navigator: &mut dyn Navigator,
    ) -> Result<FindOutcome, TagError> {
        let groups = MatchAggregator::new(self.options.clone())
            .find_all(identifier, probe, history, resources);
        let total: usize = groups.iter().map(FileGroup::len).sum();
        if total == 0 {
            return Err(TagError::no_matches(identifier));
        }

        let name = self.names.unique_name(identifier);
        let mut session = SelectionSession::build(name, identifier, groups)?;

        if total == 1 && self.options.no_select_for_one_match() {
            tracing::debug!(identifier, "single match, jumping directly");
            return session
                .goto_tag(false, &self.options, history, navigator)
                .map(FindOutcome::Jumped);
        }

        self.names.register(session.name());
        tracing::debug!(identifier, session = session.name(), matches = total, "session opened");
        Ok(FindOutcome::Session(session))
    }

    /// Dispose a session created by [`TagFinder::find_tag`].
    pub fn dispose(&mut self, session: SelectionSession) {
        session.quit(&mut self.names);
    }
}
