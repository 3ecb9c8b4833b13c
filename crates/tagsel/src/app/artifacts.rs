//! Tracking of source resources opened only as a side effect of probing.

use std::collections::HashSet;
use std::io;
use std::path::Path;

use crate::domain::model::SourceId;
use crate::infra::config::Select;

/// Host registry of open source resources.
pub trait ResourceRegistry {
    /// Identities of every currently open resource.
    fn open_resources(&self) -> Vec<SourceId>;

    /// Open `path`, or return the identity of the resource already holding it.
    fn visit(&mut self, path: &Path) -> io::Result<SourceId>;

    /// Close without prompting, discarding any transient state.
    fn close_silently(&mut self, source: SourceId);

    fn is_open(&self, source: SourceId) -> bool;
}

/// Resources that were open before aggregation started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceIdentitySet {
    ids: HashSet<SourceId>,
}

impl ResourceIdentitySet {
    pub fn contains(&self, source: SourceId) -> bool {
        self.ids.contains(&source)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<SourceId> for ResourceIdentitySet {
    fn from_iter<I: IntoIterator<Item = SourceId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Snapshot-before, dispose-after discipline for probe artifacts.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArtifactLifecycle;

impl ArtifactLifecycle {
    pub fn snapshot<R: ResourceRegistry + ?Sized>(registry: &R) -> ResourceIdentitySet {
        registry.open_resources().into_iter().collect()
    }

    /// Close `source` when it was opened during probing and disposal is enabled.
    ///
    /// Must only be called once probing has moved past `source`. Returns whether the resource
    /// was closed.
    pub fn maybe_dispose<R: ResourceRegistry + ?Sized>(
        registry: &mut R,
        source: SourceId,
        snapshot: &ResourceIdentitySet,
        options: &Select,
    ) -> bool {
        if !options.kill_artifact_buffers() || snapshot.contains(source) {
            return false;
        }
        if !registry.is_open(source) {
            return false;
        }
        registry.close_silently(source);
        tracing::debug!(%source, "closed probe artifact");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::infra::workspace::Workspace;

    #[test]
    fn disposes_only_resources_opened_after_snapshot() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let kept = dir.path().join("kept.rs");
        let probed = dir.path().join("probed.rs");
        std::fs::write(&kept, "fn kept() {}\n")?;
        std::fs::write(&probed, "fn probed() {}\n")?;

        let mut workspace = Workspace::new();
        let kept_id = workspace.visit(&kept)?;
        let snapshot = ArtifactLifecycle::snapshot(&workspace);
        let probed_id = workspace.visit(&probed)?;

        let options = Select::default();
        assert!(!ArtifactLifecycle::maybe_dispose(&mut workspace, kept_id, &snapshot, &options));
        assert!(ArtifactLifecycle::maybe_dispose(&mut workspace, probed_id, &snapshot, &options));
        assert!(workspace.is_open(kept_id));
        assert!(!workspace.is_open(probed_id));
        Ok(())
    }

    #[test]
    fn keeps_artifacts_when_disabled() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let probed = dir.path().join("probed.rs");
        std::fs::write(&probed, "fn probed() {}\n")?;

        let mut workspace = Workspace::new();
        let snapshot = ArtifactLifecycle::snapshot(&workspace);
        assert!(snapshot.is_empty());
        let probed_id = workspace.visit(&probed)?;

        let mut options = Select::default();
        options.set_kill_artifact_buffers(false);
        assert!(!ArtifactLifecycle::maybe_dispose(&mut workspace, probed_id, &snapshot, &options));
        assert!(workspace.is_open(probed_id));
        Ok(())
    }
}
