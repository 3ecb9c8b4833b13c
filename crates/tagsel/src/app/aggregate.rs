//! Drives a probe to completion and buckets matches by source file.

use crate::app::artifacts::{ArtifactLifecycle, ResourceIdentitySet, ResourceRegistry};
use crate::app::history::{MarkStackGuard, NavigationHistory};
use crate::app::probe::{MatchHandle, Probe, ProbeContext};
use crate::domain::errors::TagError;
use crate::domain::model::{FileGroup, Match, SourceId};
use crate::infra::config::Select;

/// Enumerates every match for an identifier.
#[derive(Debug, Clone, Default)]
pub struct MatchAggregator {
    options: Select,
}

impl MatchAggregator {
    pub fn new(options: Select) -> Self {
        Self { options }
    }

    /// Collect all matches, grouped by source in first-encounter order.
    ///
    /// The navigation history is identical before and after the call. A failing first probe
    /// yields no groups; a failure after that ends the enumeration early.
    pub fn find_all(
        &self,
        identifier: &str,
        probe: &mut dyn Probe,
        history: &mut dyn NavigationHistory,
        resources: &mut dyn ResourceRegistry,
    ) -> Vec<FileGroup> {
        let mut history = MarkStackGuard::new(history);
        let snapshot = ArtifactLifecycle::snapshot(&*resources);

        let mut ctx = ProbeContext {
            history: &mut *history,
            resources,
        };

        let mut current = match probe_step(&mut ctx, |ctx| probe.first(identifier, ctx)) {
            Ok(Some(handle)) => Some(handle),
            Ok(None) => {
                tracing::debug!(identifier, "no matches");
                None
            }
            Err(err) => {
                tracing::debug!(identifier, error = %err, "first lookup failed");
                None
            }
        };

        let mut groups = Vec::new();
        let mut pending: Vec<Match> = Vec::new();

        while let Some(handle) = current.take() {
            let active = handle.source;
            let locator = handle.locator.clone();
            pending.push(to_match(handle));

            let next = match probe_step(&mut ctx, |ctx| probe.next(identifier, ctx)) {
                Ok(next) => next,
                Err(err) => {
                    tracing::debug!(identifier, error = %err, "{}", TagError::ProbeExhausted);
                    None
                }
            };

            if next.as_ref().map(|handle| handle.source) != Some(active) {
                let matches = std::mem::take(&mut pending);
                tracing::trace!(
                    identifier,
                    path = %locator.display(),
                    count = matches.len(),
                    "closed file group"
                );
                groups.push(FileGroup {
                    locator,
                    source: active,
                    matches,
                });
                close_group(&mut *ctx.resources, active, &snapshot, &self.options);
            }

            current = next;
        }

        tracing::debug!(
            identifier,
            groups = groups.len(),
            matches = groups.iter().map(FileGroup::len).sum::<usize>(),
            "aggregation finished"
        );
        groups
    }
}

/// Run one probe call, popping any marks it left behind.
fn probe_step<T>(
    ctx: &mut ProbeContext<'_>,
    call: impl FnOnce(&mut ProbeContext<'_>) -> T,
) -> T {
    let depth = ctx.history.depth();
    let result = call(&mut *ctx);
    while ctx.history.depth() > depth {
        if ctx.history.pop().is_none() {
            break;
        }
    }
    result
}

/// Copy a handle's fields before the probe is allowed to advance.
fn to_match(handle: MatchHandle) -> Match {
    Match {
        source: handle.source,
        locator: handle.locator,
        line_text: handle.line_text,
        position: handle.position,
    }
}

fn close_group(
    resources: &mut dyn ResourceRegistry,
    source: SourceId,
    snapshot: &ResourceIdentitySet,
    options: &Select,
) {
    ArtifactLifecycle::maybe_dispose(resources, source, snapshot, options);
}
