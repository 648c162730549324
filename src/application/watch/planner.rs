//! Turning a debounced batch of changes into a rebuild plan

use std::path::Path;

use tracing::debug;

use crate::application::build::{BuildUseCase, RebuildPlan};
use crate::domain::entities::DependencyGraph;
use crate::domain::services::{ChangeImpact, ChangeImpactAnalyzer, FileClassifier};

use super::event::{ChangeKind, WatchEvent};

/// Plan for one batch plus the per-file impact that led to it.
#[derive(Debug, Default)]
pub struct PlannedBatch {
    pub plan: RebuildPlan,
    pub impacts: Vec<ChangeImpact>,
}

/// Whether `path` belongs to the watched sources (and not to what the build
/// itself writes).
pub fn is_watched(build: &BuildUseCase, path: &Path) -> bool {
    path.starts_with(build.source_root())
        && !path.starts_with(build.output_root())
        && !path.starts_with(build.cache_root())
        && !path.components().any(|c| c.as_os_str() == ".git")
}

pub fn plan_changes(build: &BuildUseCase, events: &[WatchEvent]) -> PlannedBatch {
    let graph = build.cache().graph();
    let analyzer = ChangeImpactAnalyzer::new(
        build.file_system(),
        build.source_root(),
        build.includes_dir(),
    );
    let probe = FileClassifier::new(build.options().config.classifier_options());
    let mut batch = PlannedBatch::default();

    for event in events {
        let path = &event.path;
        if !is_watched(build, path) {
            continue;
        }

        let structural = event.kind != ChangeKind::Change
            && ((probe.is_renderable(path) && build.is_template(path))
                || is_dependency_only(&graph, path));
        if structural {
            debug!(path = %path.display(), kind = ?event.kind, "layout or fragment set changed");
            batch.plan.full = true;
        }

        let impact = analyzer.get_change_impact(path, &graph);
        match event.kind {
            ChangeKind::Remove => {
                batch.plan.removed.insert(path.clone());
            }
            ChangeKind::Add | ChangeKind::Change => {
                batch.plan.changed.insert(path.clone());
            }
        }
        batch
            .plan
            .pages
            .extend(impact.dependent_pages.iter().filter(|p| *p != path).cloned());
        batch.impacts.push(impact);
    }

    // A page removed in this batch is not also recomposed.
    let removed = batch.plan.removed.clone();
    batch.plan.pages.retain(|p| !removed.contains(p));
    batch
}

/// Recorded as something a page consumed, never built on its own.
fn is_dependency_only(graph: &DependencyGraph, path: &Path) -> bool {
    graph.dependencies_of(path).is_none() && graph.is_known(path)
}
