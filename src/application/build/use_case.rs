//! Build Use Case implementation

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::application::cache::BuildCache;
use crate::domain::entities::DependencySet;
use crate::domain::ports::{FileSystem, MarkdownRenderer};
use crate::domain::services::{
    normalize_path, ClassificationResult, Composer, FileAction, FileClassifier, LayoutResolver,
};
use crate::error::{WeaveError, WeaveResult};
use crate::infrastructure::{JsonCacheStore, LocalFs, PulldownRenderer};

use super::options::BuildOptions;
use super::plan::{CancelToken, RebuildPlan};
use super::result::{BuildReport, PageFailure};
use super::site;

/// What the last full scan learned about the source tree.
#[derive(Default)]
struct SiteIndex {
    classifier: Option<Arc<FileClassifier>>,
    templates: BTreeSet<PathBuf>,
}

enum Outcome {
    Built(PathBuf, Vec<String>),
    Fresh(PathBuf),
    Copied(PathBuf),
    Failed(PageFailure),
}

/// Build Use Case
///
/// Scans the source tree, composes every emitted page (in parallel, skipping
/// pages whose cached output is still fresh), copies assets and persists the
/// build cache. One page failing never stops the others.
pub struct BuildUseCase {
    options: BuildOptions,
    fs: Arc<dyn FileSystem>,
    cache: Arc<BuildCache>,
    composer: Composer,
    source_root: PathBuf,
    output_root: PathBuf,
    cache_root: PathBuf,
    site: Mutex<SiteIndex>,
}

impl BuildUseCase {
    /// Wire the use case against the local disk.
    pub fn local(options: BuildOptions) -> WeaveResult<Self> {
        let fs: Arc<dyn FileSystem> = Arc::new(LocalFs::new());
        let cache_store = Arc::new(JsonCacheStore::new(options.cache_dir()));
        let cache = Arc::new(BuildCache::with_store(fs.clone(), cache_store));
        Self::new(options, fs, Arc::new(PulldownRenderer::new()), cache)
    }

    pub fn new(
        mut options: BuildOptions,
        fs: Arc<dyn FileSystem>,
        markdown: Arc<dyn MarkdownRenderer>,
        cache: Arc<BuildCache>,
    ) -> WeaveResult<Self> {
        options.config.validate()?;

        // Watch events carry absolute paths; every key is derived from one
        // canonical root so they compare equal.
        let root = options.project_root.clone();
        let root = root
            .canonicalize()
            .or_else(|_| std::path::absolute(&root))
            .unwrap_or(root);
        options.project_root = normalize_path(&root);

        let source_root = normalize_path(&options.source_dir());
        if !fs.is_dir(&source_root) {
            return Err(WeaveError::DirectoryNotFound { path: source_root });
        }
        let output_root = normalize_path(&options.output_dir());
        let cache_root = normalize_path(&options.cache_dir());

        let config = &options.config;
        let mut layouts = LayoutResolver::new(fs.clone(), config.layout_options());
        for rule in config.layout_rules()? {
            layouts.add_rule(rule)?;
        }
        let composer = Composer::new(
            fs.clone(),
            markdown,
            Arc::new(layouts),
            config.compose_options(),
        );

        cache.load();

        Ok(Self {
            options,
            fs,
            cache,
            composer,
            source_root,
            output_root,
            cache_root,
            site: Mutex::new(SiteIndex::default()),
        })
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn cache(&self) -> &Arc<BuildCache> {
        &self.cache
    }

    pub fn file_system(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn includes_dir(&self) -> &str {
        &self.options.config.layout.includes_dir
    }

    /// Full build: rescan, compose what is stale, copy assets, prune outputs
    /// of vanished inputs.
    pub fn build(&self, cancel: &CancelToken) -> WeaveResult<BuildReport> {
        let config = &self.options.config;
        let mut report = BuildReport::new();

        if config.clean {
            info!(output = %self.output_root.display(), "cleaning output");
            self.fs.remove_dir_all(&self.output_root)?;
            self.cache.clear();
        }
        self.begin_pass();

        let sources = site::scan_sources(
            &self.source_root,
            &[self.output_root.clone(), self.cache_root.clone()],
        );
        let probe = FileClassifier::new(config.classifier_options());
        let renderables: Vec<PathBuf> = sources
            .iter()
            .filter(|p| probe.is_renderable(p))
            .cloned()
            .collect();
        let templates = site::template_files(
            self.fs.as_ref(),
            self.composer.layouts(),
            &self.source_root,
            &renderables,
        );
        let classifier = Arc::new(site::build_classifier(
            config,
            &self.source_root,
            &templates,
            &mut report.warnings,
        ));

        let mut pages = Vec::new();
        let mut assets = Vec::new();
        for source in &sources {
            match self.classify_with(&classifier, source).map(|c| c.action) {
                Some(FileAction::Emit) => pages.push(source.clone()),
                Some(FileAction::Copy) => assets.push(source.clone()),
                Some(FileAction::Skip) | None => report.skipped += 1,
                Some(FileAction::Ignored) => report.ignored += 1,
            }
        }
        debug!(
            pages = pages.len(),
            assets = assets.len(),
            templates = templates.len(),
            "classified sources"
        );

        *self.site_index() = SiteIndex {
            classifier: Some(classifier),
            templates,
        };

        let force = config.force || config.clean;
        self.render_pages(&pages, force, cancel, &mut report)?;
        self.copy_assets(&assets, force, cancel, &mut report)?;

        let live: BTreeSet<&PathBuf> = pages.iter().chain(&assets).collect();
        for input in self.cache.inputs() {
            if !live.contains(&input) {
                self.forget_input(&input, &mut report);
            }
        }

        self.persist(&mut report);
        info!(
            built = report.built.len(),
            fresh = report.fresh.len(),
            copied = report.copied.len(),
            failed = report.failures.len(),
            "build finished"
        );
        Ok(report)
    }

    /// Incremental pass for a watch-mode plan. Falls back to a full build
    /// when the plan asks for one or no scan happened yet.
    pub fn rebuild(&self, plan: &RebuildPlan, cancel: &CancelToken) -> WeaveResult<BuildReport> {
        let classifier = self.site_index().classifier.clone();
        let Some(classifier) = classifier.filter(|_| !plan.full) else {
            return self.build(cancel);
        };
        let mut report = BuildReport::new();
        self.begin_pass();

        for path in &plan.removed {
            self.forget_input(path, &mut report);
        }

        let mut pages = Vec::new();
        let mut assets = Vec::new();
        for path in plan.changed.iter().chain(&plan.pages) {
            if !self.fs.is_file(path) {
                continue;
            }
            match self.classify_with(&classifier, path).map(|c| c.action) {
                Some(FileAction::Emit) if !pages.contains(path) => pages.push(path.clone()),
                Some(FileAction::Copy) if !assets.contains(path) => assets.push(path.clone()),
                _ => {}
            }
        }

        self.render_pages(&pages, true, cancel, &mut report)?;
        self.copy_assets(&assets, true, cancel, &mut report)?;
        self.persist(&mut report);
        debug!(
            built = report.built.len(),
            copied = report.copied.len(),
            removed = report.removed.len(),
            "rebuild finished"
        );
        Ok(report)
    }

    /// Classification of an absolute source path, using the last scan.
    pub fn classify(&self, path: &Path) -> Option<ClassificationResult> {
        let classifier = self.site_index().classifier.clone()?;
        self.classify_with(&classifier, path)
    }

    /// Whether `path` is (or, by its name, would be) a layout or fragment.
    pub fn is_template(&self, path: &Path) -> bool {
        if self.site_index().templates.contains(path) {
            return true;
        }
        path.strip_prefix(&self.source_root)
            .map(|rel| site::is_template_name(rel, &self.options.config))
            .unwrap_or(false)
    }

    /// Where the output for an input lands.
    pub fn output_for(&self, input: &Path, is_page: bool) -> Option<PathBuf> {
        let rel = input.strip_prefix(&self.source_root).ok()?;
        Some(site::output_path(
            rel,
            &self.output_root,
            is_page,
            self.options.config.pretty_urls,
        ))
    }

    fn classify_with(
        &self,
        classifier: &FileClassifier,
        path: &Path,
    ) -> Option<ClassificationResult> {
        let rel = path.strip_prefix(&self.source_root).ok()?;
        Some(classifier.classify(rel))
    }

    fn begin_pass(&self) {
        self.cache.begin_pass();
        self.composer.layouts().clear_cache();
    }

    fn render_pages(
        &self,
        pages: &[PathBuf],
        force: bool,
        cancel: &CancelToken,
        report: &mut BuildReport,
    ) -> WeaveResult<()> {
        let outcomes = pages
            .par_iter()
            .map(|page| self.render_page(page, force, cancel))
            .collect::<WeaveResult<Vec<_>>>()?;
        record_outcomes(outcomes, report);
        Ok(())
    }

    fn render_page(&self, page: &Path, force: bool, cancel: &CancelToken) -> WeaveResult<Outcome> {
        cancel.check()?;
        let Some(output) = self.output_for(page, true) else {
            return Ok(failure(page, "outside the source directory"));
        };
        if !force && self.cache.is_up_to_date(page, &output) {
            return Ok(Outcome::Fresh(page.to_path_buf()));
        }

        let composition = match self.composer.compose_file(page, &self.source_root) {
            Ok(composition) => composition,
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!(page = %page.display(), error = %e, "page failed");
                self.cache.remove(page);
                return Ok(failure(page, e.to_string()));
            }
        };

        cancel.check()?;
        if let Err(e) = self.fs.write(&output, composition.document.html.as_bytes()) {
            warn!(page = %page.display(), error = %e, "failed to write output");
            self.cache.remove(page);
            return Ok(failure(page, e.to_string()));
        }
        self.cache.set_dependencies(page, &composition.dependencies);
        self.cache.record_build(page, &output);

        let warnings = composition
            .warnings
            .iter()
            .map(|w| format!("{}: {}", page.display(), w))
            .collect();
        Ok(Outcome::Built(output, warnings))
    }

    fn copy_assets(
        &self,
        assets: &[PathBuf],
        force: bool,
        cancel: &CancelToken,
        report: &mut BuildReport,
    ) -> WeaveResult<()> {
        let outcomes = assets
            .par_iter()
            .map(|asset| self.copy_asset(asset, force, cancel))
            .collect::<WeaveResult<Vec<_>>>()?;
        record_outcomes(outcomes, report);
        Ok(())
    }

    fn copy_asset(&self, asset: &Path, force: bool, cancel: &CancelToken) -> WeaveResult<Outcome> {
        cancel.check()?;
        let Some(output) = self.output_for(asset, false) else {
            return Ok(failure(asset, "outside the source directory"));
        };
        if !force && self.cache.is_up_to_date(asset, &output) {
            return Ok(Outcome::Fresh(asset.to_path_buf()));
        }
        if let Err(e) = self.fs.copy(asset, &output) {
            warn!(asset = %asset.display(), error = %e, "copy failed");
            self.cache.remove(asset);
            return Ok(failure(asset, e.to_string()));
        }
        self.cache.set_dependencies(asset, &DependencySet::new());
        self.cache.record_build(asset, &output);
        Ok(Outcome::Copied(output))
    }

    /// Delete the output of an input that is gone and drop its record.
    fn forget_input(&self, input: &Path, report: &mut BuildReport) {
        if let Some(output) = self.cache.output_of(input) {
            match self.fs.remove(&output) {
                Ok(()) => report.removed.push(output),
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    warn!(output = %output.display(), error = %e, "failed to remove stale output");
                    report.warnings.push(e.to_string());
                }
            }
        }
        self.cache.remove(input);
    }

    /// Best-effort cache persistence.
    fn persist(&self, report: &mut BuildReport) {
        if let Err(e) = self.cache.save() {
            warn!(error = %e, "build cache not saved");
            report.warnings.push(e.to_string());
        }
    }

    fn site_index(&self) -> std::sync::MutexGuard<'_, SiteIndex> {
        self.site.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn failure(path: &Path, message: impl Into<String>) -> Outcome {
    Outcome::Failed(PageFailure {
        path: path.to_path_buf(),
        message: message.into(),
    })
}

fn record_outcomes(outcomes: Vec<Outcome>, report: &mut BuildReport) {
    for outcome in outcomes {
        match outcome {
            Outcome::Built(output, warnings) => {
                report.built.push(output);
                report.warnings.extend(warnings);
            }
            Outcome::Fresh(input) => report.fresh.push(input),
            Outcome::Copied(output) => report.copied.push(output),
            Outcome::Failed(failure) => report.failures.push(failure),
        }
    }
}
