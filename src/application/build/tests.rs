//! Build Use Case Tests

use super::*;
use crate::config::Config;
use crate::error::WeaveError;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let project = Self {
            dir: tempdir().unwrap(),
        };
        project.write("index.html", "<h1>Home</h1><nav data-import=\"nav\"></nav>");
        project.write("_includes/nav.html", "<a href=\"/\">home</a>");
        project.write("about.html", "<h1>About</h1>");
        project.write("blog/post.md", "# Hello\n\nFirst post.");
        project.write("css/site.css", "body { margin: 0 }");
        project
    }

    fn root(&self) -> PathBuf {
        self.dir.path().canonicalize().unwrap()
    }

    fn src(&self, rel: &str) -> PathBuf {
        self.root().join("src").join(rel)
    }

    fn dist(&self, rel: &str) -> PathBuf {
        self.root().join("dist").join(rel)
    }

    fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.src(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn use_case(&self) -> BuildUseCase {
        self.use_case_with(Config::default())
    }

    fn use_case_with(&self, config: Config) -> BuildUseCase {
        BuildUseCase::local(BuildOptions::new(self.root(), config)).unwrap()
    }

    fn build(&self) -> BuildReport {
        self.use_case().build(&CancelToken::new()).unwrap()
    }

    fn output(&self, rel: &str) -> String {
        fs::read_to_string(self.dist(rel)).unwrap()
    }
}

fn set(paths: &[PathBuf]) -> BTreeSet<PathBuf> {
    paths.iter().cloned().collect()
}

#[test]
fn builds_pages_and_copies_assets() {
    let project = Project::new();
    let report = project.build();

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(
        set(&report.built),
        set(&[
            project.dist("index.html"),
            project.dist("about.html"),
            project.dist("blog/post.html"),
        ])
    );
    assert_eq!(report.copied, vec![project.dist("css/site.css")]);
    assert_eq!(report.ignored, 1);

    let index = project.output("index.html");
    assert!(index.contains("<a href=\"/\">home</a>"));
    assert!(!index.contains("data-import"));
    assert!(project.output("blog/post.html").contains("<h1>Hello</h1>"));
    assert_eq!(project.output("css/site.css"), "body { margin: 0 }");
    assert!(!project.dist("_includes").exists());
}

#[test]
fn second_build_skips_fresh_outputs() {
    let project = Project::new();
    project.build();

    let report = project.build();
    assert!(report.built.is_empty());
    assert!(report.copied.is_empty());
    assert_eq!(report.fresh.len(), 4);
    assert!(!report.has_changes());
}

#[test]
fn fragment_change_rebuilds_only_dependents() {
    let project = Project::new();
    project.build();

    project.write("_includes/nav.html", "<a href=\"/\">start</a>");
    let report = project.build();

    assert_eq!(report.built, vec![project.dist("index.html")]);
    assert!(project.output("index.html").contains("start"));
}

#[test]
fn force_rebuilds_everything() {
    let project = Project::new();
    project.build();

    let use_case = BuildUseCase::local(
        BuildOptions::new(project.root(), Config::default()).with_force(true),
    )
    .unwrap();
    let report = use_case.build(&CancelToken::new()).unwrap();
    assert_eq!(report.built.len(), 3);
    assert_eq!(report.copied.len(), 1);
}

#[test]
fn cache_survives_between_use_cases() {
    let project = Project::new();
    project.build();
    assert!(project.root().join(".weave-cache").is_dir());

    let report = project.use_case().build(&CancelToken::new()).unwrap();
    assert!(report.built.is_empty());
}

#[test]
fn failing_page_does_not_stop_the_build() {
    let project = Project::new();
    let looped = project.write("loop.html", "<div data-import=\"loop\"></div>");

    let report = project.build();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, looped);
    assert!(report.failures[0].message.contains("circular import"));
    assert!(project.dist("index.html").exists());
    assert!(!project.dist("loop.html").exists());

    // Failed pages are retried on the next pass.
    let report = project.build();
    assert_eq!(report.failures.len(), 1);
}

#[test]
fn missing_fragment_warns_unless_strict() {
    let project = Project::new();
    project.write("contact.html", "<div data-import=\"form\"></div>");

    let report = project.build();
    assert!(report.is_success());
    assert!(report.warnings.iter().any(|w| w.contains("'form' not found")));
    assert!(project.output("contact.html").contains("fragment 'form' not found"));

    let strict = BuildUseCase::local(
        BuildOptions::new(project.root(), Config::default())
            .with_strict(true)
            .with_force(true),
    )
    .unwrap();
    let report = strict.build(&CancelToken::new()).unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, project.src("contact.html"));
}

#[test]
fn creating_missing_fragment_rebuilds_page() {
    let project = Project::new();
    project.write("contact.html", "<div data-import=\"form\"></div>");
    project.build();

    project.write("form.html", "<form></form>");
    let report = project.build();
    assert!(report.built.contains(&project.dist("contact.html")));
    assert!(project.output("contact.html").contains("<form></form>"));
}

#[test]
fn pretty_urls_nest_pages() {
    let project = Project::new();
    let mut config = Config::default();
    config.pretty_urls = true;

    let report = project.use_case_with(config).build(&CancelToken::new()).unwrap();
    assert!(report.is_success());
    assert!(project.dist("index.html").exists());
    assert!(project.dist("about/index.html").exists());
    assert!(project.dist("blog/post/index.html").exists());
}

#[test]
fn clean_build_removes_stray_outputs() {
    let project = Project::new();
    project.build();
    fs::write(project.dist("stray.html"), "old").unwrap();

    let use_case = BuildUseCase::local(
        BuildOptions::new(project.root(), Config::default()).with_clean(true),
    )
    .unwrap();
    let report = use_case.build(&CancelToken::new()).unwrap();

    assert!(!project.dist("stray.html").exists());
    assert_eq!(report.built.len(), 3);
}

#[test]
fn deleted_page_output_is_pruned() {
    let project = Project::new();
    project.build();

    fs::remove_file(project.src("about.html")).unwrap();
    let report = project.build();

    assert_eq!(report.removed, vec![project.dist("about.html")]);
    assert!(!project.dist("about.html").exists());
}

#[test]
fn rebuild_follows_the_plan() {
    let project = Project::new();
    let use_case = project.use_case();
    let cancel = CancelToken::new();
    use_case.build(&cancel).unwrap();

    let nav = project.write("_includes/nav.html", "<a href=\"/\">start</a>");
    fs::remove_file(project.src("about.html")).unwrap();
    let plan = RebuildPlan {
        changed: [nav].into_iter().collect(),
        pages: [project.src("index.html")].into_iter().collect(),
        removed: [project.src("about.html")].into_iter().collect(),
        ..RebuildPlan::default()
    };

    let report = use_case.rebuild(&plan, &cancel).unwrap();
    assert_eq!(report.built, vec![project.dist("index.html")]);
    assert_eq!(report.removed, vec![project.dist("about.html")]);
    assert!(project.output("index.html").contains("start"));
    assert!(use_case.cache().entry(&project.src("about.html")).is_none());
}

#[test]
fn rebuild_without_scan_runs_full_build() {
    let project = Project::new();
    let report = project
        .use_case()
        .rebuild(&RebuildPlan::default(), &CancelToken::new())
        .unwrap();
    assert_eq!(report.built.len(), 3);
}

#[test]
fn cancelled_build_stops() {
    let project = Project::new();
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = project.use_case().build(&cancel).unwrap_err();
    assert!(err.is_cancelled());
}

#[test]
fn classify_and_template_lookup_after_scan() {
    let project = Project::new();
    let use_case = project.use_case();
    assert!(use_case.classify(&project.src("index.html")).is_none());

    use_case.build(&CancelToken::new()).unwrap();
    let result = use_case.classify(&project.src("css/site.css")).unwrap();
    assert_eq!(result.action, crate::domain::services::FileAction::Copy);
    assert!(use_case.is_template(&project.src("_includes/nav.html")));
    assert!(use_case.is_template(&project.src("_includes/new.html")));
    assert!(!use_case.is_template(&project.src("about.html")));
}

#[test]
fn missing_source_dir_is_an_error() {
    let dir = tempdir().unwrap();
    let err = BuildUseCase::local(BuildOptions::new(dir.path(), Config::default()))
        .err()
        .unwrap();
    assert!(matches!(err, WeaveError::DirectoryNotFound { .. }));
}

#[test]
fn output_for_maps_inputs() {
    let project = Project::new();
    let use_case = project.use_case();
    assert_eq!(
        use_case.output_for(&project.src("blog/post.md"), true),
        Some(project.dist("blog/post.html"))
    );
    assert_eq!(use_case.output_for(Path::new("/elsewhere/x.html"), true), None);
}
