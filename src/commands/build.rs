use std::path::Path;

use anyhow::Result;
use weave::application::{BuildReport, BuildUseCase, CancelToken};

use crate::cli::SiteArgs;
use crate::commands::options::load_build_options;

pub fn cmd_build(root: &Path, site: &SiteArgs, clean: bool, force: bool, json: bool) -> Result<()> {
    let options = load_build_options(root, site)?
        .with_clean(clean)
        .with_force(force);

    let use_case = BuildUseCase::local(options)?;
    let report = use_case.build(&CancelToken::new())?;

    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        print_report(&report);
    }

    if !report.is_success() {
        anyhow::bail!("{} page(s) failed to build", report.failures.len());
    }
    Ok(())
}

fn print_report(report: &BuildReport) {
    for warning in &report.warnings {
        eprintln!("⚠ {}", warning);
    }
    for failure in &report.failures {
        eprintln!("✗ {}: {}", failure.path.display(), failure.message);
    }
    println!(
        "Built {} page(s), copied {} file(s), {} fresh, {} removed ({} skipped, {} ignored)",
        report.built.len(),
        report.copied.len(),
        report.fresh.len(),
        report.removed.len(),
        report.skipped,
        report.ignored
    );
}
