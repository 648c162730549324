use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use chrono::Local;
use weave::application::{WatchOptions, WatchReport, WatchUseCase};

use crate::cli::SiteArgs;
use crate::commands::options::load_build_options;

pub fn cmd_watch(root: &Path, site: &SiteArgs, json: bool) -> Result<()> {
    let options = WatchOptions::new(load_build_options(root, site)?).with_json(json);
    let use_case = WatchUseCase::new(options)?;

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .context("failed to set Ctrl+C handler")?;

    let (errors, error_rx) = channel();
    let error_log = thread::spawn(move || {
        for error in error_rx {
            tracing::error!(error = %error, "watch error");
        }
    });

    use_case.start(running, errors, |report| {
        if json {
            println!("{}", report.to_json());
        } else {
            render(&report);
        }
    })?;

    let _ = error_log.join();
    Ok(())
}

fn render(report: &WatchReport) {
    let time = Local::now().format("%H:%M:%S");
    match report {
        WatchReport::WatchStarted { source, output } => {
            println!("Watching {} → {} (Ctrl+C to stop)", source, output);
        }
        WatchReport::FileChanged { path, kind, .. } => {
            println!("[{}] {:?} {}", time, kind, path);
        }
        WatchReport::Impact {
            path,
            dependents,
            level,
        } => {
            if *dependents > 0 {
                println!("[{}]   {} affects {} page(s) ({:?})", time, path, dependents, level);
            }
        }
        WatchReport::RebuildStarted { .. } => {}
        WatchReport::RebuildComplete {
            built,
            copied,
            removed,
            failures,
            warnings,
            duration_ms,
            ..
        } => {
            for warning in warnings {
                eprintln!("[{}] ⚠ {}", time, warning);
            }
            for failure in failures {
                eprintln!("[{}] ✗ {}", time, failure);
            }
            println!(
                "[{}] ✓ built {}, copied {}, removed {} in {}ms",
                time, built, copied, removed, duration_ms
            );
        }
        WatchReport::RebuildCancelled => {}
        WatchReport::Error { message } => eprintln!("[{}] ✗ {}", time, message),
        WatchReport::Shutdown => println!("Stopped."),
    }
}
