//! Common test utilities for Weave integration tests.
//!
//! This module provides:
//! - `TestSite`: an isolated project in a temp directory
//! - CLI helpers that run the `weave` binary against it

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Result of running a Weave CLI command
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Isolated project: `weave.toml` (optional), `src/` and `dist/` under one
/// temp directory.
pub struct TestSite {
    dir: TempDir,
}

#[allow(dead_code)]
impl TestSite {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().canonicalize().unwrap()
    }

    pub fn src(&self, rel: &str) -> PathBuf {
        self.root().join("src").join(rel)
    }

    pub fn dist(&self, rel: &str) -> PathBuf {
        self.root().join("dist").join(rel)
    }

    /// Write a source file under `src/`.
    pub fn write(&self, rel: &str, content: &str) -> &Self {
        write_file(&self.src(rel), content);
        self
    }

    pub fn write_config(&self, content: &str) -> &Self {
        write_file(&self.root().join("weave.toml"), content);
        self
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.src(rel)).unwrap();
    }

    pub fn output(&self, rel: &str) -> String {
        fs::read_to_string(self.dist(rel))
            .unwrap_or_else(|e| panic!("missing output {}: {}", rel, e))
    }

    /// Run the weave binary with the project as working directory.
    pub fn run(&self, args: &[&str]) -> TestResult {
        let output = Command::new(env!("CARGO_BIN_EXE_weave"))
            .args(args)
            .current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .env_remove("WEAVE_OUTPUT")
            .env_remove("WEAVE_STRICT")
            .env_remove("WEAVE_MAX_DEPTH")
            .output()
            .unwrap();
        TestResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A small site: a layout, a shared nav fragment, two pages and a stylesheet.
#[allow(dead_code)]
pub fn blog_site() -> TestSite {
    let site = TestSite::new();
    site.write(
        "_layout.html",
        "<!DOCTYPE html>\n<html><head><title>Blog</title></head>\
         <body><header data-import=\"nav\"></header>\
         <aside><slot name=\"sidebar\">no sidebar</slot></aside>\
         <main><slot></slot></main></body></html>",
    )
    .write("_includes/nav.html", "<nav><a href=\"/\">Home</a></nav>")
    .write("index.html", "<h1>Welcome</h1>")
    .write(
        "posts/first.md",
        "---\ntitle: First\n---\n# First post\n\nHello.",
    )
    .write("css/site.css", "body { margin: 0 }");
    site
}
