mod common;

use common::{blog_site, TestSite};

#[test]
fn build_composes_pages_into_output() {
    let site = blog_site();
    let result = site.run(&["build"]);
    assert!(result.success, "stderr:\n{}", result.stderr);
    assert!(result.stdout.contains("Built 2 page(s), copied 1 file(s)"));

    let index = site.output("index.html");
    assert!(index.contains("<nav><a href=\"/\">Home</a></nav>"));
    assert!(index.contains("<main><h1>Welcome</h1></main>"));
    assert!(index.contains("no sidebar"));
    assert!(!index.contains("<slot"));

    let post = site.output("posts/first.html");
    assert!(post.contains("<h1>First post</h1>"));
    assert!(site.dist("css/site.css").exists());
    assert!(!site.dist("_layout.html").exists());
    assert!(!site.dist("_includes/nav.html").exists());
}

#[test]
fn json_build_report() {
    let site = blog_site();
    let result = site.run(&["build", "--json"]);
    assert!(result.success, "stderr:\n{}", result.stderr);

    let report: serde_json::Value = serde_json::from_str(result.stdout.trim()).unwrap();
    assert_eq!(report["built"].as_array().unwrap().len(), 2);
    assert_eq!(report["copied"].as_array().unwrap().len(), 1);
    assert_eq!(report["failures"].as_array().unwrap().len(), 0);

    // Nothing changed: everything is fresh.
    let result = site.run(&["build", "--json"]);
    let report: serde_json::Value = serde_json::from_str(result.stdout.trim()).unwrap();
    assert_eq!(report["built"].as_array().unwrap().len(), 0);
    assert_eq!(report["fresh"].as_array().unwrap().len(), 3);
}

#[test]
fn failed_page_sets_exit_code_but_others_build() {
    let site = blog_site();
    site.write("broken.html", "<div data-import=\"broken\"></div>");

    let result = site.run(&["build"]);
    assert!(!result.success);
    assert!(result.stderr.contains("circular import"));
    assert!(site.dist("index.html").exists());
    assert!(!site.dist("broken.html").exists());
}

#[test]
fn strict_flag_fails_missing_fragments() {
    let site = TestSite::new();
    site.write("index.html", "<div data-import=\"missing\"></div>");

    let lenient = site.run(&["build"]);
    assert!(lenient.success);
    assert!(lenient.stderr.contains("'missing' not found"));

    let strict = site.run(&["build", "--strict", "--force"]);
    assert!(!strict.success);
}

#[test]
fn config_file_and_flags() {
    let site = blog_site();
    site.write_config("output = \"public\"\npretty_urls = true\noutptu = \"x\"\n");

    let result = site.run(&["build"]);
    assert!(result.success, "stderr:\n{}", result.stderr);
    assert!(result.stderr.contains("did you mean 'output'?"));
    assert!(site.root().join("public/posts/first/index.html").exists());

    let result = site.run(&["build", "--output", "out"]);
    assert!(result.success);
    assert!(site.root().join("out/index.html").exists());
}

#[test]
fn clean_removes_stray_files() {
    let site = blog_site();
    assert!(site.run(&["build"]).success);
    std::fs::write(site.dist("stale.html"), "old").unwrap();

    assert!(site.run(&["build", "--clean"]).success);
    assert!(!site.dist("stale.html").exists());
    assert!(site.dist("index.html").exists());
}

#[test]
fn missing_source_directory_fails() {
    let site = TestSite::new();
    let result = site.run(&["build"]);
    assert!(!result.success);
    assert!(result.stderr.contains("directory not found"));
}

#[test]
fn help_lists_commands() {
    let site = TestSite::new();
    let result = site.run(&["--help"]);
    assert!(result.success);
    assert!(result.stdout.contains("build"));
    assert!(result.stdout.contains("watch"));
}
