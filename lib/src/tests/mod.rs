//! Shared fixtures for unit tests.

use std::fs;
use std::path::Path;

/// Installs a test-writer subscriber so `tracing` output shows up in failing
/// tests. Safe to call more than once.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Writes `contents` to `root/path`, creating parent directories.
pub fn write(root: &Path, path: &str, contents: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A minimal site: templates plus a small content tree.
pub fn site(root: &Path) {
    write(root, "templates/page.html", "<title>{{ title }}</title><main>{{ content }}</main>");
    write(root, "templates/post.html",
        "<article data-date=\"{{ date | date }}\">{{ G.name }}|{{ title }}|{{ content }}</article>");
    write(root, "sitegen.toml", "name = \"Fixture\"\nprogress = false\n");

    write(root, "content/index.md", "Welcome to the **site**.");
    write(root, "content/about.html", "---\ntitle: About\n---\n\n<p>raw</p>");
    write(root, "content/blog/first.md",
        "---\ntitle: First\ntemplate: post\ndate: 2014-07-01 12:30:00\n---\n\n```rust\nfn main() {}\n```\n");
    write(root, "content/css/site.css", "body { margin: 0 }");
    write(root, "content/img/logo.png", "not really a png");
}
