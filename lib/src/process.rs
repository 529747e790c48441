use crate::error::{Chainable, Result};
use crate::failure::Failures;
use crate::tree::{Kind, Node};

/// A per-node hook run after the crawl and before writing. Its value is
/// attached to the node as `extra`, visible to templates.
pub type Processor = dyn Fn(&Node) -> Result<serde_json::Value> + Send + Sync;

/// The file name that gives its directory's URL.
pub const INDEX_FILE: &str = "index.html";

/// The URL of `child`, given the URL of its parent directory.
///
/// Directories get a trailing `/`; an `index.html` document shares its
/// directory's URL.
pub fn child_url(parent: &str, child: &Node) -> String {
    let parent = parent.trim_end_matches('/');
    match child.kind {
        Kind::Directory { .. } => format!("{parent}/{}/", child.name),
        _ if child.name == INDEX_FILE => format!("{parent}/"),
        _ => format!("{parent}/{}", child.name),
    }
}

/// Assigns URLs to every node, pre-order, and runs the processor, if any,
/// on each. A failing node doesn't stop the traversal, including of its own
/// children.
pub fn process(root: &Node, processor: Option<&Processor>, failures: &Failures) {
    fn visit(node: &Node, url: String, processor: Option<&Processor>, failures: &Failures) {
        node.set_url(url);
        let url = node.url().unwrap_or("/");

        if let Some(processor) = processor {
            let extra = processor(node).chain_with(|| error! {
                "processor failed",
                "url" => url,
                "source" => node.source.display(),
            });

            if let Some(extra) = failures.capture(extra) {
                node.set_extra(extra);
            }
        }

        for child in node.children() {
            visit(child, child_url(url, child), processor, failures);
        }
    }

    visit(root, "/".into(), processor, failures);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::failure::Phase;
    use crate::metadata::Metadata;

    fn doc(name: &str) -> Arc<Node> {
        Arc::new(Node::content(name, name, String::new(), Metadata::with_template("page")))
    }

    fn sample() -> Node {
        let blog = Node::directory("blog", "content/blog", vec![doc("index.html"), doc("post.html")]);
        let logo = Arc::new(Node::asset("logo.png", "content/logo.png"));
        Node::directory("", "content", vec![Arc::new(blog), doc("about.html"), logo])
    }

    #[test]
    fn urls_mirror_output_paths() {
        let root = sample();
        process(&root, None, &Failures::new(Phase::Process));

        let url = |path: &str| root.find(path).unwrap().url().unwrap().to_string();
        assert_eq!(root.url(), Some("/"));
        assert_eq!(url("blog"), "/blog/");
        assert_eq!(url("blog/index.html"), "/blog/");
        assert_eq!(url("blog/post.html"), "/blog/post.html");
        assert_eq!(url("about.html"), "/about.html");
        assert_eq!(url("logo.png"), "/logo.png");
        assert!(root.iter_depth_first().all(|n| n.extra().is_none()));
    }

    #[test]
    fn processor_values_become_extra() {
        let root = sample();
        let processor = |node: &Node| -> Result<serde_json::Value> {
            Ok(json!({ "kind": node.kind_name(), "url": node.url() }))
        };
        let failures = Failures::new(Phase::Process);
        process(&root, Some(&processor), &failures);

        assert!(failures.is_empty());
        let post = root.find("blog/post.html").unwrap();
        assert_eq!(post.extra().unwrap()["kind"], "content");
        assert_eq!(post.extra().unwrap()["url"], "/blog/post.html");
        assert_eq!(root.extra().unwrap()["kind"], "directory");
    }

    #[test]
    fn failures_do_not_stop_the_traversal() {
        let root = sample();
        let processor = |node: &Node| -> Result<serde_json::Value> {
            match node.is_directory() {
                true => err!("directories are not allowed"),
                false => Ok(json!(node.name)),
            }
        };

        let failures = Failures::new(Phase::Process);
        process(&root, Some(&processor), &failures);

        assert_eq!(failures.len(), 2);
        assert!(root.extra().is_none());
        assert_eq!(root.find("blog/post.html").unwrap().extra(), Some(&json!("post.html")));
        assert_eq!(root.find("logo.png").unwrap().extra(), Some(&json!("logo.png")));
        assert!(failures.check().unwrap_err().mentions("directories are not allowed"));
    }
}
