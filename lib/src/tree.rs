use std::fmt;
use std::sync::{Arc, OnceLock};
use std::path::{Path, PathBuf};

use crate::metadata::Metadata;

/// One entry of the content tree: a mirror of a file or directory under the
/// content root, as it will appear in the output.
#[derive(Debug)]
pub struct Node {
    /// Output file name. Documents are always `.html`.
    pub name: String,
    /// The file or directory this node was crawled from.
    pub source: PathBuf,
    pub kind: Kind,
    url: OnceLock<String>,
    extra: OnceLock<serde_json::Value>,
}

#[derive(Debug)]
pub enum Kind {
    /// A directory; children are in directory-listing order.
    Directory { children: Vec<Arc<Node>> },
    /// A document, already rendered to HTML.
    Content { body: String, metadata: Metadata },
    /// Any other file, copied verbatim.
    Asset,
}

/// Returns `true` if `file_name` names a document: `.md` or `.html`.
pub fn is_content_file(file_name: &str) -> bool {
    file_name.ends_with(".md") || file_name.ends_with(".html")
}

/// Returns `true` if `file_name` is rendered from markdown.
pub fn is_markdown_file(file_name: &str) -> bool {
    file_name.ends_with(".md")
}

/// The output name of a document: its last extension replaced by `.html`.
pub fn output_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.html"),
        None => format!("{file_name}.html"),
    }
}

impl Node {
    fn new(name: String, source: PathBuf, kind: Kind) -> Self {
        Node { name, source, kind, url: OnceLock::new(), extra: OnceLock::new() }
    }

    pub fn directory<N, P>(name: N, source: P, children: Vec<Arc<Node>>) -> Self
        where N: Into<String>, P: Into<PathBuf>
    {
        Node::new(name.into(), source.into(), Kind::Directory { children })
    }

    pub fn content<N, P>(name: N, source: P, body: String, metadata: Metadata) -> Self
        where N: Into<String>, P: Into<PathBuf>
    {
        Node::new(name.into(), source.into(), Kind::Content { body, metadata })
    }

    pub fn asset<N, P>(name: N, source: P) -> Self
        where N: Into<String>, P: Into<PathBuf>
    {
        Node::new(name.into(), source.into(), Kind::Asset)
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            Kind::Directory { .. } => "directory",
            Kind::Content { .. } => "content",
            Kind::Asset => "asset",
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, Kind::Directory { .. })
    }

    pub fn children(&self) -> &[Arc<Node>] {
        match &self.kind {
            Kind::Directory { children } => children.as_slice(),
            _ => &[],
        }
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        match &self.kind {
            Kind::Content { metadata, .. } => Some(metadata),
            _ => None,
        }
    }

    /// The rendered HTML of a document.
    pub fn body(&self) -> Option<&str> {
        match &self.kind {
            Kind::Content { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The node's URL, once the process phase has assigned it.
    pub fn url(&self) -> Option<&str> {
        self.url.get().map(|s| s.as_str())
    }

    /// The value attached by a processor, if any.
    pub fn extra(&self) -> Option<&serde_json::Value> {
        self.extra.get()
    }

    /// Assigns the URL. Returns `false` if one was already assigned.
    pub(crate) fn set_url(&self, url: String) -> bool {
        self.url.set(url).is_ok()
    }

    /// Attaches a processor value. Returns `false` if one was already set.
    pub(crate) fn set_extra(&self, extra: serde_json::Value) -> bool {
        self.extra.set(extra).is_ok()
    }

    /// Pre-order iterator over `self` and all of its descendants.
    pub fn iter_depth_first(&self) -> Dfs<'_> {
        Dfs { stack: vec![self] }
    }

    /// Counts the nodes of each kind in this subtree.
    pub fn counts(&self) -> Counts {
        self.iter_depth_first().fold(Counts::default(), |mut counts, node| {
            match node.kind {
                Kind::Directory { .. } => counts.directories += 1,
                Kind::Content { .. } => counts.documents += 1,
                Kind::Asset => counts.assets += 1,
            }

            counts
        })
    }

    /// Looks up a descendant by its output-relative path, `/`-separated.
    pub fn find(&self, path: &str) -> Option<&Node> {
        path.split('/')
            .filter(|c| !c.is_empty())
            .try_fold(self, |node, name| {
                node.children().iter().map(|c| &**c).find(|c| c.name == name)
            })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub directories: usize,
    pub documents: usize,
    pub assets: usize,
}

impl Counts {
    /// The number of write units: one per document and asset.
    pub fn units(&self) -> usize {
        self.documents + self.assets
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} directories, {} documents, {} assets",
            self.directories, self.documents, self.assets)
    }
}

pub struct Dfs<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Dfs<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev().map(|c| &**c));
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(Node: Send, Sync);

    fn sample() -> Node {
        let post = Node::content("post.html", "content/blog/post.md", "<p>x</p>".into(),
            Metadata::with_template("page"));
        let blog = Node::directory("blog", "content/blog", vec![Arc::new(post)]);
        let css = Node::asset("site.css", "content/site.css");
        let index = Node::content("index.html", "content/index.html", "hi".into(),
            Metadata::with_template("page"));

        Node::directory("", "content", vec![Arc::new(blog), Arc::new(index), Arc::new(css)])
    }

    #[test]
    fn classifies_file_names() {
        assert!(is_content_file("post.md"));
        assert!(is_content_file("index.html"));
        assert!(!is_content_file("style.css"));
        assert!(!is_content_file("notes.markdown"));
        assert!(is_markdown_file("a.b.md"));
        assert!(!is_markdown_file("a.html"));
    }

    #[test]
    fn output_names() {
        assert_eq!(output_name("post.md"), "post.html");
        assert_eq!(output_name("index.html"), "index.html");
        assert_eq!(output_name("v1.2.notes.md"), "v1.2.notes.html");
    }

    #[test]
    fn depth_first_is_pre_order() {
        let root = sample();
        let names: Vec<_> = root.iter_depth_first().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["", "blog", "post.html", "index.html", "site.css"]);
    }

    #[test]
    fn counts_by_kind() {
        let counts = sample().counts();
        assert_eq!(counts, Counts { directories: 2, documents: 2, assets: 1 });
        assert_eq!(counts.units(), 3);
    }

    #[test]
    fn find_by_path() {
        let root = sample();
        assert_eq!(root.find("blog/post.html").unwrap().kind_name(), "content");
        assert_eq!(root.find("").unwrap().name, "");
        assert!(root.find("blog/missing.html").is_none());
    }

    #[test]
    fn kind_determines_fields() {
        let root = sample();
        assert!(root.metadata().is_none());
        assert!(root.body().is_none());

        let css = root.find("site.css").unwrap();
        assert!(css.children().is_empty());
        assert!(css.metadata().is_none());

        let post = root.find("blog/post.html").unwrap();
        assert_eq!(post.body(), Some("<p>x</p>"));
        assert!(post.children().is_empty());
    }

    #[test]
    fn annotations_are_set_once() {
        let node = Node::asset("a.png", "content/a.png");
        assert!(node.url().is_none());
        assert!(node.set_url("/a.png".into()));
        assert!(!node.set_url("/b.png".into()));
        assert_eq!(node.url(), Some("/a.png"));

        assert!(node.set_extra(serde_json::json!({ "size": 3 })));
        assert!(!node.set_extra(serde_json::Value::Null));
        assert_eq!(node.extra().unwrap()["size"], 3);
    }
}
