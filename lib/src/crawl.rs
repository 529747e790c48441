use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::error::{Chainable, Error, Result};
use crate::failure::Failures;
use crate::markdown::{split_front_matter, Markdown};
use crate::metadata::Metadata;
use crate::tree::{is_content_file, is_markdown_file, output_name, Node};

/// Builds the content tree from a source directory.
///
/// Documents are read, split, decoded and rendered as they are found. A
/// document that fails any of these steps is still added to the tree, with
/// default metadata and an empty body, and its error goes to the parse
/// [`Failures`]; the crawl carries on with its siblings. Failing to list a
/// directory aborts the crawl.
#[derive(Debug)]
pub struct Crawler<'a> {
    root: &'a Path,
    default_template: &'a str,
    markdown: Markdown,
    failures: &'a Failures,
}

impl<'a> Crawler<'a> {
    pub fn new(root: &'a Path, default_template: &'a str, failures: &'a Failures) -> Self {
        Crawler { root, default_template, markdown: Markdown::default(), failures }
    }

    pub fn with_markdown(mut self, markdown: Markdown) -> Self {
        self.markdown = markdown;
        self
    }

    /// Crawls the whole tree. The root node's name is empty: it maps onto
    /// the output directory itself.
    ///
    /// Entries are visited depth-first in file name order, symlinks
    /// followed. Directories under construction sit on a stack indexed by
    /// depth; a directory is attached to its parent once the walk leaves it.
    pub fn crawl(&self) -> Result<Node> {
        let mut stack: Vec<Partial> = vec![];
        let mut walker = WalkDir::new(self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(self.root).display().to_string();
                    return Err(Error::from(e).chain(error! {
                        "failed to list directory",
                        "path" => path,
                    }));
                }
            };

            while stack.len() > entry.depth() {
                close(&mut stack);
            }

            if entry.depth() == 0 {
                if !entry.file_type().is_dir() {
                    return err! {
                        "failed to list directory",
                        "path" => self.root.display(),
                        "not a directory",
                    };
                }

                stack.push(Partial::new(String::new(), entry.into_path()));
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type().is_dir();
            let child = if is_content_file(&file_name) {
                if is_dir {
                    walker.skip_current_dir();
                }

                self.document(&file_name, entry.into_path())
            } else if is_dir {
                stack.push(Partial::new(file_name, entry.into_path()));
                continue;
            } else {
                Node::asset(file_name, entry.into_path())
            };

            if let Some(parent) = stack.last_mut() {
                parent.children.push(Arc::new(child));
            }
        }

        while stack.len() > 1 {
            close(&mut stack);
        }

        match stack.pop() {
            Some(root) => Ok(root.into_node()),
            None => err!("failed to list directory", "path" => self.root.display()),
        }
    }

    fn document(&self, file_name: &str, path: PathBuf) -> Node {
        tracing::info!(" -> {}", self.relative(&path).display());
        let parsed = self.parse(file_name, &path).chain_with(|| error! {
            "failed to parse document",
            "path" => path.display(),
        });

        let (body, metadata) = self.failures.capture(parsed)
            .unwrap_or_else(|| (String::new(), Metadata::with_template(self.default_template)));

        Node::content(output_name(file_name), path, body, metadata)
    }

    fn parse(&self, file_name: &str, path: &Path) -> Result<(String, Metadata)> {
        let data = fs::read(path).chain(error!("failed to read file"))?;
        let (front_matter, body) = split_front_matter(&data)?;
        let metadata = Metadata::decode(front_matter, self.default_template)?;
        let body = std::str::from_utf8(body)
            .map_err(|e| error!("document is not valid UTF-8", e))?;

        let body = match is_markdown_file(file_name) {
            true => self.markdown.render(body),
            false => body.to_string(),
        };

        Ok((body, metadata))
    }

    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(self.root).unwrap_or(path)
    }
}

/// A directory whose children are still being walked.
struct Partial {
    name: String,
    path: PathBuf,
    children: Vec<Arc<Node>>,
}

impl Partial {
    fn new(name: String, path: PathBuf) -> Self {
        Partial { name, path, children: vec![] }
    }

    fn into_node(self) -> Node {
        Node::directory(self.name, self.path, self.children)
    }
}

/// Pops the innermost directory and attaches it to its parent.
fn close(stack: &mut Vec<Partial>) {
    if let Some(dir) = stack.pop() {
        let node = Arc::new(dir.into_node());
        if let Some(parent) = stack.last_mut() {
            parent.children.push(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::Crawler;
    use crate::failure::{Failures, Phase};
    use crate::tree::Kind;
    use crate::tests::write;

    #[test]
    fn mirrors_the_source_tree() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", "<p>home</p>");
        write(dir.path(), "blog/post.md", "---\ntitle: Post\ntemplate: post\n---\n\n# Yup\n");
        write(dir.path(), "blog/img/logo.png", "png");
        write(dir.path(), "style.css", "body {}");

        let failures = Failures::new(Phase::Parse);
        let root = Crawler::new(dir.path(), "page", &failures).crawl().unwrap();
        assert!(failures.is_empty());

        let names: Vec<_> = root.iter_depth_first().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["", "blog", "img", "logo.png", "post.html", "index.html", "style.css"]);

        let post = root.find("blog/post.html").unwrap();
        assert_eq!(post.source, dir.path().join("blog/post.md"));
        let metadata = post.metadata().unwrap();
        assert_eq!(metadata.title, "Post");
        assert_eq!(metadata.template, "post");
        assert_eq!(post.body(), Some("<h1>Yup</h1>\n"));

        assert!(matches!(root.find("blog/img/logo.png").unwrap().kind, Kind::Asset));
        assert!(root.find("blog/img").unwrap().is_directory());
    }

    #[test]
    fn html_documents_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let raw = "<h1>*not* markdown</h1>\n\n    indented\n";
        write(dir.path(), "page.html", &format!("---\ntitle: Raw\n---\n\n{raw}"));
        write(dir.path(), "page2.md", raw);

        let failures = Failures::new(Phase::Parse);
        let root = Crawler::new(dir.path(), "page", &failures).crawl().unwrap();
        assert_eq!(root.find("page.html").unwrap().body(), Some(raw));
        assert_ne!(root.find("page2.html").unwrap().body(), Some(raw));
    }

    #[test]
    fn documents_without_front_matter_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "about.md", "About *me*.");

        let failures = Failures::new(Phase::Parse);
        let root = Crawler::new(dir.path(), "post", &failures).crawl().unwrap();
        let about = root.find("about.html").unwrap();
        assert_eq!(about.metadata().unwrap().template, "post");
        assert_eq!(about.metadata().unwrap().title, "");
        assert_eq!(about.body(), Some("<p>About <em>me</em>.</p>\n"));
    }

    #[test]
    fn parse_failures_are_deferred() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.md", "---\ntitle: never closed\n");
        write(dir.path(), "b.md", "---\ndate: not a date\n---\n\nbody");
        write(dir.path(), "c.md", "fine");

        let failures = Failures::new(Phase::Parse);
        let root = Crawler::new(dir.path(), "page", &failures).crawl().unwrap();
        assert_eq!(root.children().len(), 3);
        assert_eq!(failures.len(), 2);
        assert_eq!(root.find("a.html").unwrap().body(), Some(""));
        assert_eq!(root.find("c.html").unwrap().body(), Some("<p>fine</p>\n"));

        let error = failures.check().unwrap_err();
        assert!(error.mentions("missing front matter terminator"));
        assert!(error.to_string().contains("a.md"));
    }

    #[test]
    fn listing_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let failures = Failures::new(Phase::Parse);
        let missing = dir.path().join("missing");
        let error = Crawler::new(&missing, "page", &failures).crawl().unwrap_err();
        assert!(error.mentions("failed to list directory"));
        assert!(failures.is_empty());
    }

    #[test]
    fn directories_close_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/b/c/deep.txt", "deep");
        write(dir.path(), "a/z.css", "z");
        write(dir.path(), "b.css", "b");

        let failures = Failures::new(Phase::Parse);
        let root = Crawler::new(dir.path(), "page", &failures).crawl().unwrap();
        let names: Vec<_> = root.iter_depth_first().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["", "a", "b", "c", "deep.txt", "z.css", "b.css"]);
        assert_eq!(root.find("a").unwrap().children().len(), 2);
        assert_eq!(root.find("a/b/c/deep.txt").unwrap().source, dir.path().join("a/b/c/deep.txt"));
    }

    #[test]
    fn content_names_win_over_directories() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes.md/inner.png", "png");

        let failures = Failures::new(Phase::Parse);
        let root = Crawler::new(dir.path(), "page", &failures).crawl().unwrap();
        assert_eq!(root.children().len(), 1);
        assert!(matches!(root.find("notes.html").unwrap().kind, Kind::Content { .. }));
        assert_eq!(failures.len(), 1);
        assert_eq!(root.iter_depth_first().count(), 2);
    }

    #[test]
    fn root_must_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "file.txt", "not a dir");

        let failures = Failures::new(Phase::Parse);
        let error = Crawler::new(&dir.path().join("file.txt"), "page", &failures).crawl().unwrap_err();
        assert!(error.mentions("failed to list directory"));
    }

    #[test]
    fn empty_directories_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();

        let failures = Failures::new(Phase::Parse);
        let root = Crawler::new(dir.path(), "page", &failures).crawl().unwrap();
        let empty = root.find("empty").unwrap();
        assert!(empty.is_directory());
        assert!(empty.children().is_empty());
    }
}
