//! The write phase: mirroring the content tree into the output directory.
//!
//! Directories are created on the caller's thread, before any of their
//! children are dispatched. Every document and asset is then written by its
//! own unit on the rayon pool, registered with a [`WriteQueue`]; failures go
//! to the generate [`Failures`] and never stop other units.

mod copy;
mod queue;

pub use copy::copy_file;
pub use queue::{Completion, Signal, UnitId, WriteQueue};

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Chainable, Result};
use crate::failure::Failures;
use crate::templating::Engine;
use crate::tree::{Kind, Node};

#[derive(Debug)]
pub struct Writer {
    shared: Arc<Shared>,
    queue: WriteQueue,
}

/// What every unit needs, whichever thread it runs on.
#[derive(Debug)]
struct Shared {
    engine: Arc<dyn Engine>,
    failures: Arc<Failures>,
    output: PathBuf,
}

impl Writer {
    pub fn new<P>(engine: Arc<dyn Engine>, output: P, failures: Arc<Failures>) -> Self
        where P: Into<PathBuf>
    {
        let shared = Shared { engine, failures, output: output.into() };
        Writer { shared: Arc::new(shared), queue: WriteQueue::new() }
    }

    pub fn output(&self) -> &Path {
        &self.shared.output
    }

    /// Writes `root` and everything below it, the root mapping onto the
    /// output directory itself. Returns once every unit is dispatched; use
    /// [`Writer::wait()`] to wait for them to finish.
    pub fn write(&self, root: &Arc<Node>) {
        let path = self.shared.output.join(&root.name);
        self.visit(root, path);
    }

    /// Blocks until every dispatched unit has finished, calling `on_complete`
    /// as each one does. Returns the number of units that finished.
    ///
    /// Only dispatched units are counted: the documents and assets under a
    /// directory that could not be created never become units, so the count
    /// falls short of [`Counts::units()`] exactly when a directory failure
    /// was recorded.
    ///
    /// [`Counts::units()`]: crate::tree::Counts::units
    pub fn wait<F: FnMut(&Completion)>(&self, on_complete: F) -> usize {
        self.queue.wait(on_complete)
    }

    fn visit(&self, node: &Arc<Node>, path: PathBuf) {
        match &node.kind {
            Kind::Directory { children } => {
                let created = fs::create_dir_all(&path).chain_with(|| error! {
                    "failed to create directory",
                    "path" => path.display(),
                });

                if self.shared.failures.capture(created).is_none() {
                    tracing::warn!("skipping {} entries under {}", children.len(), path.display());
                    return;
                }

                for child in children {
                    self.visit(child, path.join(&child.name));
                }
            }
            Kind::Content { .. } | Kind::Asset => self.dispatch(node.clone(), path),
        }
    }

    fn dispatch(&self, node: Arc<Node>, path: PathBuf) {
        let signal = self.queue.register(path.clone());
        let shared = self.shared.clone();
        rayon::spawn(move || {
            let result = shared.write_unit(&node, &path);
            shared.failures.capture(result);
            signal.complete();
        });
    }
}

impl Shared {
    fn write_unit(&self, node: &Arc<Node>, path: &Path) -> Result<()> {
        tracing::debug!(" -> {}", path.strip_prefix(&self.output).unwrap_or(path).display());
        match &node.kind {
            Kind::Content { metadata, .. } => {
                let html = self.engine.render(&metadata.template, node).chain_with(|| error! {
                    "failed to render document",
                    "source" => node.source.display(),
                    "template" => &metadata.template,
                })?;

                write_file(path, html.as_bytes())
            }
            Kind::Asset => copy_file(&node.source, path),
            Kind::Directory { .. } => err! {
                "directory dispatched as a write unit",
                "path" => path.display(),
            },
        }
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    let write = || -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(contents)?;
        writer.flush()
    };

    write().chain_with(|| error!("failed to write file", "path" => path.display()))
}
