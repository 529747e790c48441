#![doc = svgbobdoc::transform!(
//! A static site generator that mirrors a content tree into HTML.
//!
//! # Overview
//!
//! A site is a directory of content, a directory of templates and an output
//! directory. Every file under the content directory has a counterpart in the
//! output: documents (`.md` and `.html` files) are rendered through a
//! template, every other file is copied as is. A build goes through three
//! phases:
//!
//! ```svgbob
//!   content/              +-------+     +---------+     +-------+        static/
//!  +----------+  crawl    | Node  |     |  Node   |     |       |  write +----------+
//!  | .md      |---------->| tree  |---->|  tree   |---->| units |------->| .html    |
//!  | .html    |  parse    +-------+     | + urls  |     +---+---+        | assets   |
//!  | assets   |                process  | + extra |         |            +----------+
//!  +----------+                         +---------+         v
//!                                                      [progress]
//! ```
//!
//!   1. **Crawl.** The content directory is read into a tree of [`Node`]s.
//!      Documents are split into front matter and body, the front matter is
//!      decoded into [`Metadata`], and markdown bodies are rendered to HTML.
//!
//!   2. **Process.** Every node is assigned its URL and, if a processor is
//!      registered with [`Site::set_processor()`], given the processor's
//!      value as `extra`.
//!
//!   3. **Write.** Directories are created, then every document and asset is
//!      written by an independent unit of work. Documents are rendered
//!      through the template named by their metadata with the node itself as
//!      the context.
//!
//! Failures in a phase don't stop the phase: they are collected, and the
//! build stops after the first phase that had any.
//!
//! # Documents
//!
//! A document may begin with YAML front matter:
//!
//! ```text
//! ---
//! title: Testing a new page generator!
//! template: post
//! date: 2014-07-01 12:30:00
//! ---
//!
//! Markdown *body*.
//! ```
//!
//! Code blocks in markdown are emitted as `<highlight language="LANG">`
//! elements for a later syntax-coloring pass.
)]

#[macro_use]
pub mod error;
pub mod config;
pub mod crawl;
pub mod failure;
pub mod markdown;
pub mod metadata;
pub mod process;
pub mod progress;
pub mod site;
pub mod templating;
pub mod tree;
pub mod write;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use error::{Error, Result};
pub use metadata::Metadata;
pub use site::{Report, Site};
pub use tree::{Kind, Node};

pub use rayon;
