pub mod minijinja;

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::Result;
use crate::tree::Node;

pub use self::minijinja::MiniJinjaEngine;

/// A template registry. Initialized once, then shared read-only by every
/// write unit.
pub trait Engine: Send + Sync + Debug {
    /// Renders the template `name` with `node` as the context.
    fn render(&self, name: &str, node: &Arc<Node>) -> Result<String>;

    /// Renders the template source `template_str` with `node` as the context.
    fn render_str(&self, template_str: &str, node: &Arc<Node>) -> Result<String>;
}

/// The file name a template is looked up under: `name` itself if it has an
/// extension, `name.html` otherwise.
pub fn template_file_name(name: &str) -> std::borrow::Cow<'_, str> {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    match file_name.contains('.') {
        true => name.into(),
        false => format!("{name}.html").into(),
    }
}
