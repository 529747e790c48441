use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Chainable, Result};

/// The name of the configuration file looked for in a site's root.
pub const CONFIG_FILE: &str = "sitegen.toml";

/// Where a site lives and how it is built.
///
/// Read from [`CONFIG_FILE`]; every key is optional. Keys other than the ones
/// below are site globals, exposed to templates as `G`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The source tree mirrored into `output`.
    pub content: PathBuf,
    pub output: PathBuf,
    pub templates: PathBuf,
    /// The template for documents whose front matter doesn't name one.
    pub default_template: String,
    /// Whether to draw the write progress bar.
    pub progress: bool,
    #[serde(flatten)]
    pub globals: toml::Table,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            content: "content".into(),
            output: "static".into(),
            templates: "templates".into(),
            default_template: "page".into(),
            progress: true,
            globals: toml::Table::new(),
        }
    }
}

impl Config {
    /// Reads `root/sitegen.toml` if it exists, defaults otherwise. Relative
    /// directories are resolved against `root`.
    pub fn discover<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let path = root.join(CONFIG_FILE);
        let config = match path.is_file() {
            true => Config::read(&path)?,
            false => Config::default(),
        };

        Ok(config.relative_to(root))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let string = fs::read_to_string(path)
            .chain_with(|| error!("failed to read config", "path" => path.display()))?;

        Config::parse(&string)
            .chain_with(|| error!("invalid config", "path" => path.display()))
    }

    pub fn parse(string: &str) -> Result<Self> {
        Ok(toml::from_str(string)?)
    }

    /// Resolves relative directories against `root`.
    pub fn relative_to(mut self, root: &Path) -> Self {
        for dir in [&mut self.content, &mut self.output, &mut self.templates] {
            if dir.is_relative() {
                *dir = root.join(&*dir);
            }
        }

        self
    }
}
