use std::fmt;
use std::fs;
use std::sync::Arc;

use crate::config::Config;
use crate::crawl::Crawler;
use crate::error::{Chainable, Result};
use crate::failure::{Failures, Phase};
use crate::markdown::Markdown;
use crate::process::{process, Processor};
use crate::progress::Progress;
use crate::templating::{Engine, MiniJinjaEngine};
use crate::tree::{Counts, Node};
use crate::write::Writer;

/// One site build: crawl, process, write.
///
/// Each phase runs to completion before its failures are checked; the first
/// phase with a failure stops the build with that phase's first error.
pub struct Site {
    config: Config,
    markdown: Markdown,
    processor: Option<Box<Processor>>,
}

/// What a successful build did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub counts: Counts,
    /// Write units completed: one per document and asset.
    pub written: usize,
}

impl Site {
    pub fn new(config: Config) -> Self {
        Site { config, markdown: Markdown::default(), processor: None }
    }

    pub fn with_markdown(mut self, markdown: Markdown) -> Self {
        self.markdown = markdown;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registers the processor run on every node before writing. Only one
    /// processor may be registered.
    pub fn set_processor<F>(&mut self, processor: F) -> Result<()>
        where F: Fn(&Node) -> Result<serde_json::Value> + Send + Sync + 'static
    {
        if self.processor.is_some() {
            return err!("a processor is already registered");
        }

        self.processor = Some(Box::new(processor));
        Ok(())
    }

    pub fn build(&self) -> Result<Report> {
        let config = &self.config;

        tracing::info!("==> Crawling");
        let parse_failures = Failures::new(Phase::Parse);
        let root = Crawler::new(&config.content, &config.default_template, &parse_failures)
            .with_markdown(self.markdown)
            .crawl()?;

        tracing::info!("==> Parsing");
        parse_failures.check()?;
        let root = Arc::new(root);

        tracing::info!("==> Processing");
        let process_failures = Failures::new(Phase::Process);
        process(&root, self.processor.as_deref(), &process_failures);
        process_failures.check()?;

        tracing::info!("==> Generating");
        fs::create_dir_all(&config.output).chain_with(|| error! {
            "failed to create output directory",
            "path" => config.output.display(),
        })?;

        let counts = root.counts();
        let engine: Arc<dyn Engine> = Arc::new(MiniJinjaEngine::new(&config.templates, &config.globals));
        let generate_failures = Arc::new(Failures::new(Phase::Generate));
        let writer = Writer::new(engine, &config.output, generate_failures.clone());
        let progress = Progress::new("write", counts.units(), config.progress);

        writer.write(&root);
        let written = writer.wait(|_| { progress.inc(); });
        progress.finish();
        generate_failures.check()?;

        tracing::info!("wrote {counts} to {}", config.output.display());
        Ok(Report { counts, written })
    }
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("config", &self.config)
            .field("markdown", &self.markdown)
            .field("processor", &self.processor.is_some())
            .finish()
    }
}
