use std::path::PathBuf;
use std::process::ExitCode;

use sitegen::{Config, Report, Site};
use sitegen::error::Result;

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Builds the site rooted at ROOT, the current directory by default.
        cmd sitegen {
            optional root: PathBuf
            /// Directory mirrored into the output.
            optional --content dir: PathBuf
            /// Directory the site is written to.
            optional --output dir: PathBuf
            /// Directory templates are loaded from.
            optional --templates dir: PathBuf
            /// Template for documents that don't name one.
            optional --default-template name: String
            /// Don't draw the progress bar.
            optional --no-progress
            /// Only log warnings and errors.
            optional -q, --quiet
        }
    }
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn config(flags: flags::Sitegen) -> Result<Config> {
    let root = flags.root.unwrap_or_else(|| PathBuf::from("."));
    let mut config = Config::discover(&root)?;
    if let Some(content) = flags.content {
        config.content = content;
    }

    if let Some(output) = flags.output {
        config.output = output;
    }

    if let Some(templates) = flags.templates {
        config.templates = templates;
    }

    if let Some(name) = flags.default_template {
        config.default_template = name;
    }

    config.progress &= !flags.no_progress;
    Ok(config)
}

fn build(flags: flags::Sitegen) -> Result<Report> {
    let config = config(flags)?;
    tracing::debug!(?config, "configured");
    Site::new(config).build()
}

pub fn main() -> ExitCode {
    let flags = flags::Sitegen::from_env_or_exit();
    init_logging(flags.quiet);

    let start = std::time::Instant::now();
    match build(flags) {
        Ok(report) => {
            tracing::info!("built {} in {}ms", report.counts, start.elapsed().as_millis());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("build failed:\n{e}");
            ExitCode::FAILURE
        }
    }
}
