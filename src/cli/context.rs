//! Shared command context for CLI commands
//!
//! Extracts the setup shared by import, build and tree: logging, pipeline
//! options and output handling.

use crate::cli::style::{Stylize, check};
use crate::cli::{CommonArgs, OutputArgs};
use anstream::eprintln;
use anyhow::{Context, Result};
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use yamll::merge::{CycleCheck, MergeOptions};
use yamll::validate::validate_syntax;
use yamll::{ImportOptions, PostProcess, Yamll};

/// Pipeline and output settings for one command
pub struct CommandContext {
    /// The configured pipeline
    pub yamll: Yamll,
}

impl CommandContext {
    /// Install logging and configure the pipeline
    pub fn new(common: &CommonArgs, post_process: PostProcess) -> Result<Self> {
        init_logging(&common.log_level)?;

        let cycle_check = if common.strict_cycles {
            CycleCheck::Full
        } else {
            CycleCheck::Mutual
        };

        let options = ImportOptions {
            files: common.files.clone(),
            merge: MergeOptions {
                limiter: common.limiter.clone(),
                cycle_check,
            },
            post_process,
        };

        Ok(Self {
            yamll: Yamll::new(options),
        })
    }

    /// Validate `content` unless disabled, then write it out
    pub fn emit(&self, output: &OutputArgs, content: &str) -> Result<()> {
        if !output.no_validation
            && let Err(err) = validate_syntax(content)
        {
            error!("rendering the final YAML encountered an error. skip validation to view the broken file.");
            return Err(err.into());
        }

        match &output.to_file {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("writing output to '{}'", path.display()))?;
                eprintln!("{} Wrote {}", check(), path.display().to_string().emphasis());
            }
            None => anstream::print!("{content}"),
        }
        Ok(())
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_new(level).with_context(|| format!("invalid log level '{level}'"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .context("installing the logger")?;
    Ok(())
}
