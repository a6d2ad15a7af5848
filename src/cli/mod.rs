//! CLI command implementations

mod build;
mod context;
mod import;
mod style;
mod tree;
mod version;

pub use build::run_build;
pub use import::{ImportFlags, run_import};
pub use tree::run_tree;
pub use version::run_version;

use clap::Args;
use std::path::PathBuf;
use yamll::merge::DEFAULT_LIMITER;

/// Flags shared by every command
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Root YAML file to import (repeat for several, output follows the order given)
    #[arg(short, long = "file", value_name = "PATH", required = true)]
    pub files: Vec<String>,

    /// Line written before each merged fragment
    #[arg(long, default_value = DEFAULT_LIMITER)]
    pub limiter: String,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Reject every import cycle, not only fragments importing each other
    #[arg(long)]
    pub strict_cycles: bool,
}

/// Flags of commands that render YAML
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Write the result to this file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub to_file: Option<PathBuf>,

    /// Skip the syntax check of the rendered YAML
    #[arg(long)]
    pub no_validation: bool,
}
