//! yamll - compose one YAML document from fragments that import each other

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::{CommonArgs, ImportFlags, OutputArgs};

/// Compose one YAML document from YAML fragments
///
/// Fragments import each other with directive lines such as
/// `##++path/to/base.yaml`, `##++https://host/file.yaml` or
/// `##++git+https://host/org/repo@main?path=file.yaml`. An optional
/// `;{"user_name":"${USER}","password":"${PASS}"}` suffix supplies
/// credentials, with `${VAR}` read from the environment.
#[derive(Parser)]
#[command(name = "yamll")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import all the dependency YAML files into one
    ///
    /// Identifies the dependency tree and imports the files in order to
    /// generate one single YAML stream.
    Import {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Deep-merge every fragment into one effective document
        #[arg(long, conflicts_with = "explode")]
        effective: bool,

        /// Expand all anchors, aliases and merge keys into plain values
        #[arg(long)]
        explode: bool,
    },

    /// Build the root files, resolving anchors defined in any imported file
    Build {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the dependency tree of the root files
    Tree {
        #[command(flatten)]
        common: CommonArgs,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Print the version and build information of yamll
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Import {
            common,
            output,
            effective,
            explode,
        } => cli::run_import(&common, &output, ImportFlags { effective, explode }).await,
        Commands::Build { common, output } => cli::run_build(&common, &output).await,
        Commands::Tree { common, no_color } => cli::run_tree(&common, no_color).await,
        Commands::Version => cli::run_version(),
    }
}
