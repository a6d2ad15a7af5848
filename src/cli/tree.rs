//! Tree command - print the import tree of the root files

use crate::cli::CommonArgs;
use crate::cli::context::CommandContext;
use crate::cli::style::Stylize;
use anstream::println;
use anyhow::{Context, Result};
use yamll::PostProcess;

const CYCLE_MARK: &str = " (cycle)";

/// Run the tree command
pub async fn run_tree(common: &CommonArgs, no_color: bool) -> Result<()> {
    if no_color {
        anstream::ColorChoice::Never.write_global();
    }

    let ctx = CommandContext::new(common, PostProcess::None)?;
    let tree = ctx
        .yamll
        .tree()
        .await
        .context("errored resolving the import tree")?;

    for line in tree.lines() {
        if let Some(name) = line.strip_suffix(CYCLE_MARK) {
            println!("{}{}", name, CYCLE_MARK.warning());
        } else if line.starts_with(char::is_whitespace) || line.starts_with(['├', '└', '│']) {
            println!("{line}");
        } else {
            println!("{}", line.emphasis());
        }
    }
    Ok(())
}
