//! Build command - explode root files with anchors from every import

use crate::cli::context::CommandContext;
use crate::cli::{CommonArgs, OutputArgs};
use anyhow::{Context, Result};
use yamll::PostProcess;

/// Run the build command
pub async fn run_build(common: &CommonArgs, output: &OutputArgs) -> Result<()> {
    let ctx = CommandContext::new(common, PostProcess::None)?;

    let rendered = ctx
        .yamll
        .build()
        .await
        .context("errored building final yaml")?;

    ctx.emit(output, &rendered)
}
