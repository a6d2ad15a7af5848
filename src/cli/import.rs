//! Import command - resolve imports and merge them into one YAML stream

use crate::cli::context::CommandContext;
use crate::cli::{CommonArgs, OutputArgs};
use anyhow::{Context, Result};
use yamll::PostProcess;

/// Options for the import command
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportFlags {
    /// Deep-merge every fragment into one document
    pub effective: bool,
    /// Expand anchors, aliases and merge keys
    pub explode: bool,
}

impl ImportFlags {
    const fn post_process(self) -> PostProcess {
        if self.effective {
            PostProcess::EffectiveMerge
        } else if self.explode {
            PostProcess::Explode
        } else {
            PostProcess::None
        }
    }
}

/// Run the import command
pub async fn run_import(
    common: &CommonArgs,
    output: &OutputArgs,
    flags: ImportFlags,
) -> Result<()> {
    let ctx = CommandContext::new(common, flags.post_process())?;

    let rendered = ctx
        .yamll
        .import()
        .await
        .context("errored generating final yaml")?;

    ctx.emit(output, &rendered)
}
