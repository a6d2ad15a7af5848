//! Version command - print build information as JSON

use anstream::println;
use anyhow::{Context, Result};
use serde::Serialize;

/// Build information of the running binary
#[derive(Debug, Serialize)]
struct BuildInfo {
    version: &'static str,
    os: &'static str,
    arch: &'static str,
}

/// Run the version command
pub fn run_version() -> Result<()> {
    let info = BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
    };
    let json = serde_json::to_string(&info).context("serialising build information")?;
    println!("yamll version: {json}");
    Ok(())
}
