//! Explode - expand anchors, aliases and merge keys into literal values

use crate::error::{Error, Result};
use crate::yaml;
use tracing::debug;
use yaml_rust2::{Yaml, YamlLoader};

/// Rewrite every document of `text` without anchors, aliases or `<<` keys.
///
/// Aliases resolve against anchors from the whole text. Each document keeps
/// its leading comment line. Duplicate keys are rejected, and the result must
/// load with a standard YAML loader.
pub fn explode(text: &str) -> Result<String> {
    let documents = yaml::load_stream(text, true)?;
    debug!(documents = documents.len(), "exploding YAML");

    let mut out = String::new();
    for (document, value) in &documents {
        out.push_str(&render_document(document.header.as_deref(), value)?);
    }

    ensure_strict(&out)?;
    Ok(out)
}

/// Render `---\n<header>\n<document>\n`, leaving the header line out when absent
pub fn render_document(header: Option<&str>, value: &Yaml) -> Result<String> {
    let body = yaml::emit(value)?;
    Ok(match header {
        Some(header) => format!("---\n{header}\n{body}\n"),
        None => format!("---\n{body}\n"),
    })
}

/// Check that `text` loads with the standard loader
pub fn ensure_strict(text: &str) -> Result<()> {
    YamlLoader::load_from_str(text)
        .map(|_| ())
        .map_err(|e| Error::InvalidExplodedOutput(e.to_string()))
}
