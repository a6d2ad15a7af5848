//! Effective merge - fold every document of the flattened text into one

use crate::error::{Error, Result};
use crate::yaml;
use tracing::debug;
use yaml_rust2::Yaml;
use yaml_rust2::yaml::Hash;

/// Deep-merge all documents of `text` in order.
///
/// Aliases resolve against anchors from the whole text. Every document must
/// be a mapping. Later documents win on conflicting keys, except that two
/// mappings under the same key are merged recursively.
pub fn effective_merge(text: &str) -> Result<String> {
    let documents = yaml::load_stream(text, false)?;
    debug!(documents = documents.len(), "computing effective merge");

    let mut merged = Hash::new();
    for (document, value) in documents {
        let Yaml::Hash(hash) = value else {
            return Err(Error::Yaml {
                document: document.label(),
                message: "the top-level value must be a mapping to be merged".to_string(),
            });
        };
        deep_merge(&mut merged, hash);
    }

    let mut out = yaml::emit(&Yaml::Hash(merged))?;
    out.push('\n');
    Ok(out)
}

/// Merge `src` into `dst`: absent keys are inserted, nested mappings merged,
/// anything else replaced. Keys keep the position of their first appearance.
pub fn deep_merge(dst: &mut Hash, src: Hash) {
    for (key, value) in src {
        if let Some(existing) = dst.get_mut(&key) {
            match (existing, value) {
                (Yaml::Hash(existing), Yaml::Hash(incoming)) => deep_merge(existing, incoming),
                (existing, value) => *existing = value,
            }
        } else {
            dst.insert(key, value);
        }
    }
}
