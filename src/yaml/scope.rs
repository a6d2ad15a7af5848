//! Anchor namespace shared by every document of a stream

use super::loader::{self, LoadError};
use super::Document;
use crate::error::{Error, Result};
use std::collections::HashMap;
use tracing::debug;
use yaml_rust2::Yaml;

/// Anchors defined anywhere in a stream, by name
#[derive(Debug, Clone, Default)]
pub struct AnchorScope {
    anchors: HashMap<String, Yaml>,
}

impl AnchorScope {
    /// Collect the anchors of `documents`.
    ///
    /// Documents whose aliases point at anchors defined further down are
    /// retried once more of the scope is known. When a name is defined more
    /// than once, the definition in the latest document wins.
    pub fn from_documents(documents: &[Document]) -> Result<Self> {
        let mut found: Vec<Option<HashMap<String, Yaml>>> = vec![None; documents.len()];
        let mut scope = Self::default();

        loop {
            let mut progressed = false;
            let mut missing = None;

            for (slot, document) in found.iter_mut().zip(documents) {
                if slot.is_some() {
                    continue;
                }
                match loader::load(&document.text, &scope, false) {
                    Ok(loaded) => {
                        scope.anchors.extend(loaded.anchors.clone());
                        *slot = Some(loaded.anchors);
                        progressed = true;
                    }
                    Err(LoadError::UnknownAnchor(name)) => {
                        missing.get_or_insert((document, name));
                    }
                    Err(err) => return Err(err.for_document(document)),
                }
            }

            match missing {
                None => break,
                Some((document, name)) if !progressed => {
                    return Err(Error::Yaml {
                        document: document.label(),
                        message: format!("unknown anchor '{name}'"),
                    });
                }
                Some(_) => debug!("retrying documents with forward anchor references"),
            }
        }

        let anchors = found.into_iter().flatten().fold(HashMap::new(), |mut all, defined| {
            all.extend(defined);
            all
        });
        debug!(anchors = anchors.len(), "built anchor scope");

        Ok(Self { anchors })
    }

    /// Look up an anchor by name
    pub fn get(&self, name: &str) -> Option<&Yaml> {
        self.anchors.get(name)
    }

    /// Number of distinct anchor names
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether no anchors are defined
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}
