//! Pipeline entry points: import, build and tree

use crate::error::Result;
use crate::fetch::{Fetcher, SourceFetcher};
use crate::graph::{RouteGraph, render_tree, resolve};
use crate::merge::{
    MergeOptions, effective_merge, ensure_strict, explode, merge_routes, render_document,
};
use crate::types::Dependency;
use crate::yaml::{self, AnchorScope, Document};
use tracing::{debug, info};

/// Optional pass applied to the flattened text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostProcess {
    /// Emit the flattened blocks as they are
    #[default]
    None,
    /// Deep-merge all documents into one
    EffectiveMerge,
    /// Expand anchors, aliases and merge keys
    Explode,
}

/// Configuration of one run
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Root fragments in the order their output should appear
    pub files: Vec<String>,
    /// Limiter and cycle policy
    pub merge: MergeOptions,
    /// Pass applied by [`Yamll::import`]
    pub post_process: PostProcess,
}

/// Resolves and merges a set of root fragments
pub struct Yamll {
    options: ImportOptions,
    fetcher: Box<dyn Fetcher>,
}

impl Yamll {
    /// Create a pipeline reading sources with [`SourceFetcher`]
    pub fn new(options: ImportOptions) -> Self {
        Self::with_fetcher(options, Box::new(SourceFetcher::new()))
    }

    /// Create a pipeline reading sources with `fetcher`
    pub fn with_fetcher(options: ImportOptions, fetcher: Box<dyn Fetcher>) -> Self {
        Self { options, fetcher }
    }

    /// The configured options
    pub const fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Resolve the configured roots into a route graph
    pub async fn resolve(&self) -> Result<RouteGraph> {
        let roots: Vec<Dependency> = self.options.files.iter().map(Dependency::new).collect();
        resolve(self.fetcher.as_ref(), &roots).await
    }

    /// Resolve, flatten and post-process
    pub async fn import(&self) -> Result<String> {
        let mut graph = self.resolve().await?;
        let merged = merge_routes(&mut graph, &self.options.merge)?;

        match self.options.post_process {
            PostProcess::None => Ok(merged),
            PostProcess::EffectiveMerge => effective_merge(&merged),
            PostProcess::Explode => explode(&merged),
        }
    }

    /// Explode each root's own body, resolving aliases against every fragment.
    ///
    /// Imports are not emitted; they only contribute anchors. Every document of
    /// every root is written, in root order.
    pub async fn build(&self) -> Result<String> {
        let graph = self.resolve().await?;

        // documents of every fragment, grouped by fragment path
        let mut index = 0;
        let mut fragments: Vec<(&str, Vec<Document>)> = Vec::new();
        for entry in graph.entries() {
            let text = format!("# Source: {}\n{}", entry.path, entry.body);
            let documents = yaml::split_documents(&text)
                .into_iter()
                .map(|document| {
                    index += 1;
                    Document::new(index, document.text)
                })
                .collect();
            fragments.push((entry.path.as_str(), documents));
        }

        let all: Vec<Document> = fragments
            .iter()
            .flat_map(|(_, documents)| documents.iter().cloned())
            .collect();
        let scope = AnchorScope::from_documents(&all)?;
        debug!(anchors = scope.len(), "built anchor references from all fragments");

        let mut out = String::new();
        for root in graph.roots() {
            let Some((_, documents)) = fragments.iter().find(|(path, _)| path == root) else {
                continue;
            };
            if documents.is_empty() {
                debug!(root = %root, "root has no body of its own, skipping");
                continue;
            }
            for document in documents {
                let value = yaml::load_document(document, &scope, true)?;
                out.push_str(&render_document(document.header.as_deref(), &value)?);
            }
        }

        ensure_strict(&out)?;
        info!(roots = graph.roots().len(), "built root fragments");
        Ok(out)
    }

    /// Resolve and render the import tree
    pub async fn tree(&self) -> Result<String> {
        let graph = self.resolve().await?;
        Ok(render_tree(&graph))
    }
}
