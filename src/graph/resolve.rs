//! Dependency resolution - build the route graph by following imports
//!
//! Resolution is depth-first and sequential: one fetch in flight at a time,
//! each path fetched at most once.

use super::{RouteEntry, RouteGraph};
use crate::directive::parse_fragment;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::types::Dependency;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info};

type LevelFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Resolve `roots` and everything they import.
///
/// Only the paths in `roots` are marked as entry roots. A root already
/// imported by an earlier root is kept as an ordinary fragment.
pub async fn resolve(fetcher: &dyn Fetcher, roots: &[Dependency]) -> Result<RouteGraph> {
    let mut graph = RouteGraph::new();
    resolve_level(fetcher, &mut graph, roots, true).await?;

    info!(
        fragments = graph.len(),
        roots = graph.roots().len(),
        "resolved YAML imports"
    );
    Ok(graph)
}

/// Resolve one list of siblings, recursing into newly discovered imports
fn resolve_level<'a>(
    fetcher: &'a dyn Fetcher,
    graph: &'a mut RouteGraph,
    dependencies: &'a [Dependency],
    entry_level: bool,
) -> LevelFuture<'a> {
    Box::pin(async move {
        for (discovery_index, dependency) in dependencies.iter().enumerate() {
            if graph.contains(&dependency.path) {
                debug!(path = %dependency.path, "dependency already resolved, skipping");
                continue;
            }

            debug!(path = %dependency.path, kind = %dependency.kind, "fetching dependency");
            let content = fetcher.fetch(dependency).await?;
            let fragment = parse_fragment(&content)?;

            graph.insert(RouteEntry {
                is_entry_root: entry_level,
                path: dependency.path.clone(),
                body: fragment.body,
                dependencies: fragment.dependencies.clone(),
                merged: false,
                discovery_index,
            });

            if !fragment.dependencies.is_empty() {
                resolve_level(fetcher, graph, &fragment.dependencies, false).await?;
            }
        }
        Ok(())
    })
}
