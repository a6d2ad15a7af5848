//! Flattening of the route graph into one text
//!
//! Every fragment is emitted exactly once: imports first, depth-first in
//! declaration order, then the importing fragment. Roots come last in their
//! own subtree and are emitted in caller order.

use crate::error::{Error, Result};
use crate::graph::RouteGraph;
use std::collections::HashMap;
use std::fmt::Write;
use tracing::{debug, warn};

/// Separator written before each fragment block
pub const DEFAULT_LIMITER: &str = "---";

/// How import cycles are detected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CycleCheck {
    /// Reject fragments that import each other directly.
    ///
    /// Longer cycles are not recognised as such; they stop with
    /// [`Error::ImportDepthExceeded`] once the import chain gets deeper than
    /// the graph.
    #[default]
    Mutual,
    /// Reject every cycle, reporting the full chain
    Full,
}

/// Options for [`merge_routes`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Line written before each fragment block
    pub limiter: String,
    /// Cycle detection policy
    pub cycle_check: CycleCheck,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            limiter: DEFAULT_LIMITER.to_string(),
            cycle_check: CycleCheck::default(),
        }
    }
}

/// Flatten `graph` into `<limiter>\n# Source: <path>\n<body>\n` blocks.
///
/// Marks every emitted fragment as merged.
pub fn merge_routes(graph: &mut RouteGraph, options: &MergeOptions) -> Result<String> {
    if options.cycle_check == CycleCheck::Full {
        check_cycles(graph)?;
    }

    let mut out = String::new();
    let roots = graph.roots().to_vec();

    for root in &roots {
        merge_dependencies(graph, root, options, 0, &mut out)?;

        let entry = graph
            .get_mut(root)
            .ok_or_else(|| Error::MissingRoute(root.clone()))?;
        push_block(&mut out, &options.limiter, &entry.path, &entry.body);
        entry.merged = true;
        debug!(root = %root, "merged root fragment");
    }

    Ok(out)
}

fn push_block(out: &mut String, limiter: &str, path: &str, body: &str) {
    let _ = writeln!(out, "{limiter}\n# Source: {path}\n{body}");
}

fn merge_dependencies(
    graph: &mut RouteGraph,
    file: &str,
    options: &MergeOptions,
    depth: usize,
    out: &mut String,
) -> Result<()> {
    let limit = graph.len();
    if depth >= limit {
        return Err(Error::ImportDepthExceeded {
            path: file.to_string(),
            limit,
        });
    }

    let dependencies = graph
        .get(file)
        .ok_or_else(|| Error::MissingRoute(file.to_string()))?
        .dependencies
        .clone();

    for dependency in &dependencies {
        let target = graph
            .get(&dependency.path)
            .ok_or_else(|| Error::MissingRoute(dependency.path.clone()))?;

        if target.merged {
            warn!(file, dependency = %dependency.path, "dependency already merged, skipping");
            continue;
        }

        if target.imports(file) {
            return Err(Error::MutualImport {
                file: file.to_string(),
                dependency: dependency.path.clone(),
            });
        }

        merge_dependencies(graph, &dependency.path, options, depth + 1, out)?;

        let target = graph
            .get_mut(&dependency.path)
            .ok_or_else(|| Error::MissingRoute(dependency.path.clone()))?;
        if !target.merged && !target.is_entry_root {
            push_block(out, &options.limiter, &target.path, &target.body);
            target.merged = true;
        }
    }

    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first coloring over every root, failing on the first back edge
fn check_cycles(graph: &RouteGraph) -> Result<()> {
    let mut marks = HashMap::new();
    let mut stack = Vec::new();
    for root in graph.roots() {
        visit(graph, root, &mut marks, &mut stack)?;
    }
    Ok(())
}

fn visit<'a>(
    graph: &'a RouteGraph,
    path: &'a str,
    marks: &mut HashMap<&'a str, Mark>,
    stack: &mut Vec<&'a str>,
) -> Result<()> {
    match marks.get(path) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = stack.iter().position(|p| *p == path).unwrap_or_default();
            let mut chain: Vec<String> = stack[start..].iter().map(ToString::to_string).collect();
            chain.push(path.to_string());
            return Err(Error::ImportCycle { chain });
        }
        None => {}
    }

    let entry = graph
        .get(path)
        .ok_or_else(|| Error::MissingRoute(path.to_string()))?;

    marks.insert(path, Mark::Visiting);
    stack.push(path);
    for dependency in &entry.dependencies {
        visit(graph, &dependency.path, marks, stack)?;
    }
    stack.pop();
    marks.insert(path, Mark::Done);

    Ok(())
}
