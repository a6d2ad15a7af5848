//! Plain-text rendering of the import tree

use super::RouteGraph;
use std::fmt::Write;

const BRANCH: &str = "├── ";
const LAST: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Render every root and its imports as a box-drawing tree.
///
/// An import already on the current branch is marked `(cycle)` and not
/// expanded again.
pub fn render_tree(graph: &RouteGraph) -> String {
    let mut out = String::new();
    for root in graph.roots() {
        out.push_str(root);
        out.push('\n');
        let mut branch = vec![root.as_str()];
        render_children(graph, root, "", &mut branch, &mut out);
    }
    out
}

fn render_children<'a>(
    graph: &'a RouteGraph,
    path: &str,
    prefix: &str,
    branch: &mut Vec<&'a str>,
    out: &mut String,
) {
    let Some(entry) = graph.get(path) else {
        return;
    };

    let count = entry.dependencies.len();
    for (i, dependency) in entry.dependencies.iter().enumerate() {
        let last = i + 1 == count;
        let connector = if last { LAST } else { BRANCH };
        let child = dependency.path.as_str();

        if branch.contains(&child) {
            let _ = writeln!(out, "{prefix}{connector}{child} (cycle)");
            continue;
        }
        let _ = writeln!(out, "{prefix}{connector}{child}");

        let nested = format!("{prefix}{}", if last { SPACE } else { PIPE });
        branch.push(child);
        render_children(graph, child, &nested, branch, out);
        branch.pop();
    }
}
