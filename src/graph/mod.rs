//! Route graph of fragments and their imports
//!
//! Built once by [`resolve`], consumed once by [`crate::merge::merge_routes`].

mod resolve;
mod tree;

pub use resolve::resolve;
pub use tree::render_tree;

use crate::types::Dependency;
use indexmap::IndexMap;

/// One fetched fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// Whether the caller supplied this path directly
    pub is_entry_root: bool,
    /// Import path, also the graph key
    pub path: String,
    /// Fragment text without directives and blank lines
    pub body: String,
    /// Imports in declaration order
    pub dependencies: Vec<Dependency>,
    /// Set once the merge engine has emitted this fragment
    pub merged: bool,
    /// Position among its siblings when first discovered
    pub discovery_index: usize,
}

impl RouteEntry {
    /// Whether this fragment lists `path` among its imports
    pub fn imports(&self, path: &str) -> bool {
        self.dependencies.iter().any(|dep| dep.path == path)
    }
}

/// Fragments keyed by path, in discovery order, plus the caller's roots
#[derive(Debug, Clone, Default)]
pub struct RouteGraph {
    entries: IndexMap<String, RouteEntry>,
    roots: Vec<String>,
}

impl RouteGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry unless its path is already known.
    ///
    /// Returns whether the entry was inserted. Root entries are appended to
    /// the root list.
    pub fn insert(&mut self, entry: RouteEntry) -> bool {
        if self.entries.contains_key(&entry.path) {
            return false;
        }
        if entry.is_entry_root {
            self.roots.push(entry.path.clone());
        }
        self.entries.insert(entry.path.clone(), entry);
        true
    }

    /// Whether `path` has been resolved
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Entry for `path`
    pub fn get(&self, path: &str) -> Option<&RouteEntry> {
        self.entries.get(path)
    }

    /// Mutable entry for `path`
    pub fn get_mut(&mut self, path: &str) -> Option<&mut RouteEntry> {
        self.entries.get_mut(path)
    }

    /// Root paths in caller order
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Entries in discovery order
    pub fn entries(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.values()
    }

    /// Number of fragments
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the graph holds no fragments
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
