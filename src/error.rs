//! Error types for yamll

use thiserror::Error;

/// Errors produced while resolving, merging or post-processing YAML fragments
#[derive(Debug, Error)]
pub enum Error {
    /// Reading a dependency's content failed (I/O, network, auth)
    #[error("reading YAML dependency '{path}' failed: {message}")]
    Fetch {
        /// Path of the dependency as written in the directive
        path: String,
        /// Underlying failure
        message: String,
    },

    /// A directive line is malformed or its JSON auth suffix does not decode
    #[error("reading directive '{directive}' failed: {message}")]
    Directive {
        /// The offending directive line
        directive: String,
        /// What went wrong
        message: String,
    },

    /// A `git+` import could not be decomposed into repository, ref and path
    #[error("unable to parse git import '{path}': {message}")]
    GitImport {
        /// The git import path
        path: String,
        /// What was missing
        message: String,
    },

    /// Two fragments import each other directly
    #[error("cyclic import: '{file}' and '{dependency}' import each other")]
    MutualImport {
        /// Fragment being merged
        file: String,
        /// Dependency that imports it back
        dependency: String,
    },

    /// Full cycle detection found a back edge
    #[error("import cycle detected: {}", chain.join(" -> "))]
    ImportCycle {
        /// Paths on the cycle, first path repeated at the end
        chain: Vec<String>,
    },

    /// Import chain deeper than the graph, only possible through a cycle
    #[error("import chain through '{path}' is deeper than the {limit} known fragments, imports are cyclic")]
    ImportDepthExceeded {
        /// Fragment at which the guard tripped
        path: String,
        /// Number of fragments in the graph
        limit: usize,
    },

    /// A dependency listed by a fragment has no entry in the route graph
    #[error("dependency '{0}' is missing from the route graph")]
    MissingRoute(String),

    /// A YAML document could not be parsed
    #[error("deserialising YAML document {document} errored: {message}")]
    Yaml {
        /// Source header or 1-based index of the document
        document: String,
        /// Parser message
        message: String,
    },

    /// Serialising a YAML value failed
    #[error("serialising YAML errored: {0}")]
    Emit(String),

    /// Exploded output did not re-parse as YAML
    #[error("exploded output is invalid YAML: {0}")]
    InvalidExplodedOutput(String),

    /// Final output failed syntax validation
    #[error("the final rendered YAML is not valid: {0}")]
    Validation(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a fetch error for `path` from any displayable failure
    pub fn fetch(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Fetch {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for yamll operations
pub type Result<T> = std::result::Result<T, Error>;
