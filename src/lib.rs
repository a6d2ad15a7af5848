//! yamll - compose one YAML document from fragments that import each other
//!
//! A fragment declares imports with directive lines:
//!
//! ```text
//! ##++base.yaml
//! ##++https://example.com/shared.yaml;{"barer_token":"${TOKEN}"}
//! ##++git+https://github.com/org/repo@main?path=config/common.yaml
//! ```
//!
//! The pipeline is:
//! 1. [`directive`] - extract imports and the directive-free body
//! 2. [`graph`] - fetch every fragment once and build the route graph
//! 3. [`merge`] - flatten the graph, imports before importers, each fragment once
//! 4. optionally [`merge::effective_merge`] or [`merge::explode`] on the result
//!
//! [`Yamll`] drives the whole pipeline.

pub mod directive;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod merge;
pub mod types;
pub mod validate;
pub mod yaml;
mod yamll;

pub use error::{Error, Result};
pub use yamll::{ImportOptions, PostProcess, Yamll};
