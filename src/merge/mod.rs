//! Merge engine for resolved fragments
//!
//! Two stages, mirroring resolve/:
//! 1. Flatten - walk the route graph and concatenate bodies (`merge_routes`)
//! 2. Post-process - optionally re-read the flattened text and either
//!    deep-merge it into one document (`effective_merge`) or expand every
//!    anchor and alias (`explode`)

mod effective;
mod explode;
mod routes;

pub use effective::{deep_merge, effective_merge};
pub use explode::{ensure_strict, explode, render_document};
pub use routes::{CycleCheck, DEFAULT_LIMITER, MergeOptions, merge_routes};
