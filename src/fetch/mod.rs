//! Fragment sources: local files, HTTP(S) and git
//!
//! Every source turns a [`Dependency`] into raw fragment text. The resolver
//! only sees the [`Fetcher`] trait, so tests can substitute their own.

mod file;
mod git;
mod http;

pub use file::FileSource;
pub use git::{GitLocation, GitSource};
pub use http::HttpSource;

use crate::error::Result;
use crate::types::{Dependency, DependencyKind};
use async_trait::async_trait;
use std::path::PathBuf;

/// Fetch the raw text of a dependency
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Read the dependency's content. Failures are terminal, there is no retry.
    async fn fetch(&self, dependency: &Dependency) -> Result<String>;
}

/// Fetcher dispatching on [`DependencyKind`]
#[derive(Debug, Clone, Default)]
pub struct SourceFetcher {
    file: FileSource,
    http: HttpSource,
    git: GitSource,
}

impl SourceFetcher {
    /// Create a fetcher resolving relative file paths against the current directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative file paths against `dir` instead of the current directory
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.file = FileSource::with_base_dir(dir);
        self
    }
}

#[async_trait]
impl Fetcher for SourceFetcher {
    async fn fetch(&self, dependency: &Dependency) -> Result<String> {
        match dependency.kind {
            DependencyKind::File => self.file.fetch(dependency).await,
            DependencyKind::Url => self.http.fetch(dependency).await,
            DependencyKind::Git => self.git.fetch(dependency).await,
        }
    }
}
