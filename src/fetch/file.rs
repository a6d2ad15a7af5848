//! Local file and glob source

use super::Fetcher;
use crate::error::{Error, Result};
use crate::types::Dependency;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

const GLOB_CHARS: [char; 3] = ['*', '?', '['];

/// Reads fragments from the local filesystem
///
/// Paths containing glob characters read every match in sorted order,
/// joined by newlines.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    base_dir: Option<PathBuf>,
}

impl FileSource {
    /// Resolve relative paths against `dir`
    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    fn absolute(&self, path: &str) -> Result<PathBuf> {
        let path = Path::new(path);
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let base = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        Ok(base.join(path))
    }

    fn matches(&self, dependency: &Dependency, pattern: &Path) -> Result<Vec<PathBuf>> {
        let pattern = pattern.to_string_lossy();
        let mut paths = glob::glob(&pattern)
            .map_err(|e| Error::fetch(&dependency.path, e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::fetch(&dependency.path, e))?;

        if paths.is_empty() {
            return Err(Error::fetch(&dependency.path, "pattern matched no files"));
        }
        paths.sort();
        Ok(paths)
    }
}

#[async_trait]
impl Fetcher for FileSource {
    async fn fetch(&self, dependency: &Dependency) -> Result<String> {
        let path = self.absolute(&dependency.path)?;

        if !dependency.path.contains(GLOB_CHARS) {
            debug!(path = %path.display(), "reading YAML file");
            return tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::fetch(&dependency.path, e));
        }

        let paths = self.matches(dependency, &path)?;
        debug!(pattern = %dependency.path, files = paths.len(), "reading YAML files matching pattern");

        let mut contents = Vec::with_capacity(paths.len());
        for path in &paths {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| Error::fetch(path.display().to_string(), e))?;
            contents.push(content);
        }
        Ok(contents.join("\n"))
    }
}
