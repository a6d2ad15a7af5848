//! Shared test helpers

#![allow(dead_code)]

mod mock_fetcher;

pub use mock_fetcher::MockFetcher;

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;
use yamll::merge::MergeOptions;
use yamll::types::Dependency;
use yamll::{ImportOptions, PostProcess, Yamll};

/// Dependencies for plain paths
pub fn roots(paths: &[&str]) -> Vec<Dependency> {
    paths.iter().map(|p| Dependency::new(*p)).collect()
}

/// Pipeline over `fetcher` with default merge options
pub fn pipeline(fetcher: &MockFetcher, files: &[&str], post_process: PostProcess) -> Yamll {
    let options = ImportOptions {
        files: files.iter().map(ToString::to_string).collect(),
        merge: MergeOptions::default(),
        post_process,
    };
    Yamll::with_fetcher(options, Box::new(fetcher.clone()))
}

/// Temporary directory with the given files
pub fn fixture_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create fixture dir");
        }
        std::fs::write(path, content).expect("Failed to write fixture");
    }
    dir
}

/// Run git in `dir`, panicking on failure
pub fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(["-c", "user.name=yamll", "-c", "user.email=yamll@example.com"])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Git repository with one commit on `main` holding `files`
pub fn git_repo(files: &[(&str, &str)]) -> TempDir {
    let dir = fixture_dir(files);
    git(dir.path(), &["init", "--quiet", "-b", "main"]);
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "--quiet", "-m", "fixtures"]);
    dir
}
