//! Mock fetcher for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use yamll::error::{Error, Result};
use yamll::fetch::Fetcher;
use yamll::types::Dependency;

#[derive(Default)]
struct MockState {
    fragments: Mutex<HashMap<String, String>>,
    errors: Mutex<HashMap<String, String>>,
    fetch_calls: Mutex<Vec<String>>,
}

/// In-memory fetcher serving fragments by path
///
/// This manually implements `Fetcher` rather than using a mocking crate.
/// Clones share state, so a test can hand one clone to the pipeline and
/// inspect the calls through another.
///
/// Features:
/// - Fragments keyed by import path
/// - Call tracking for verification
/// - Error injection per path
#[derive(Clone, Default)]
pub struct MockFetcher {
    state: Arc<MockState>,
}

impl MockFetcher {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` for `path`
    #[must_use]
    pub fn with_fragment(self, path: &str, content: &str) -> Self {
        self.set_fragment(path, content);
        self
    }

    /// Serve `content` for `path`
    pub fn set_fragment(&self, path: &str, content: &str) {
        self.state
            .fragments
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
    }

    // === Error injection methods ===

    /// Make fetching `path` fail with `msg`
    pub fn fail_on(&self, path: &str, msg: &str) {
        self.state
            .errors
            .lock()
            .unwrap()
            .insert(path.to_string(), msg.to_string());
    }

    // === Call tracking methods ===

    /// Paths fetched, in order
    pub fn fetch_calls(&self) -> Vec<String> {
        self.state.fetch_calls.lock().unwrap().clone()
    }

    /// How often `path` was fetched
    pub fn fetch_count(&self, path: &str) -> usize {
        self.fetch_calls().iter().filter(|p| *p == path).count()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, dependency: &Dependency) -> Result<String> {
        self.state
            .fetch_calls
            .lock()
            .unwrap()
            .push(dependency.path.clone());

        if let Some(msg) = self.state.errors.lock().unwrap().get(&dependency.path) {
            return Err(Error::fetch(&dependency.path, msg));
        }

        self.state
            .fragments
            .lock()
            .unwrap()
            .get(&dependency.path)
            .cloned()
            .ok_or_else(|| Error::fetch(&dependency.path, "no such fragment"))
    }
}
