//! Core types for yamll

use serde::{Deserialize, Serialize};

/// Prefix marking an HTTP(S) import
const URL_PREFIXES: [&str; 2] = ["http://", "https://"];

/// Prefix marking a git import
pub const GIT_PREFIX: &str = "git+";

/// Where a fragment is fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyKind {
    /// Local file or glob pattern
    File,
    /// HTTP or HTTPS URL
    Url,
    /// File inside a git repository
    Git,
}

impl DependencyKind {
    /// Classify an import path by its prefix. Unknown prefixes are files.
    pub fn classify(path: &str) -> Self {
        if URL_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
            Self::Url
        } else if path.starts_with(GIT_PREFIX) {
            Self::Git
        } else {
            Self::File
        }
    }
}

impl std::fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Url => write!(f, "url"),
            Self::Git => write!(f, "git"),
        }
    }
}

/// Credentials attached to a remote import
///
/// Decoded from the JSON suffix of a directive. Every field is optional;
/// remote fetches without credentials are unauthenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthParams {
    /// Username for basic auth
    #[serde(rename = "user_name", default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password for basic auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Bearer token; for git it replaces the password
    #[serde(
        rename = "barer_token",
        alias = "bearer_token",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub bearer_token: Option<String>,
    /// PEM encoded CA bundle used to verify the remote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_content: Option<String>,
    /// Path to an SSH private key for `git+ssh` imports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<String>,
}

impl AuthParams {
    /// Whether no credential field is set
    pub const fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password.is_none()
            && self.bearer_token.is_none()
            && self.ca_content.is_none()
            && self.ssh_key.is_none()
    }
}

/// One import declared by a fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Import path exactly as written, also the route graph key
    pub path: String,
    /// Source kind derived from `path`
    pub kind: DependencyKind,
    /// Credentials for remote kinds
    #[serde(default, skip_serializing_if = "AuthParams::is_empty")]
    pub auth: AuthParams,
}

impl Dependency {
    /// Create a dependency without credentials
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let kind = DependencyKind::classify(&path);
        Self {
            path,
            kind,
            auth: AuthParams::default(),
        }
    }

    /// Attach credentials
    #[must_use]
    pub fn with_auth(mut self, auth: AuthParams) -> Self {
        self.auth = auth;
        self
    }
}
