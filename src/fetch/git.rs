//! Git source: shallow fetch of one ref, then read one file from it
//!
//! The fetch goes through the `git` CLI so that SSH agents, credential
//! helpers and proxies configured on the machine keep working. The blob is
//! read from the fetched ref with gix.

use super::Fetcher;
use crate::error::{Error, Result};
use crate::types::{Dependency, GIT_PREFIX};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Local ref the requested revision is fetched into
const FETCH_REF: &str = "refs/yamll/import";

/// Name of the private key copy inside the work directory
const SSH_KEY_FILE: &str = "id_ssh";

/// A `git+` import decomposed into repository, revision and file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitLocation {
    /// Repository URL handed to `git fetch`
    pub repo_url: String,
    /// Branch, tag or commit to read from
    pub reference: String,
    /// Path of the file inside the repository
    pub inner_path: String,
    /// Whether the repository is reached over SSH
    pub is_ssh: bool,
}

impl GitLocation {
    /// Parse `git+<repo>@<ref>?path=<file>` or
    /// `git+ssh://<user>@<host>:<org>/<repo>@<ref>?path=<file>`.
    ///
    /// SSH repositories are always reached as the `git` user.
    pub fn parse(path: &str) -> Result<Self> {
        let invalid = |message: &str| Error::GitImport {
            path: path.to_string(),
            message: message.to_string(),
        };

        let raw = path.strip_prefix(GIT_PREFIX).unwrap_or(path);
        let (address, query) = raw
            .split_once('?')
            .ok_or_else(|| invalid("missing '?path=<file>'"))?;
        let inner_path = query
            .strip_prefix("path=")
            .filter(|inner| !inner.is_empty())
            .ok_or_else(|| invalid("missing file path after '?path='"))?;

        let (repo_url, reference, is_ssh) = if let Some(rest) = address.strip_prefix("ssh://") {
            let mut parts = rest.splitn(3, '@');
            let (Some(_user), Some(repo), Some(reference)) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(invalid("expected ssh://<user>@<host>:<repo>@<ref>"));
            };
            (format!("git@{repo}"), reference, true)
        } else {
            let (repo, reference) = address
                .split_once('@')
                .ok_or_else(|| invalid("missing '@<ref>'"))?;
            (repo.to_string(), reference, false)
        };

        if reference.is_empty() {
            return Err(invalid("ref after '@' is empty"));
        }

        Ok(Self {
            repo_url,
            reference: reference.to_string(),
            inner_path: inner_path.to_string(),
            is_ssh,
        })
    }
}

/// Reads fragments out of git repositories
///
/// Each fetch works in its own temporary directory, removed when the fetch
/// returns or fails.
#[derive(Debug, Clone, Default)]
pub struct GitSource {
    temp_root: Option<PathBuf>,
}

impl GitSource {
    /// Create temporary repositories under `dir` instead of the system temp dir
    pub fn with_temp_root(dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_root: Some(dir.into()),
        }
    }

    fn workdir(&self) -> Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("yamll_git");
        Ok(match &self.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        })
    }
}

/// `-c` options and environment for an authenticated fetch
fn fetch_settings(
    dependency: &Dependency,
    location: &GitLocation,
    workdir: &Path,
) -> Result<(Vec<String>, Vec<(&'static str, String)>)> {
    let auth = &dependency.auth;
    let mut config = Vec::new();
    let mut envs = Vec::new();

    if let Some(ca) = auth.ca_content.as_deref().filter(|ca| !ca.is_empty()) {
        let ca_path = workdir.join("ca.pem");
        std::fs::write(&ca_path, ca)?;
        config.push(format!("http.sslCAInfo={}", ca_path.display()));
    }

    if location.is_ssh {
        debug!("the git import is of type ssh, so setting ssh based auth");
        let key = auth
            .ssh_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::fetch(&dependency.path, "ssh imports need an 'ssh_key'"))?;
        let staged = stage_ssh_key(&dependency.path, key, workdir)?;
        let identity = shlex::try_quote(&staged.to_string_lossy())
            .map_err(|e| Error::fetch(&dependency.path, e))?
            .into_owned();
        envs.push((
            "GIT_SSH_COMMAND",
            format!("ssh -i {identity} -o IdentitiesOnly=yes"),
        ));
    } else {
        let user = auth.username.as_deref().unwrap_or_default();
        let password = auth
            .bearer_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .or(auth.password.as_deref())
            .unwrap_or_default();
        if !user.is_empty() || !password.is_empty() {
            debug!("the git import is of type https, so setting http based auth");
            let credentials = STANDARD.encode(format!("{user}:{password}"));
            config.push(format!("http.extraHeader=Authorization: Basic {credentials}"));
        }
    }

    Ok((config, envs))
}

/// Copy the private key at `key` into `workdir`, readable by the owner only.
///
/// The copy's path is the only one handed to ssh, through a shell.
fn stage_ssh_key(dependency: &str, key: &str, workdir: &Path) -> Result<PathBuf> {
    let contents = std::fs::read(key)
        .map_err(|e| Error::fetch(dependency, format!("reading ssh key '{key}' errored: {e}")))?;

    let pem = String::from_utf8_lossy(&contents);
    if !(pem.contains("-----BEGIN") && pem.contains("PRIVATE KEY-----")) {
        return Err(Error::fetch(
            dependency,
            format!("ssh key '{key}' is not a PEM encoded private key"),
        ));
    }

    let staged = workdir.join(SSH_KEY_FILE);
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(&staged)?.write_all(&contents)?;

    Ok(staged)
}

/// Run one git subcommand, keeping `-c` values out of error messages
async fn run_git(
    dependency: &str,
    dir: &Path,
    config: &[String],
    args: &[&str],
    envs: &[(&'static str, String)],
) -> Result<()> {
    let mut command = Command::new("git");
    for setting in config {
        command.arg("-c").arg(setting);
    }
    let output = command
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .envs(envs.iter().map(|(key, value)| (*key, value.as_str())))
        .output()
        .await
        .map_err(|e| Error::fetch(dependency, e))?;

    if output.status.success() {
        return Ok(());
    }

    Err(Error::fetch(
        dependency,
        format!(
            "`git {}` failed: {}",
            args.first().copied().unwrap_or_default(),
            String::from_utf8_lossy(&output.stderr).trim()
        ),
    ))
}

/// Read `<FETCH_REF>:<inner path>` from the repository at `repo_dir`
fn read_blob(dependency: &str, repo_dir: &Path, location: &GitLocation) -> Result<String> {
    let repo = gix::open_opts(repo_dir, gix::open::Options::isolated())
        .map_err(|e| Error::fetch(dependency, e))?;

    let spec = format!("{FETCH_REF}:{}", location.inner_path);
    let id = repo.rev_parse_single(spec.as_str()).map_err(|e| {
        Error::fetch(
            dependency,
            format!("'{}' not found at '{}': {e}", location.inner_path, location.reference),
        )
    })?;

    let mut blob = repo
        .find_blob(id.detach())
        .map_err(|e| Error::fetch(dependency, e))?;

    String::from_utf8(blob.take_data()).map_err(|e| Error::fetch(dependency, e))
}

#[async_trait]
impl Fetcher for GitSource {
    async fn fetch(&self, dependency: &Dependency) -> Result<String> {
        let location = GitLocation::parse(&dependency.path)?;
        let workdir = self.workdir()?;
        let repo_dir = workdir.path().join("repo");

        debug!(
            repo = %location.repo_url,
            reference = %location.reference,
            dir = %workdir.path().display(),
            "fetching git repository"
        );

        let (config, envs) = fetch_settings(dependency, &location, workdir.path())?;
        let repo_arg = repo_dir.to_string_lossy().into_owned();
        run_git(
            &dependency.path,
            workdir.path(),
            &[],
            &["init", "--quiet", repo_arg.as_str()],
            &[],
        )
        .await?;

        let refspec = format!("{}:{FETCH_REF}", location.reference);
        run_git(
            &dependency.path,
            &repo_dir,
            &config,
            &[
                "fetch",
                "--quiet",
                "--depth",
                "1",
                location.repo_url.as_str(),
                refspec.as_str(),
            ],
            &envs,
        )
        .await?;

        read_blob(&dependency.path, &repo_dir, &location)
    }
}
