//! Import directive parsing
//!
//! A directive is a line of fragment text containing [`DIRECTIVE_MARKER`]
//! followed by an import path and an optional `;`-separated JSON object of
//! credentials:
//!
//! ```text
//! ##++fixtures/base.yaml
//! ##++https://example.com/db.yaml;{"user_name":"${USER}","password":"${PASS}"}
//! ```
//!
//! `${NAME}` placeholders in the JSON are replaced from the environment before
//! decoding. Unset variables become empty strings; `${NAME:-default}` falls
//! back to `default` when the variable is unset or empty.

use crate::error::{Error, Result};
use crate::types::{AuthParams, Dependency};
use crate::yaml;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

/// Marker that turns a line into an import directive
pub const DIRECTIVE_MARKER: &str = "##++";

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("placeholder regex is valid")
});

/// A line opening a block scalar: `key: |`, `- >-`, `key: &anchor |2`
static BLOCK_SCALAR_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^\s*|:\s+|(?:^|\s)-\s+)(?:[&!]\S*\s+)*[|>][0-9+-]*\s*(?:#.*)?$")
        .expect("block scalar regex is valid")
});

/// A fragment split into its imports and its directive-free body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFragment {
    /// Fragment text without directive lines and blank lines
    pub body: String,
    /// Imports in order of appearance
    pub dependencies: Vec<Dependency>,
}

/// Parse one line, returning a dependency if it is a directive.
///
/// Placeholders are looked up in the process environment.
pub fn parse_directive(line: &str) -> Result<Option<Dependency>> {
    parse_directive_with(line, |name| std::env::var(name).ok())
}

/// Parse one line with a custom variable lookup.
pub fn parse_directive_with<F>(line: &str, lookup: F) -> Result<Option<Dependency>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some((_, rest)) = line.split_once(DIRECTIVE_MARKER) else {
        return Ok(None);
    };

    let (path, auth) = match rest.split_once(';') {
        Some((path, auth)) => (path.trim(), Some(auth.trim())),
        None => (rest.trim(), None),
    };

    if path.is_empty() {
        return Err(Error::Directive {
            directive: line.trim().to_string(),
            message: "import path is empty".to_string(),
        });
    }

    let mut dependency = Dependency::new(path);

    if let Some(raw) = auth.filter(|raw| !raw.is_empty()) {
        debug!(path, "auth is set for the import");
        let expanded = substitute_env(raw, &lookup);
        let auth: AuthParams =
            serde_json::from_str(&expanded).map_err(|e| Error::Directive {
                directive: line.trim().to_string(),
                message: e.to_string(),
            })?;
        dependency = dependency.with_auth(auth);
    }

    Ok(Some(dependency))
}

/// Split a fragment into imports and body, reading the process environment.
pub fn parse_fragment(content: &str) -> Result<ParsedFragment> {
    parse_fragment_with(content, |name| std::env::var(name).ok())
}

/// Split a fragment into imports and body with a custom variable lookup.
///
/// When the fragment has directives, blank lines are dropped from the body so
/// it carries no gaps where directives used to be. Blank lines inside block
/// scalars are content and stay. A leading `---` is removed; the merge engine
/// writes its own separator.
pub fn parse_fragment_with<F>(content: &str, lookup: F) -> Result<ParsedFragment>
where
    F: Fn(&str) -> Option<String>,
{
    let mut dependencies = Vec::new();
    let mut kept = Vec::new();

    for line in content.lines() {
        match parse_directive_with(line, &lookup)? {
            Some(dependency) => dependencies.push(dependency),
            None => kept.push(line),
        }
    }

    if !dependencies.is_empty() {
        kept = collapse_blank_lines(kept);
    }
    strip_document_start(&mut kept);

    Ok(ParsedFragment {
        body: kept.join("\n").trim_end().to_string(),
        dependencies,
    })
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Drop blank lines outside block scalars
fn collapse_blank_lines(lines: Vec<&str>) -> Vec<&str> {
    let mut kept = Vec::with_capacity(lines.len());
    let mut pending_blank = Vec::new();
    // indentation of the line that opened the current block scalar
    let mut scalar_parent: Option<usize> = None;

    for line in lines {
        if line.trim().is_empty() {
            if scalar_parent.is_some() {
                pending_blank.push(line);
            }
            continue;
        }

        let indent = indentation(line);
        match scalar_parent {
            Some(parent) if indent > parent => kept.append(&mut pending_blank),
            _ => {
                pending_blank.clear();
                scalar_parent = None;
            }
        }
        if scalar_parent.is_none() && BLOCK_SCALAR_HEADER.is_match(line) {
            scalar_parent = Some(indent);
        }
        kept.push(line);
    }

    kept
}

/// Remove a document start marker opening the fragment, keeping content
/// written after it on the same line
fn strip_document_start(lines: &mut Vec<&str>) {
    let Some(position) = lines.iter().position(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#')
    }) else {
        return;
    };

    match yaml::document_start(lines[position]) {
        Some("") => {
            lines.remove(position);
        }
        Some(rest) => lines[position] = rest,
        None => {}
    }
}

/// Replace `${NAME}` and `${NAME:-default}` placeholders.
pub fn substitute_env<F>(text: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            let value = lookup(&caps[1]).unwrap_or_default();
            match caps.get(2) {
                Some(default) if value.is_empty() => default.as_str().to_string(),
                _ => value,
            }
        })
        .into_owned()
}
