//! YAML machinery shared by the post-processing passes
//!
//! Merged output is a multi-document stream in which any document may alias an
//! anchor defined by another. This module splits the stream into documents,
//! builds the shared [`AnchorScope`], and loads each document against it with
//! merge keys (`<<`) applied.

mod loader;
mod scope;

pub use scope::AnchorScope;

use crate::error::{Error, Result};
use yaml_rust2::{Yaml, YamlEmitter};

/// One document of a multi-document stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// 1-based position among the kept documents
    pub index: usize,
    /// Leading comment line, usually `# Source: <path>`
    pub header: Option<String>,
    /// Document text without the separator line
    pub text: String,
}

impl Document {
    /// Build a document from raw text, taking its first line as header when it is a comment
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let header = text
            .lines()
            .find(|line| !line.trim().is_empty())
            .filter(|line| line.trim_start().starts_with('#'))
            .map(|line| line.trim().to_string());
        Self {
            index,
            header,
            text,
        }
    }

    /// Whether the document holds anything besides comments and whitespace
    pub fn has_content(&self) -> bool {
        has_content(&self.text)
    }

    /// Name used in error messages: the source path when known, else the index
    pub fn label(&self) -> String {
        match &self.header {
            Some(header) => {
                let comment = header.trim_start_matches('#').trim();
                let source = comment.strip_prefix("Source:").map_or(comment, str::trim);
                format!("'{source}'")
            }
            None => format!("#{}", self.index),
        }
    }
}

/// If `line` starts a new document (`---` at column 0), the content that
/// follows the marker on the same line. Comments count as no content.
pub fn document_start(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("---")?;
    if rest.is_empty() {
        return Some("");
    }
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim();
    Some(if rest.starts_with('#') { "" } else { rest })
}

/// Whether a segment holds anything besides comments and whitespace
fn has_content(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#')
    })
}

/// Split a stream on separator lines, dropping empty and comment-only segments.
///
/// Content after a separator on the same line opens the next document. The
/// header of a comment-only segment moves to the following document when that
/// one has none.
pub fn split_documents(text: &str) -> Vec<Document> {
    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        match document_start(line) {
            Some(rest) => {
                segments.push(current.join("\n"));
                current.clear();
                if !rest.is_empty() {
                    current.push(rest);
                }
            }
            None => current.push(line),
        }
    }
    segments.push(current.join("\n"));

    let mut documents = Vec::new();
    let mut pending_header = None;
    for segment in segments {
        if !has_content(&segment) {
            if let Some(header) = Document::new(0, segment.as_str()).header {
                pending_header = Some(header);
            }
            continue;
        }
        let document = Document::new(documents.len() + 1, segment);
        let document = match (document.header.is_none(), pending_header.take()) {
            (true, Some(header)) => {
                Document::new(document.index, format!("{header}\n{}", document.text))
            }
            _ => document,
        };
        documents.push(document);
    }
    documents
}

/// Load one document against `scope`.
///
/// With `strict` set, duplicate mapping keys are rejected; otherwise the last
/// occurrence wins.
pub fn load_document(document: &Document, scope: &AnchorScope, strict: bool) -> Result<Yaml> {
    loader::load(&document.text, scope, strict)
        .map(|loaded| loaded.value)
        .map_err(|err| err.for_document(document))
}

/// Split `text` and load every document against the anchor scope of the whole stream
pub fn load_stream(text: &str, strict: bool) -> Result<Vec<(Document, Yaml)>> {
    let documents = split_documents(text);
    let scope = AnchorScope::from_documents(&documents)?;

    documents
        .into_iter()
        .map(|document| {
            let value = load_document(&document, &scope, strict)?;
            Ok((document, value))
        })
        .collect()
}

/// Serialise a value with two-space indentation and literal block multiline strings.
///
/// The leading document marker written by the emitter is removed.
pub fn emit(value: &Yaml) -> Result<String> {
    let mut out = String::new();
    {
        let mut emitter = YamlEmitter::new(&mut out);
        emitter.multiline_strings(true);
        emitter
            .dump(value)
            .map_err(|e| Error::Emit(e.to_string()))?;
    }

    Ok(out.strip_prefix("---\n").unwrap_or(&out).to_string())
}
