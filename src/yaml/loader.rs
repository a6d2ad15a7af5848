//! Event-driven document builder with a shared anchor scope
//!
//! The YAML parser only knows anchors of the document it is reading and
//! rejects any other alias. Before parsing, every alias `*name` is rewritten to
//! a scalar tagged [`ALIAS_TAG_SUFFIX`]; the builder then resolves it against
//! the document's own anchors first and the shared scope second.

use super::scope::AnchorScope;
use super::Document;
use crate::error::Error;
use indexmap::IndexMap;
use std::collections::HashMap;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, Scanner, TScalarStyle, Token, TokenType};
use yaml_rust2::yaml::Hash;
use yaml_rust2::Yaml;

const ALIAS_TAG_HANDLE: &str = "!";
const ALIAS_TAG_SUFFIX: &str = "yamll-alias";
const CORE_SCHEMA_HANDLE: &str = "tag:yaml.org,2002:";
const MERGE_KEY: &str = "<<";

/// Failure while loading a single document
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Alias to an anchor nobody defines (yet)
    #[error("unknown anchor '{0}'")]
    UnknownAnchor(String),
    /// Mapping key repeated in strict mode
    #[error("duplicate key '{0}'")]
    DuplicateKey(String),
    /// `<<` whose value is not a mapping or a sequence of mappings
    #[error("merge key value must be a mapping or a sequence of mappings")]
    InvalidMerge,
    /// A second document where exactly one was expected
    #[error("found more than one YAML document where one was expected")]
    MultipleDocuments,
    /// Scanner or parser error
    #[error("{0}")]
    Syntax(String),
}

impl LoadError {
    pub(super) fn for_document(&self, document: &Document) -> Error {
        Error::Yaml {
            document: document.label(),
            message: self.to_string(),
        }
    }
}

/// A loaded document and the anchors it defines
pub struct Loaded {
    pub value: Yaml,
    pub anchors: HashMap<String, Yaml>,
}

/// Source text with aliases rewritten, plus anchor names in definition order
struct Prepared {
    text: String,
    anchor_names: Vec<String>,
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Rewrite aliases into tagged scalars.
///
/// Scan errors are left for the parser to report.
fn prepare(source: &str) -> Prepared {
    let mut aliases = Vec::new();
    let mut anchor_names = Vec::new();

    for Token(mark, token) in Scanner::new(source.chars()) {
        match token {
            TokenType::Alias(name) => aliases.push((mark.index(), name)),
            TokenType::Anchor(name) => anchor_names.push(name),
            _ => {}
        }
    }

    if aliases.is_empty() {
        return Prepared {
            text: source.to_string(),
            anchor_names,
        };
    }

    let mut text = String::with_capacity(source.len() + aliases.len() * ALIAS_TAG_SUFFIX.len());
    let mut pending = aliases.into_iter().peekable();
    let mut skip = 0;

    for (index, ch) in source.chars().enumerate() {
        if skip > 0 {
            skip -= 1;
            continue;
        }
        // the alias token starts at its '*'
        if let Some((_, name)) = pending.next_if(|(at, _)| *at == index) {
            text.push_str(ALIAS_TAG_HANDLE);
            text.push_str(ALIAS_TAG_SUFFIX);
            text.push(' ');
            text.push_str(&quote(&name));
            skip = name.chars().count();
            continue;
        }
        text.push(ch);
    }

    Prepared { text, anchor_names }
}

fn is_alias_tag(tag: Option<&Tag>) -> bool {
    tag.is_some_and(|tag| tag.handle == ALIAS_TAG_HANDLE && tag.suffix == ALIAS_TAG_SUFFIX)
}

/// Convert a scalar event the way the standard loader does
fn scalar_value(value: String, style: TScalarStyle, tag: Option<&Tag>) -> Yaml {
    if style != TScalarStyle::Plain {
        return Yaml::String(value);
    }

    match tag {
        Some(tag) if tag.handle == CORE_SCHEMA_HANDLE => match tag.suffix.as_str() {
            "bool" => value.parse::<bool>().map_or(Yaml::BadValue, Yaml::Boolean),
            "int" => value.parse::<i64>().map_or(Yaml::BadValue, Yaml::Integer),
            "float" => match value.parse::<f64>() {
                Ok(_) => Yaml::Real(value),
                Err(_) => Yaml::BadValue,
            },
            "null" => match value.as_str() {
                "~" | "null" => Yaml::Null,
                _ => Yaml::BadValue,
            },
            _ => Yaml::String(value),
        },
        Some(_) => Yaml::String(value),
        None => Yaml::from_str(&value),
    }
}

fn describe(key: &Yaml) -> String {
    match key {
        Yaml::String(s) | Yaml::Real(s) => s.clone(),
        Yaml::Integer(i) => i.to_string(),
        Yaml::Boolean(b) => b.to_string(),
        other => format!("{other:?}"),
    }
}

fn is_merge_key(key: &Yaml) -> bool {
    matches!(key, Yaml::String(s) if s == MERGE_KEY)
}

/// Build a mapping, splicing `<<` sources in at the merge key's position.
///
/// Explicit keys win over merged ones and earlier sources over later ones.
fn build_mapping(entries: Vec<(Yaml, Yaml)>, strict: bool) -> Result<Yaml, LoadError> {
    let explicit: Vec<&Yaml> = entries
        .iter()
        .map(|(key, _)| key)
        .filter(|key| !is_merge_key(key))
        .collect();

    let mut merged: Vec<(Yaml, Yaml)> = Vec::new();
    for (key, value) in &entries {
        if !is_merge_key(key) {
            continue;
        }
        let sources = match value {
            Yaml::Hash(hash) => vec![hash],
            Yaml::Array(items) => items
                .iter()
                .map(|item| match item {
                    Yaml::Hash(hash) => Ok(hash),
                    _ => Err(LoadError::InvalidMerge),
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => return Err(LoadError::InvalidMerge),
        };
        for hash in sources {
            for (k, v) in hash {
                if !explicit.contains(&k) && !merged.iter().any(|(seen, _)| seen == k) {
                    merged.push((k.clone(), v.clone()));
                }
            }
        }
    }

    let mut out: IndexMap<Yaml, Yaml> = IndexMap::with_capacity(entries.len() + merged.len());
    let mut merged = Some(merged);
    for (key, value) in entries {
        if is_merge_key(&key) {
            if let Some(merged) = merged.take() {
                out.extend(merged);
            }
            continue;
        }
        if out.insert(key.clone(), value).is_some() && strict {
            return Err(LoadError::DuplicateKey(describe(&key)));
        }
    }

    Ok(Yaml::Hash(out.into_iter().collect::<Hash>()))
}

enum Frame {
    Sequence {
        anchor: usize,
        items: Vec<Yaml>,
    },
    Mapping {
        anchor: usize,
        entries: Vec<(Yaml, Yaml)>,
        key: Option<Yaml>,
    },
}

struct Builder<'a> {
    scope: &'a AnchorScope,
    anchor_names: &'a [String],
    strict: bool,
    stack: Vec<Frame>,
    local: HashMap<String, Yaml>,
    root: Option<Yaml>,
    documents: usize,
    error: Option<LoadError>,
}

impl<'a> Builder<'a> {
    fn new(scope: &'a AnchorScope, anchor_names: &'a [String], strict: bool) -> Self {
        Self {
            scope,
            anchor_names,
            strict,
            stack: Vec::new(),
            local: HashMap::new(),
            root: None,
            documents: 0,
            error: None,
        }
    }

    fn resolve(&self, name: &str) -> Result<Yaml, LoadError> {
        self.local
            .get(name)
            .or_else(|| self.scope.get(name))
            .cloned()
            .ok_or_else(|| LoadError::UnknownAnchor(name.to_string()))
    }

    fn complete(&mut self, value: Yaml, anchor: usize) {
        if let Some(name) = anchor.checked_sub(1).and_then(|i| self.anchor_names.get(i)) {
            self.local.insert(name.clone(), value.clone());
        }

        match self.stack.last_mut() {
            None => self.root = Some(value),
            Some(Frame::Sequence { items, .. }) => items.push(value),
            Some(Frame::Mapping { entries, key, .. }) => match key.take() {
                Some(k) => entries.push((k, value)),
                None => *key = Some(value),
            },
        }
    }

    fn handle(&mut self, event: Event) -> Result<(), LoadError> {
        match event {
            Event::DocumentStart { .. } => {
                self.documents += 1;
                if self.documents > 1 {
                    return Err(LoadError::MultipleDocuments);
                }
            }
            Event::Scalar(value, _, _, tag) if is_alias_tag(tag.as_ref()) => {
                let resolved = self.resolve(&value)?;
                self.complete(resolved, 0);
            }
            Event::Scalar(value, style, anchor, tag) => {
                let value = scalar_value(value, style, tag.as_ref());
                self.complete(value, anchor);
            }
            Event::Alias(id) => {
                let name = id
                    .checked_sub(1)
                    .and_then(|i| self.anchor_names.get(i))
                    .cloned()
                    .unwrap_or_default();
                let resolved = self.resolve(&name)?;
                self.complete(resolved, 0);
            }
            Event::SequenceStart(anchor, _) => self.stack.push(Frame::Sequence {
                anchor,
                items: Vec::new(),
            }),
            Event::MappingStart(anchor, _) => self.stack.push(Frame::Mapping {
                anchor,
                entries: Vec::new(),
                key: None,
            }),
            Event::SequenceEnd | Event::MappingEnd => match self.stack.pop() {
                Some(Frame::Sequence { anchor, items }) => self.complete(Yaml::Array(items), anchor),
                Some(Frame::Mapping {
                    anchor, entries, ..
                }) => {
                    let mapping = build_mapping(entries, self.strict)?;
                    self.complete(mapping, anchor);
                }
                None => return Err(LoadError::Syntax("unbalanced collection end".to_string())),
            },
            _ => {}
        }
        Ok(())
    }
}

impl MarkedEventReceiver for Builder<'_> {
    fn on_event(&mut self, event: Event, _mark: Marker) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.handle(event) {
            self.error = Some(err);
        }
    }
}

/// Load the single document of `source`, resolving aliases against `scope`
pub fn load(source: &str, scope: &AnchorScope, strict: bool) -> Result<Loaded, LoadError> {
    let prepared = prepare(source);
    let mut builder = Builder::new(scope, &prepared.anchor_names, strict);

    let mut parser = Parser::new_from_str(&prepared.text);
    parser
        .load(&mut builder, true)
        .map_err(|e| LoadError::Syntax(e.to_string()))?;

    if let Some(err) = builder.error {
        return Err(err);
    }

    Ok(Loaded {
        value: builder.root.unwrap_or(Yaml::Null),
        anchors: builder.local,
    })
}
