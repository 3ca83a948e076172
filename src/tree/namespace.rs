//! Namespace tag codec
//!
//! Expands `prefix:local` names into namespace-qualified [`ExpandedName`]s and
//! contracts them back again. Both directions are pure functions; the
//! transcoder contracts while reading XML and the builder expands while
//! writing it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::StringMap;
use crate::error::{Error, Result};

/// The fixed namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
/// The fixed namespace bound to the reserved `xmlns` prefix.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";
/// Key under which a [`NamespaceMap`] stores the default (unprefixed) namespace.
pub const DEFAULT_KEY: &str = "default";

/// A name resolved against a namespace map: `{uri}local` in Clark notation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpandedName {
    pub namespace: Option<String>,
    pub local: String,
}

impl ExpandedName {
    pub fn unqualified(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    pub fn qualified(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local: local.into(),
        }
    }
}

impl fmt::Display for ExpandedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(uri) => write!(f, "{{{uri}}}{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Anything that can answer "which namespace does this prefix denote?".
pub trait PrefixLookup {
    fn namespace_for(&self, prefix: &str) -> Option<&str>;
}

/// Ordered prefix → namespace URI mapping.
///
/// The key [`DEFAULT_KEY`] holds the default namespace. Declaration order is
/// kept because it is the order the declarations are written in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceMap(StringMap);

impl NamespaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The publisher's journal-article namespace set.
    pub fn publisher() -> Self {
        let mut map = Self::new();
        map.insert(DEFAULT_KEY, "http://www.elsevier.com/xml/ja/dtd");
        map.insert("ce", "http://www.elsevier.com/xml/common/dtd");
        map.insert("sa", "http://www.elsevier.com/xml/common/struct-aff/dtd");
        map.insert("sb", "http://www.elsevier.com/xml/common/struct-bib/dtd");
        map.insert("xlink", "http://www.w3.org/1999/xlink");
        map
    }

    pub fn insert(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.0.insert(prefix, uri);
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.0.get(prefix)
    }

    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.0.get(prefix).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build the URI → prefix map used by [`contract`].
    pub fn inverse(&self) -> InverseNamespaceMap {
        let mut inverse = InverseNamespaceMap::new();
        for (prefix, uri) in self.iter() {
            let prefix = if prefix == DEFAULT_KEY { "" } else { prefix };
            inverse.register(uri, prefix);
        }
        inverse
    }

    /// The attribute name that declares `prefix` (`xmlns` or `xmlns:p`).
    pub fn declaration_name(prefix: &str) -> String {
        if prefix == DEFAULT_KEY {
            "xmlns".to_string()
        } else {
            format!("xmlns:{prefix}")
        }
    }
}

impl PrefixLookup for NamespaceMap {
    fn namespace_for(&self, prefix: &str) -> Option<&str> {
        self.get(prefix)
    }
}

/// URI → prefix mapping. The reserved `xml` and `xmlns` bindings are always present.
///
/// An empty prefix stands for the default namespace and contracts to a bare name.
#[derive(Debug, Clone)]
pub struct InverseNamespaceMap {
    by_uri: HashMap<String, String>,
}

impl InverseNamespaceMap {
    pub fn new() -> Self {
        let mut by_uri = HashMap::new();
        by_uri.insert(XML_NAMESPACE.to_string(), "xml".to_string());
        by_uri.insert(XMLNS_NAMESPACE.to_string(), "xmlns".to_string());
        Self { by_uri }
    }

    /// Register `uri` under `prefix` unless the URI already has a prefix.
    pub fn register(&mut self, uri: &str, prefix: &str) {
        self.by_uri
            .entry(uri.to_string())
            .or_insert_with(|| prefix.to_string());
    }

    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.by_uri.get(uri).map(String::as_str)
    }
}

impl Default for InverseNamespaceMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a qualified name against `lookup`.
///
/// Bare names come back unchanged (no default namespace is applied). The
/// reserved `xml` and `xmlns` prefixes resolve to their fixed URIs whatever
/// the map says.
pub fn expand(name: &str, lookup: &impl PrefixLookup) -> Result<ExpandedName> {
    let Some((prefix, local)) = name.split_once(':') else {
        return Ok(ExpandedName::unqualified(name));
    };

    let namespace = match prefix {
        "xml" => XML_NAMESPACE,
        "xmlns" => XMLNS_NAMESPACE,
        _ => lookup
            .namespace_for(prefix)
            .ok_or_else(|| Error::UnknownPrefix(prefix.to_string()))?,
    };

    Ok(ExpandedName::qualified(namespace, local))
}

/// Render an expanded name as `prefix:local`, or bare `local` when its
/// namespace has no registered prefix.
pub fn contract(name: &ExpandedName, inverse: &InverseNamespaceMap) -> String {
    match name
        .namespace
        .as_deref()
        .and_then(|uri| inverse.prefix_for(uri))
    {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{}", name.local),
        _ => name.local.clone(),
    }
}

/// True for `xmlns` and `xmlns:*` attribute names.
pub fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

/// The prefix declared by an `xmlns`/`xmlns:*` attribute, using [`DEFAULT_KEY`]
/// for the default namespace.
pub fn declared_prefix(name: &str) -> Option<&str> {
    if name == "xmlns" {
        Some(DEFAULT_KEY)
    } else {
        name.strip_prefix("xmlns:")
    }
}
