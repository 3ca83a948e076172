//! Structured tree model
//!
//! An in-memory, serializable representation of an XML node with ordered
//! children and tail text, plus the [`DocumentEnvelope`] that carries the
//! document preamble needed for byte-exact reproduction.

pub mod namespace;
pub mod record;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub use namespace::{ExpandedName, NamespaceMap};
pub use record::StructuredRecord;

/// Ordered string → string map with unique keys.
///
/// Used for attributes and namespace declarations, where insertion order is
/// significant and must survive serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringMap {
    entries: Vec<(String, String)>,
}

impl StringMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StringMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = StringMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl Serialize for StringMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StringMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StringMapVisitor;

        impl<'de> Visitor<'de> for StringMapVisitor {
            type Value = StringMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of strings to strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<StringMap, A::Error> {
                let mut map = StringMap::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(StringMapVisitor)
    }
}

pub type Attributes = StringMap;

/// An XML node: an element or a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Comment(Comment),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Bare local name or `prefix:local`.
    pub tag: String,
    pub attributes: Attributes,
    /// Leading text. `Some("")` and `None` are different documents.
    pub text: Option<String>,
    pub children: Vec<Node>,
    /// Text between this element's end and the next sibling or the parent's end.
    pub tail: Option<String>,
}

/// A comment carries only its payload and an optional tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub tail: Option<String>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Attributes::new(),
            text: None,
            children: Vec::new(),
            tail: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn push(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    /// Child elements, skipping comments.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First child element with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.elements().find(|e| e.tag == tag)
    }

    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.tag == tag)
    }

    /// Follow a `/`-separated chain of child tags, taking the first match at each step.
    pub fn find_path(&self, path: &str) -> Option<&Element> {
        path.split('/')
            .try_fold(self, |element, step| element.find(step))
    }

    /// First element with the given tag in document order, this element included.
    pub fn find_descendant(&self, tag: &str) -> Option<&Element> {
        if self.tag == tag {
            return Some(self);
        }
        self.elements().find_map(|child| child.find_descendant(tag))
    }

    /// Leading text, or the empty string.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tail: None,
        }
    }
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Comment(_) => None,
        }
    }

    pub fn tail(&self) -> Option<&str> {
        match self {
            Node::Element(element) => element.tail.as_deref(),
            Node::Comment(comment) => comment.tail.as_deref(),
        }
    }

    pub fn tail_mut(&mut self) -> &mut Option<String> {
        match self {
            Node::Element(element) => &mut element.tail,
            Node::Comment(comment) => &mut comment.tail,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<Comment> for Node {
    fn from(comment: Comment) -> Self {
        Node::Comment(comment)
    }
}

/// A root node together with everything needed to write it back byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEnvelope {
    pub root: Node,
    /// Raw `<?xml ...?>` declaration (with any byte order mark), or empty.
    pub xml_declaration: String,
    /// Raw `<!DOCTYPE ...>` including any internal subset, or empty.
    pub doctype: String,
    /// Whitespace between the declaration and the next token.
    pub xml_decl_suffix: String,
    /// Raw text between the preamble and the root start tag: whitespace,
    /// comments and processing instructions as written.
    pub doctype_suffix: String,
    /// Raw text after the root end tag.
    pub trailer: String,
    /// Namespace override. `None` selects [`NamespaceMap::publisher`].
    pub namespaces: Option<NamespaceMap>,
    pub use_namespaces: bool,
    pub strip_namespaces: bool,
}

impl DocumentEnvelope {
    pub fn new(root: impl Into<Node>) -> Self {
        Self {
            root: root.into(),
            xml_declaration: String::new(),
            doctype: String::new(),
            xml_decl_suffix: String::new(),
            doctype_suffix: String::new(),
            trailer: String::new(),
            namespaces: None,
            use_namespaces: true,
            strip_namespaces: false,
        }
    }

    /// The namespace map names are expanded against.
    pub fn effective_namespaces(&self) -> NamespaceMap {
        self.namespaces.clone().unwrap_or_else(NamespaceMap::publisher)
    }
}
