//! XML text → structured form
//!
//! The body may use prefixes that were declared in a larger file it was cut
//! from. Such prefixes are bound to temporary `urn:tmp:<prefix>` namespaces at
//! the root so the document can be read namespace-aware; the envelope records
//! those bindings and asks for them to be stripped again on output.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use std::collections::HashMap;

use super::decompose::{decompose, internal_entities};
use crate::error::{Error, Result};
use crate::tree::namespace::{
    self, DEFAULT_KEY, ExpandedName, InverseNamespaceMap, PrefixLookup, declared_prefix,
    is_namespace_declaration,
};
use crate::tree::{Comment, DocumentEnvelope, Element, NamespaceMap, Node};

const TEMP_NAMESPACE_SCHEME: &str = "urn:tmp:";

/// Parse raw XML text into a [`DocumentEnvelope`].
pub fn parse_to_structured(text: &str) -> Result<DocumentEnvelope> {
    let prolog = decompose(text);
    let body_offset = text.len() - prolog.body.len();

    let mut builder = TreeBuilder::new(body_offset, internal_entities(prolog.doctype));
    let mut reader = Reader::from_str(prolog.body);
    reader.trim_text(false);
    reader.check_end_names(true);

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| builder.malformed(position, e.to_string()))?;
        let outside_root = builder.outside_root();

        match event {
            Event::Start(start) => builder.open(&start, position)?,
            Event::Empty(start) => {
                builder.open(&start, position)?;
                builder.close(position, false)?;
            }
            Event::End(_) => builder.close(position, true)?,
            Event::Decl(_) | Event::DocType(_) => {
                return Err(builder.malformed(
                    position,
                    "declaration or doctype after the document preamble".to_string(),
                ));
            }
            Event::Eof => break,
            // Whitespace, comments and processing instructions around the root
            // are kept as written.
            _ if outside_root => {
                let raw = prolog
                    .body
                    .get(position..reader.buffer_position())
                    .unwrap_or_default();
                builder.outside(raw);
            }
            Event::Text(text) => {
                let text = text
                    .unescape_with(|name| builder.resolve_entity(name))
                    .map_err(|e| builder.malformed(position, e.to_string()))?;
                builder.text(&text);
            }
            Event::CData(cdata) => {
                let text = String::from_utf8(cdata.into_inner().into_owned())
                    .map_err(|e| builder.malformed(position, e.to_string()))?;
                builder.text(&text);
            }
            Event::Comment(comment) => {
                let text = String::from_utf8(comment.into_inner().into_owned())
                    .map_err(|e| builder.malformed(position, e.to_string()))?;
                builder.comment(text);
            }
            Event::PI(_) => {
                return Err(Error::UnsupportedNodeType(
                    "processing-instruction".to_string(),
                ));
            }
        }
    }

    let Parsed {
        root,
        leading,
        trailer,
        namespaces,
        strip_namespaces,
    } = builder.finish()?;
    log::debug!(
        "parsed structured document: {} namespace bindings, strip_namespaces={strip_namespaces}",
        namespaces.len()
    );

    Ok(DocumentEnvelope {
        root,
        xml_declaration: prolog.xml_declaration.to_string(),
        doctype: prolog.doctype.to_string(),
        xml_decl_suffix: prolog.xml_decl_suffix.to_string(),
        doctype_suffix: format!("{}{leading}", prolog.doctype_suffix),
        trailer,
        namespaces: Some(namespaces),
        use_namespaces: true,
        strip_namespaces,
    })
}

/// Stack of in-scope namespace declarations, innermost last.
#[derive(Debug, Default)]
struct Scopes {
    frames: Vec<Vec<(String, String)>>,
}

impl PrefixLookup for Scopes {
    fn namespace_for(&self, prefix: &str) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }
}

/// What the reader hands back once the whole body has been consumed.
struct Parsed {
    root: Node,
    /// Raw text between the preamble and the root start tag.
    leading: String,
    trailer: String,
    namespaces: NamespaceMap,
    strip_namespaces: bool,
}

struct TreeBuilder {
    body_offset: usize,
    entities: HashMap<String, String>,
    open: Vec<Element>,
    scopes: Scopes,
    inverse: InverseNamespaceMap,
    root: Option<Node>,
    leading: String,
    trailer: String,
    declared: NamespaceMap,
    synthesized: Vec<String>,
}

impl TreeBuilder {
    fn new(body_offset: usize, entities: HashMap<String, String>) -> Self {
        Self {
            body_offset,
            entities,
            open: Vec::new(),
            scopes: Scopes::default(),
            inverse: InverseNamespaceMap::new(),
            root: None,
            leading: String::new(),
            trailer: String::new(),
            declared: NamespaceMap::new(),
            synthesized: Vec::new(),
        }
    }

    fn malformed(&self, position: usize, message: String) -> Error {
        Error::MalformedXml {
            position: self.body_offset + position,
            message,
        }
    }

    fn open(&mut self, start: &BytesStart<'_>, position: usize) -> Result<()> {
        let is_root = self.open.is_empty();
        if is_root && self.root.is_some() {
            return Err(self.malformed(position, "content after the root element".to_string()));
        }

        let raw_tag = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| self.malformed(position, e.to_string()))?
            .to_string();

        let mut attributes = Vec::new();
        let mut frame = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.malformed(position, e.to_string()))?;
            let name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| self.malformed(position, e.to_string()))?
                .to_string();
            let value = attr
                .unescape_value_with(|name| self.resolve_entity(name))
                .map_err(|e| self.malformed(position, e.to_string()))?
                .into_owned();

            if let Some(prefix) = declared_prefix(&name) {
                let inverse_prefix = if prefix == DEFAULT_KEY { "" } else { prefix };
                self.inverse.register(&value, inverse_prefix);
                frame.push((prefix.to_string(), value.clone()));
                if is_root {
                    self.declared.insert(prefix, value.clone());
                }
            }
            attributes.push((name, value));
        }
        self.scopes.frames.push(frame);

        let mut element = Element::new(self.resolve(&raw_tag)?);
        for (name, value) in attributes {
            let name = if is_namespace_declaration(&name) {
                name
            } else {
                self.resolve(&name)?
            };
            element.attributes.insert(name, value);
        }

        self.open.push(element);
        Ok(())
    }

    fn close(&mut self, position: usize, had_end_tag: bool) -> Result<()> {
        let mut element = self
            .open
            .pop()
            .ok_or_else(|| self.malformed(position, "unbalanced end tag".to_string()))?;
        self.scopes.frames.pop();

        // `<a></a>` keeps an empty text so it is not written back as `<a/>`.
        if had_end_tag && element.text.is_none() && element.children.is_empty() {
            element.text = Some(String::new());
        }

        self.attach(Node::Element(element));
        Ok(())
    }

    fn outside_root(&self) -> bool {
        self.open.is_empty()
    }

    /// Internal-subset entities first, then the five predefined ones.
    fn resolve_entity(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.entities.get(name) {
            return Some(value.as_str());
        }
        match name {
            "lt" => Some("<"),
            "gt" => Some(">"),
            "amp" => Some("&"),
            "apos" => Some("'"),
            "quot" => Some("\""),
            _ => None,
        }
    }

    fn outside(&mut self, raw: &str) {
        if self.root.is_some() {
            self.trailer.push_str(raw);
        } else {
            self.leading.push_str(raw);
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(parent) = self.open.last_mut() {
            let slot = match parent.children.last_mut() {
                Some(last) => last.tail_mut(),
                None => &mut parent.text,
            };
            slot.get_or_insert_with(String::new).push_str(text);
        }
    }

    fn comment(&mut self, text: String) {
        self.attach(Node::Comment(Comment::new(text)));
    }

    fn attach(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root = Some(node),
        }
    }

    /// Resolve a raw qualified name and write it back through the inverse map,
    /// binding an undeclared prefix to a temporary namespace at the root.
    fn resolve(&mut self, name: &str) -> Result<String> {
        let expanded = match namespace::expand(name, &self.scopes) {
            Err(Error::UnknownPrefix(prefix)) => {
                self.synthesize(&prefix);
                namespace::expand(name, &self.scopes)?
            }
            other => other?,
        };
        Ok(self.contract(&expanded))
    }

    fn contract(&self, name: &ExpandedName) -> String {
        namespace::contract(name, &self.inverse)
    }

    fn synthesize(&mut self, prefix: &str) {
        let uri = format!("{TEMP_NAMESPACE_SCHEME}{prefix}");
        log::debug!("binding undeclared prefix '{prefix}' to {uri}");
        self.inverse.register(&uri, prefix);
        if let Some(root_frame) = self.scopes.frames.first_mut() {
            root_frame.push((prefix.to_string(), uri));
        }
        self.synthesized.push(prefix.to_string());
    }

    fn finish(self) -> Result<Parsed> {
        if !self.open.is_empty() {
            return Err(Error::MalformedXml {
                position: self.body_offset,
                message: format!("{} unclosed element(s)", self.open.len()),
            });
        }
        let root = self.root.ok_or_else(|| Error::MalformedXml {
            position: self.body_offset,
            message: "no root element".to_string(),
        })?;

        // Temporary bindings must never reach the output; a root that declares
        // everything it uses keeps its declarations.
        let strip_namespaces = self.declared.is_empty() || !self.synthesized.is_empty();
        let mut namespaces = self.declared;
        for prefix in &self.synthesized {
            namespaces.insert(prefix.as_str(), format!("{TEMP_NAMESPACE_SCHEME}{prefix}"));
        }

        Ok(Parsed {
            root,
            leading: self.leading,
            trailer: self.trailer,
            namespaces,
            strip_namespaces,
        })
    }
}
