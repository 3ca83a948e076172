//! Structured form → XML text

use once_cell::sync::Lazy;
use quick_xml::Writer;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use regex::Regex;
use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::tree::namespace::{
    self, InverseNamespaceMap, PrefixLookup, declared_prefix, is_namespace_declaration,
};
use crate::tree::{DocumentEnvelope, Element, NamespaceMap, Node};

static NAMESPACE_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\sxmlns(?::[\w.-]+)?="[^"]*""#).unwrap());

/// Serialization switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Indent nested elements by this many spaces. `None` writes the tree
    /// exactly as stored, which is what round-tripping requires.
    pub indent: Option<usize>,
}

impl RenderOptions {
    pub fn pretty() -> Self {
        Self { indent: Some(2) }
    }
}

/// Regenerate XML text from an envelope without pretty-printing.
pub fn render_from_structured(envelope: &DocumentEnvelope) -> Result<String> {
    render(envelope, RenderOptions::default())
}

pub fn render(envelope: &DocumentEnvelope, options: RenderOptions) -> Result<String> {
    let namespaces = envelope.effective_namespaces();
    let mut body = BodyWriter::new(&namespaces, envelope.use_namespaces, options);
    body.write_node(&envelope.root, true)?;
    let mut body = body.finish()?;

    if envelope.strip_namespaces {
        if let Node::Element(root) = &envelope.root {
            let tag = body_tag(root, &namespaces, envelope.use_namespaces)?;
            body = strip_root_declarations(&body, &tag);
        }
    }

    let mut out = String::with_capacity(
        envelope.xml_declaration.len() + envelope.doctype.len() + body.len() + 8,
    );
    // Empty segments contribute nothing.
    out.push_str(&envelope.xml_declaration);
    out.push_str(&envelope.xml_decl_suffix);
    out.push_str(&envelope.doctype);
    out.push_str(&envelope.doctype_suffix);
    out.push_str(&body);
    out.push_str(&envelope.trailer);
    Ok(out)
}

/// Remove `xmlns`/`xmlns:*` attributes from the first start tag named `tag`.
/// Descendant tags are left alone.
pub fn strip_root_declarations(xml: &str, tag: &str) -> String {
    let pattern = format!(r"<{}(?:\s[^>]*)?>", regex::escape(tag));
    let Ok(start_tag) = Regex::new(&pattern) else {
        return xml.to_string();
    };
    let Some(found) = start_tag.find(xml) else {
        return xml.to_string();
    };

    let stripped = NAMESPACE_DECLARATION.replace_all(found.as_str(), "");
    let mut out = String::with_capacity(xml.len());
    out.push_str(&xml[..found.start()]);
    out.push_str(&stripped);
    out.push_str(&xml[found.end()..]);
    out
}

fn body_tag(root: &Element, namespaces: &NamespaceMap, use_namespaces: bool) -> Result<String> {
    if !use_namespaces {
        return Ok(root.tag.clone());
    }
    let expanded = namespace::expand(&root.tag, namespaces)?;
    Ok(namespace::contract(&expanded, &namespaces.inverse()))
}

/// The envelope's map plus declarations made on the elements being written.
struct Scopes<'a> {
    namespaces: &'a NamespaceMap,
    frames: Vec<Vec<(String, String)>>,
}

impl PrefixLookup for Scopes<'_> {
    fn namespace_for(&self, prefix: &str) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
            .or_else(|| self.namespaces.get(prefix))
    }
}

struct BodyWriter<'a> {
    writer: Writer<Vec<u8>>,
    namespaces: &'a NamespaceMap,
    scopes: Scopes<'a>,
    inverse: InverseNamespaceMap,
    use_namespaces: bool,
}

impl<'a> BodyWriter<'a> {
    fn new(namespaces: &'a NamespaceMap, use_namespaces: bool, options: RenderOptions) -> Self {
        let writer = match options.indent {
            Some(width) => Writer::new_with_indent(Vec::new(), b' ', width),
            None => Writer::new(Vec::new()),
        };
        Self {
            writer,
            namespaces,
            scopes: Scopes {
                namespaces,
                frames: Vec::new(),
            },
            inverse: namespaces.inverse(),
            use_namespaces,
        }
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner())
            .map_err(|e| Error::InvalidStructuredData(e.to_string()))
    }

    /// Expand a qualified name (failing on unknown prefixes) and write it back
    /// with the prefix registered for its namespace. A namespace declared only
    /// on a descendant keeps the prefix it was written with.
    fn qualify(&self, name: &str) -> Result<String> {
        if !self.use_namespaces {
            return Ok(name.to_string());
        }
        let expanded = namespace::expand(name, &self.scopes)?;
        match expanded.namespace.as_deref() {
            Some(uri) if self.inverse.prefix_for(uri).is_none() => Ok(name.to_string()),
            _ => Ok(namespace::contract(&expanded, &self.inverse)),
        }
    }

    fn write_node(&mut self, node: &Node, is_root: bool) -> Result<()> {
        match node {
            Node::Comment(comment) => {
                self.writer
                    .write_event(Event::Comment(BytesText::from_escaped(comment.text.as_str())))?;
                self.write_tail(comment.tail.as_deref())
            }
            Node::Element(element) => self.write_element(element, is_root),
        }
    }

    fn write_element(&mut self, element: &Element, is_root: bool) -> Result<()> {
        let frame = element
            .attributes
            .iter()
            .filter_map(|(attr, uri)| {
                declared_prefix(attr).map(|prefix| (prefix.to_string(), uri.to_string()))
            })
            .collect();
        self.scopes.frames.push(frame);
        let written = self.write_scoped_element(element, is_root);
        self.scopes.frames.pop();
        written?;

        self.write_tail(element.tail.as_deref())
    }

    fn write_scoped_element(&mut self, element: &Element, is_root: bool) -> Result<()> {
        let name = self.qualify(&element.tag)?;
        let mut start = BytesStart::new(name.clone());

        if is_root && self.use_namespaces {
            for (prefix, uri) in self.namespaces.iter() {
                let declaration = NamespaceMap::declaration_name(prefix);
                if element.attribute(&declaration).is_none() {
                    push_attribute(&mut start, &declaration, uri);
                }
            }
        }

        for (attr_name, value) in element.attributes.iter() {
            let attr_name = if is_namespace_declaration(attr_name) {
                attr_name.to_string()
            } else {
                self.qualify(attr_name)?
            };
            push_attribute(&mut start, &attr_name, value);
        }

        if element.text.is_none() && element.children.is_empty() {
            self.writer.write_event(Event::Empty(start))?;
        } else {
            self.writer.write_event(Event::Start(start))?;
            if let Some(text) = &element.text {
                self.write_text(text)?;
            }
            for child in &element.children {
                self.write_node(child, false)?;
            }
            self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        if !text.is_empty() {
            self.writer
                .write_event(Event::Text(BytesText::from_escaped(escape_text(text))))?;
        }
        Ok(())
    }

    fn write_tail(&mut self, tail: Option<&str>) -> Result<()> {
        match tail {
            Some(tail) => self.write_text(tail),
            None => Ok(()),
        }
    }
}

fn push_attribute(start: &mut BytesStart<'_>, name: &str, value: &str) {
    let escaped = escape_attribute(value);
    start.push_attribute(Attribute {
        key: QName(name.as_bytes()),
        value: Cow::Owned(escaped.into_bytes()),
    });
}

/// `>` is only escaped where it would close a `]]>` sequence.
fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '\r']) && !text.contains("]]>") {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' if out.ends_with("]]") => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
    out
}
