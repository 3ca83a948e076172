//! Structured-form record
//!
//! The JSON interchange form of a [`DocumentEnvelope`]. Element records omit
//! `type`; comment records carry `"type": "comment"`. Key order inside `attrs`
//! and `namespaces` is preserved.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Attributes, Comment, DocumentEnvelope, Element, NamespaceMap, Node};
use crate::error::{Error, Result};

fn default_true() -> bool {
    true
}

/// Top-level structured-form record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredRecord {
    #[serde(default)]
    pub xml_declaration: String,
    #[serde(default)]
    pub doctype: String,
    #[serde(default)]
    pub xml_decl_suffix: String,
    #[serde(default)]
    pub doctype_suffix: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trailer: String,
    #[serde(default = "default_true")]
    pub use_namespaces: bool,
    #[serde(default)]
    pub strip_namespaces: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<NamespaceMap>,
    /// Kept as a raw value so a templated string can be told apart from a tree.
    #[serde(default)]
    pub article: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct NodeRecord {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    attrs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tail: Option<String>,
}

impl StructuredRecord {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidStructuredData(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl TryFrom<StructuredRecord> for DocumentEnvelope {
    type Error = Error;

    fn try_from(record: StructuredRecord) -> Result<Self> {
        let root = match record.article {
            Value::Object(_) => {
                let node: NodeRecord = serde_json::from_value(record.article)
                    .map_err(|e| Error::InvalidStructuredData(e.to_string()))?;
                Node::try_from(node)?
            }
            Value::String(_) => {
                return Err(Error::InvalidStructuredData(
                    "template usage is disabled; provide the 'article' tree as an object \
                     so the XML can be built programmatically"
                        .to_string(),
                ));
            }
            _ => {
                return Err(Error::InvalidStructuredData(
                    "missing or invalid 'article' object".to_string(),
                ));
            }
        };

        Ok(DocumentEnvelope {
            root,
            xml_declaration: record.xml_declaration,
            doctype: record.doctype,
            xml_decl_suffix: record.xml_decl_suffix,
            doctype_suffix: record.doctype_suffix,
            trailer: record.trailer,
            namespaces: record.namespaces,
            use_namespaces: record.use_namespaces,
            strip_namespaces: record.strip_namespaces,
        })
    }
}

impl From<&DocumentEnvelope> for StructuredRecord {
    fn from(envelope: &DocumentEnvelope) -> Self {
        let article = serde_json::to_value(NodeRecord::from(&envelope.root))
            .unwrap_or(Value::Null);
        StructuredRecord {
            xml_declaration: envelope.xml_declaration.clone(),
            doctype: envelope.doctype.clone(),
            xml_decl_suffix: envelope.xml_decl_suffix.clone(),
            doctype_suffix: envelope.doctype_suffix.clone(),
            trailer: envelope.trailer.clone(),
            use_namespaces: envelope.use_namespaces,
            strip_namespaces: envelope.strip_namespaces,
            namespaces: envelope.namespaces.clone(),
            article,
        }
    }
}

impl TryFrom<NodeRecord> for Node {
    type Error = Error;

    fn try_from(record: NodeRecord) -> Result<Self> {
        match record.kind.as_deref() {
            Some("comment") => Ok(Node::Comment(Comment {
                text: record.text.unwrap_or_default(),
                tail: record.tail,
            })),
            None | Some("element") => {
                let tag = record.tag.filter(|t| !t.is_empty()).ok_or(Error::MissingTag)?;

                let mut attributes = Attributes::new();
                for (name, value) in record.attrs {
                    let value = attribute_value_to_string(&name, value)?;
                    attributes.insert(name, value);
                }

                let children = record
                    .children
                    .into_iter()
                    .map(Node::try_from)
                    .collect::<Result<Vec<_>>>()?;

                Ok(Node::Element(Element {
                    tag,
                    attributes,
                    text: record.text,
                    children,
                    tail: record.tail,
                }))
            }
            Some(other) => Err(Error::UnsupportedNodeType(other.to_string())),
        }
    }
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        match node {
            Node::Comment(comment) => NodeRecord {
                kind: Some("comment".to_string()),
                text: Some(comment.text.clone()),
                tail: comment.tail.clone(),
                ..NodeRecord::default()
            },
            Node::Element(element) => NodeRecord {
                kind: None,
                tag: Some(element.tag.clone()),
                attrs: element
                    .attributes
                    .iter()
                    .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                    .collect(),
                text: element.text.clone(),
                children: element.children.iter().map(NodeRecord::from).collect(),
                tail: element.tail.clone(),
            },
        }
    }
}

/// Scalars are written as their textual form; anything else is rejected.
fn attribute_value_to_string(name: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::InvalidStructuredData(format!(
            "attribute '{name}' must be a scalar, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope_from(json: &str) -> Result<DocumentEnvelope> {
        DocumentEnvelope::try_from(StructuredRecord::from_json(json)?)
    }

    #[test]
    fn test_minimal_record_uses_defaults() {
        let envelope = envelope_from(r#"{"article": {"tag": "article"}}"#).unwrap();
        assert!(envelope.use_namespaces);
        assert!(!envelope.strip_namespaces);
        assert!(envelope.namespaces.is_none());
        assert!(envelope.xml_declaration.is_empty());
    }

    #[test]
    fn test_template_string_is_rejected() {
        let err = envelope_from(r#"{"article": "<article>{{ body }}</article>"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidStructuredData(msg) if msg.contains("template")));
    }

    #[test]
    fn test_missing_article_is_rejected() {
        let err = envelope_from(r#"{"doctype": ""}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidStructuredData(_)));
    }

    #[test]
    fn test_unsupported_node_type() {
        let json = r#"{"article": {"tag": "article", "children": [{"type": "pi", "text": "x"}]}}"#;
        match envelope_from(json) {
            Err(Error::UnsupportedNodeType(kind)) => assert_eq!(kind, "pi"),
            other => panic!("expected UnsupportedNodeType, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_tag() {
        let json = r#"{"article": {"tag": "article", "children": [{"text": "orphan"}]}}"#;
        assert!(matches!(envelope_from(json), Err(Error::MissingTag)));
    }

    #[test]
    fn test_attribute_order_and_scalars() {
        let json = r#"{"article": {"tag": "ce:copyright", "attrs": {"year": 2024, "type": "unknown"}}}"#;
        let envelope = envelope_from(json).unwrap();
        let Node::Element(root) = envelope.root else {
            panic!("root should be an element");
        };
        let attrs: Vec<_> = root.attributes.iter().collect();
        assert_eq!(attrs, vec![("year", "2024"), ("type", "unknown")]);
    }

    #[test]
    fn test_record_round_trip_through_json() {
        let json = r#"{
            "xml_declaration": "<?xml version=\"1.0\"?>",
            "xml_decl_suffix": "\n",
            "strip_namespaces": true,
            "namespaces": {"ce": "urn:tmp:ce"},
            "article": {
                "tag": "article",
                "text": "\n",
                "children": [
                    {"type": "comment", "text": " note ", "tail": "\n"},
                    {"tag": "ce:para", "attrs": {"id": "p0010"}, "text": "Hi", "tail": "\n"}
                ]
            }
        }"#;
        let envelope = envelope_from(json).unwrap();
        let written = StructuredRecord::from(&envelope).to_json_pretty().unwrap();
        let reread = envelope_from(&written).unwrap();
        assert_eq!(envelope, reread);
        assert!(written.contains("\"use_namespaces\": true"));
    }
}
