//! Paragraph extraction
//!
//! Reads a .docx package into an ordered, single-pass sequence of
//! [`StyledParagraph`]s. No classification happens here.

use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use super::io::validate_docx_file;
use super::models::{DEFAULT_STYLE, StyledParagraph};
use crate::error::Result;

/// Lazy sequence of non-blank paragraphs in source order.
///
/// The underlying document is consumed as the iterator advances, so the
/// sequence can be walked exactly once.
pub struct Paragraphs {
    children: std::vec::IntoIter<docx_rs::DocumentChild>,
    style_names: HashMap<String, String>,
}

impl Paragraphs {
    fn new(docx: docx_rs::Docx) -> Self {
        let style_names = docx
            .styles
            .styles
            .iter()
            .filter_map(|style| {
                style_display_name(&style.name).map(|name| (style.style_id.clone(), name))
            })
            .collect();

        Self {
            children: docx.document.children.into_iter(),
            style_names,
        }
    }

    fn style_of(&self, para: &docx_rs::Paragraph) -> String {
        match &para.property.style {
            Some(style) => self
                .style_names
                .get(&style.val)
                .cloned()
                .unwrap_or_else(|| style.val.clone()),
            None => DEFAULT_STYLE.to_string(),
        }
    }
}

impl Iterator for Paragraphs {
    type Item = StyledParagraph;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let docx_rs::DocumentChild::Paragraph(para) = self.children.next()? else {
                continue;
            };
            let text = extract_paragraph_text(&para);
            if text.is_empty() {
                continue;
            }
            return Some(StyledParagraph {
                text,
                style: self.style_of(&para),
            });
        }
    }
}

/// Read paragraphs from the bytes of a .docx package.
pub fn read_paragraphs(bytes: &[u8]) -> Result<Paragraphs> {
    let docx = docx_rs::read_docx(bytes)?;
    Ok(Paragraphs::new(docx))
}

/// Validate and read a .docx file from disk.
pub fn open_paragraphs(path: &Path) -> Result<Paragraphs> {
    validate_docx_file(path)?;
    let bytes = std::fs::read(path)?;
    log::debug!("read {} bytes from {}", bytes.len(), path.display());
    read_paragraphs(&bytes)
}

/// Style names have no public accessor in docx-rs; they are read through
/// the serialized form instead.
fn style_display_name(name: &docx_rs::Name) -> Option<String> {
    let name = match serde_json::to_value(name).ok()? {
        Value::String(name) => name,
        Value::Object(mut fields) => match fields.remove("name")? {
            Value::String(name) => name,
            _ => return None,
        },
        _ => return None,
    };
    (!name.is_empty()).then_some(name)
}

/// Extract trimmed plain text from a paragraph
pub(crate) fn extract_paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut text = String::new();

    for child in &para.children {
        match child {
            docx_rs::ParagraphChild::Run(run) => {
                text.push_str(&extract_run_text(run));
            }
            docx_rs::ParagraphChild::Insert(insert) => {
                for child in &insert.children {
                    if let docx_rs::InsertChild::Run(run) = child {
                        text.push_str(&extract_run_text(run));
                    }
                }
            }
            // Deleted text (track changes) is not part of the document
            docx_rs::ParagraphChild::Delete(_) => {}
            _ => {}
        }
    }

    text.trim().to_string()
}

fn extract_run_text(run: &docx_rs::Run) -> String {
    let mut text = String::new();

    for child in &run.children {
        match child {
            docx_rs::RunChild::Text(text_elem) => text.push_str(&text_elem.text),
            docx_rs::RunChild::Tab(_) => text.push('\t'),
            docx_rs::RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }

    text
}
