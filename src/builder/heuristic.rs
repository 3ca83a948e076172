//! Schema tree from extracted paragraphs
//!
//! One pass over the paragraph sequence. Sections and figures are collected
//! as they appear; the `article` root is assembled at the end in schema order
//! (`item-info`, `ce:floats`, `head`, `body`).

use std::collections::BTreeSet;

use crate::config::{Config, DoctypeConfig};
use crate::document::StyledParagraph;
use crate::error::Result;
use crate::transcode::{RenderOptions, render};
use crate::tree::{DocumentEnvelope, Element, NamespaceMap};

use super::classify::{LineKind, classify};
use super::ids::IdAllocator;
use super::meta::{ArticleMeta, Author};

const XML_DECLARATION: &str = "<?xml version='1.0' encoding='UTF-8'?>";
const SYNTHETIC_SECTION_TITLE: &str = "Introduction";
const EMPTY_SECTION_FILLER: &str = "Content pending.";
const UNTITLED: &str = "Untitled Document";

/// A built `article` tree plus what its preamble needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTree {
    root: Element,
    figure_numbers: BTreeSet<u32>,
}

impl SchemaTree {
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Highest figure number written in any caption, or 0.
    pub fn largest_figure(&self) -> u32 {
        self.figure_numbers.last().copied().unwrap_or(0)
    }

    /// Distinct figure numbers written in captions, ascending.
    pub fn figure_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.figure_numbers.iter().copied()
    }

    /// Wrap the tree with the publisher namespaces and preamble.
    pub fn to_envelope(&self, config: &Config) -> DocumentEnvelope {
        let mut envelope = DocumentEnvelope::new(self.root.clone());
        envelope.namespaces = Some(NamespaceMap::publisher());
        envelope.xml_declaration = XML_DECLARATION.to_string();
        envelope.xml_decl_suffix = "\n".to_string();
        envelope.doctype = doctype(&config.doctype, &self.figure_numbers);
        envelope.doctype_suffix = "\n".to_string();
        envelope.trailer = "\n".to_string();
        envelope
    }

    /// The full output document: declaration, doctype, indented body.
    pub fn to_xml(&self, config: &Config) -> Result<String> {
        render(&self.to_envelope(config), RenderOptions::pretty())
    }

    /// The indented body alone, as handed to the schema validator.
    pub fn to_body_xml(&self) -> Result<String> {
        let mut envelope = DocumentEnvelope::new(self.root.clone());
        envelope.namespaces = Some(NamespaceMap::publisher());
        envelope.trailer = "\n".to_string();
        render(&envelope, RenderOptions::pretty())
    }
}

/// `<!DOCTYPE article PUBLIC ...>` with one NDATA entity per expected graphic.
///
/// Graphics `1..=min_graphics` are always declared; beyond that only the
/// numbers captions actually name, so the block grows with the caption count.
fn doctype(config: &DoctypeConfig, figure_numbers: &BTreeSet<u32>) -> String {
    let entities: Vec<String> = (1..=config.min_graphics)
        .chain(figure_numbers.range(config.min_graphics.saturating_add(1)..).copied())
        .map(|n| format!("gr{n}"))
        .chain(config.extra_entities.iter().cloned())
        .map(|name| format!("<!ENTITY {name} SYSTEM \"{name}\" NDATA IMAGE>"))
        .collect();

    let mut out = format!(
        "<!DOCTYPE article PUBLIC \"{}\" \"{}\"",
        config.public_id, config.system_id
    );
    if !entities.is_empty() {
        out.push_str(" [\n");
        out.push_str(&entities.join("\n"));
        out.push(']');
    }
    out.push('>');
    out
}

/// Build the schema tree from extracted paragraphs and an optional overlay.
///
/// Metadata values win over the first paragraph and configured defaults.
pub fn build_article<I>(paragraphs: I, meta: &ArticleMeta, config: &Config) -> SchemaTree
where
    I: IntoIterator<Item = StyledParagraph>,
{
    let pii = meta.pii.as_deref().unwrap_or(&config.publisher.pii);
    let mut body = BodyBuilder::new(pii);

    for (index, paragraph) in paragraphs.into_iter().enumerate() {
        body.push(classify(index, &paragraph), paragraph.text);
    }
    let BodyBuilder {
        title,
        sections,
        figures,
        figure_numbers,
        ..
    } = body.finish();

    let title = meta
        .title
        .clone()
        .or(title)
        .unwrap_or_else(|| UNTITLED.to_string());

    let publisher = &config.publisher;
    let mut root = Element::new("article")
        .with_attribute("docsubtype", &publisher.docsubtype)
        .with_attribute("version", &publisher.version)
        .with_attribute("xml:lang", &publisher.lang);

    root.push(item_info(meta, config));
    if !figures.is_empty() {
        let mut floats = Element::new("ce:floats");
        floats.children.extend(figures.into_iter().map(Into::into));
        root.push(floats);
    }
    root.push(head(title, &meta.authors));

    let mut container = Element::new("ce:sections");
    container.children.extend(sections.into_iter().map(Into::into));
    root.push(Element::new("body").with_child(container));

    log::debug!(
        "built article tree with {} distinct figure number(s)",
        figure_numbers.len()
    );
    SchemaTree {
        root,
        figure_numbers,
    }
}

fn item_info(meta: &ArticleMeta, config: &Config) -> Element {
    let publisher = &config.publisher;
    let mut info = Element::new("item-info")
        .with_child(Element::new("jid").with_text(pick(&meta.jid, publisher.jid.as_str())))
        .with_child(Element::new("aid").with_text(pick(&meta.aid, publisher.aid.as_str())));
    if let Some(number) = &meta.article_number {
        info.push(Element::new("ce:article-number").with_text(number));
    }
    info.push(Element::new("ce:pii").with_text(pick(&meta.pii, publisher.pii.as_str())));
    if let Some(doi) = &meta.doi {
        info.push(Element::new("ce:doi").with_text(doi));
    }
    info.push(
        Element::new("ce:copyright")
            .with_attribute("type", &publisher.copyright_type)
            .with_attribute(
                "year",
                pick(&meta.copyright_year, publisher.copyright_year.as_str()),
            )
            .with_text(&publisher.copyright_text),
    );
    info
}

fn pick(value: &Option<String>, fallback: &str) -> String {
    value.clone().unwrap_or_else(|| fallback.to_string())
}

fn head(title: String, authors: &[Author]) -> Element {
    let mut group = Element::new("ce:author-group");
    if authors.is_empty() {
        group.push(
            Element::new("ce:author")
                .with_child(Element::new("ce:given-name").with_text("Unknown"))
                .with_child(Element::new("ce:surname").with_text("Author")),
        );
    }
    for author in authors {
        let mut element = Element::new("ce:author");
        if let Some(degrees) = &author.degrees {
            element.push(Element::new("ce:degrees").with_text(degrees));
        }
        element.push(
            Element::new("ce:given-name").with_text(author.given_name.as_deref().unwrap_or("")),
        );
        element.push(Element::new("ce:surname").with_text(author.surname.as_deref().unwrap_or("")));
        if let Some(email) = &author.email {
            element.push(Element::new("ce:e-address").with_text(email));
        }
        group.push(element);
    }

    Element::new("head")
        .with_child(Element::new("ce:title").with_text(title))
        .with_child(group)
}

struct BodyBuilder {
    ids: IdAllocator,
    /// PII reduced to letters and digits, as used in graphic links.
    asset_pii: String,
    title: Option<String>,
    sections: Vec<Element>,
    current: Option<Element>,
    figures: Vec<Element>,
    figure_numbers: BTreeSet<u32>,
}

impl BodyBuilder {
    fn new(pii: &str) -> Self {
        Self {
            ids: IdAllocator::new(),
            asset_pii: pii.chars().filter(|c| c.is_ascii_alphanumeric()).collect(),
            title: None,
            sections: Vec::new(),
            current: None,
            figures: Vec::new(),
            figure_numbers: BTreeSet::new(),
        }
    }

    fn push(&mut self, kind: LineKind, text: String) {
        match kind {
            LineKind::Title => self.title = Some(text),
            LineKind::Header => self.open_section(text),
            LineKind::Caption { number, text } => self.add_figure(number, text),
            LineKind::Body => {
                if self.current.is_none() {
                    self.open_section(SYNTHETIC_SECTION_TITLE.to_string());
                }
                let id = self.ids.next_paragraph();
                if let Some(section) = self.current.as_mut() {
                    section.push(
                        Element::new("ce:para")
                            .with_attribute("id", id)
                            .with_text(text),
                    );
                }
            }
        }
    }

    fn open_section(&mut self, title: String) {
        self.close_section();
        let ids = self.ids.next_section();
        self.current = Some(
            Element::new("ce:section")
                .with_attribute("id", ids.section)
                .with_child(
                    Element::new("ce:section-title")
                        .with_attribute("id", ids.title)
                        .with_text(title),
                ),
        );
    }

    fn close_section(&mut self) {
        let Some(mut section) = self.current.take() else {
            return;
        };
        if section.find("ce:para").is_none() {
            section.push(
                Element::new("ce:para")
                    .with_attribute("id", self.ids.next_paragraph())
                    .with_text(EMPTY_SECTION_FILLER),
            );
        }
        self.sections.push(section);
    }

    fn add_figure(&mut self, number: u32, text: String) {
        let ids = self.ids.next_figure();
        let caption = if text.is_empty() {
            format!("Figure {number}")
        } else {
            text
        };
        let locator = format!("gr{number}");
        let href = format!("pii:{}/{locator}", self.asset_pii);

        self.figures.push(
            Element::new("ce:figure")
                .with_attribute("id", ids.figure)
                .with_child(Element::new("ce:label").with_text(format!("Fig. {number}")))
                .with_child(
                    Element::new("ce:caption")
                        .with_attribute("id", ids.caption)
                        .with_child(
                            Element::new("ce:simple-para")
                                .with_attribute("id", ids.simple_para)
                                .with_text(caption),
                        ),
                )
                .with_child(
                    Element::new("ce:link")
                        .with_attribute("locator", locator)
                        .with_attribute("xlink:href", href),
                ),
        );
        self.figure_numbers.insert(number);
    }

    fn finish(mut self) -> Self {
        self.close_section();
        self
    }
}
