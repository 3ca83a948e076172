//! Bibliographic metadata overlay
//!
//! A metadata record is an XML file with an `item-info` section:
//!
//! ```xml
//! <item-info>
//!   <jid>CHAOS</jid><aid>115581</aid><pii>S0960-0779(24)01136-6</pii>
//!   <accept-date><date yr="2024"/></accept-date>
//!   <first-author><fnm>Ada</fnm><snm>Lovelace</snm></first-author>
//!   <corr-author><fnm>Alan</fnm><snm>Turing</snm><aff><ead>at@example.org</ead></aff></corr-author>
//! </item-info>
//! ```
//!
//! Only the first `item-info` is read. Empty values count as absent.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::transcode::parse_to_structured;
use crate::tree::{Element, Node};

/// One author entry for `ce:author-group`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub degrees: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
}

/// Values that override the configured publisher defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMeta {
    pub jid: Option<String>,
    pub aid: Option<String>,
    pub pii: Option<String>,
    pub doi: Option<String>,
    pub article_number: Option<String>,
    pub title: Option<String>,
    pub copyright_year: Option<String>,
    pub authors: Vec<Author>,
}

impl ArticleMeta {
    /// Read a metadata record from XML text.
    pub fn from_xml(text: &str) -> Result<Self> {
        let envelope = parse_to_structured(text)?;
        let Node::Element(root) = &envelope.root else {
            return Ok(Self::default());
        };
        let Some(info) = root.find_descendant("item-info") else {
            log::warn!("metadata record has no item-info section; using defaults");
            return Ok(Self::default());
        };
        Ok(Self::from_item_info(info))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ResourceNotFound(path.to_path_buf()));
        }
        let meta = Self::from_xml(&std::fs::read_to_string(path)?)?;
        log::debug!(
            "metadata from {}: {} author(s)",
            path.display(),
            meta.authors.len()
        );
        Ok(meta)
    }

    fn from_item_info(info: &Element) -> Self {
        let text = |path: &str| value_at(info, path);

        let mut authors = Vec::new();
        if info.find("first-author").is_some() {
            authors.push(Author {
                degrees: text("first-author/degree"),
                given_name: text("first-author/fnm"),
                surname: text("first-author/snm"),
                email: None,
            });
        }
        if info.find("corr-author").is_some() {
            authors.push(Author {
                degrees: text("corr-author/degree"),
                given_name: text("corr-author/fnm"),
                surname: text("corr-author/snm"),
                email: text("corr-author/aff/ead"),
            });
        }

        ArticleMeta {
            jid: text("jid"),
            aid: text("aid"),
            pii: text("pii"),
            doi: text("doi"),
            article_number: text("article-number"),
            title: text("item-title"),
            copyright_year: info
                .find_path("accept-date/date")
                .and_then(|date| date.attribute("yr"))
                .and_then(non_empty),
            authors,
        }
    }
}

fn value_at(info: &Element, path: &str) -> Option<String> {
    info.find_path(path).and_then(|element| non_empty(element.text()))
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
