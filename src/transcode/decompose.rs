//! Prolog decomposition
//!
//! Splits raw XML text into the declaration, the doctype and the whitespace
//! runs around them by exact substring scanning. Nothing here parses XML; the
//! pieces are kept verbatim so they can be written back unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

const BYTE_ORDER_MARK: char = '\u{feff}';

// Internal general entities only; parameter, external and NDATA entities are skipped.
static INTERNAL_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<!ENTITY\s+([^\s%"'>]+)\s+(?:"([^"]*)"|'([^']*)')\s*>"#).unwrap()
});

/// The verbatim pieces of a document preamble plus the remaining body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prolog<'a> {
    pub xml_declaration: &'a str,
    pub xml_decl_suffix: &'a str,
    pub doctype: &'a str,
    pub doctype_suffix: &'a str,
    /// Everything from the first token after the preamble onwards.
    pub body: &'a str,
}

/// A leading byte order mark is kept with the declaration, or with the
/// declaration suffix when there is no declaration.
pub fn decompose(text: &str) -> Prolog<'_> {
    let mut prolog = Prolog::default();
    let mut rest = text;
    let bom = if text.starts_with(BYTE_ORDER_MARK) {
        BYTE_ORDER_MARK.len_utf8()
    } else {
        0
    };

    match text[bom..].find("?>") {
        Some(end) if is_declaration_start(&text[bom..]) => {
            let (decl, after) = text.split_at(bom + end + 2);
            let (suffix, after) = split_leading_whitespace(after);
            prolog.xml_declaration = decl;
            prolog.xml_decl_suffix = suffix;
            rest = after;
        }
        _ if bom > 0 => {
            let (suffix, after) = split_leading_whitespace(&text[bom..]);
            prolog.xml_decl_suffix = &text[..bom + suffix.len()];
            rest = after;
        }
        _ => {}
    }

    if rest.starts_with("<!DOCTYPE") {
        if let Some(end) = doctype_end(rest) {
            let (doctype, after) = rest.split_at(end);
            let (suffix, after) = split_leading_whitespace(after);
            prolog.doctype = doctype;
            prolog.doctype_suffix = suffix;
            rest = after;
        }
    }

    prolog.body = rest;
    prolog
}

/// Entities declared with a literal value in the doctype's internal subset.
pub fn internal_entities(doctype: &str) -> HashMap<String, String> {
    INTERNAL_ENTITY
        .captures_iter(doctype)
        .filter_map(|caps| {
            let value = caps.get(2).or_else(|| caps.get(3))?;
            Some((caps[1].to_string(), value.as_str().to_string()))
        })
        .collect()
}

/// `<?xml` followed by whitespace or `?>`, so `<?xml-stylesheet` does not count.
fn is_declaration_start(text: &str) -> bool {
    text.strip_prefix("<?xml")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_whitespace() || c == '?')
}

fn split_leading_whitespace(text: &str) -> (&str, &str) {
    let end = text
        .find(|c: char| !c.is_ascii_whitespace())
        .unwrap_or(text.len());
    text.split_at(end)
}

/// Byte offset just past the `>` closing a `<!DOCTYPE`, honouring quoted
/// literals, the bracketed internal subset and comments inside it.
fn doctype_end(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    let mut depth = 0usize;
    let mut i = "<!DOCTYPE".len();

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'[' => depth += 1,
            b']' => depth = depth.saturating_sub(1),
            b'<' if depth > 0 && text[i..].starts_with("<!--") => {
                let close = text[i + 4..].find("-->")?;
                i += 4 + close + 3;
                continue;
            }
            b'>' if depth == 0 => return Some(i + 1),
            _ => {}
        }
        i += 1;
    }

    None
}
