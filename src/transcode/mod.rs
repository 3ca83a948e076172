//! XML ⇄ structured-form transcoder
//!
//! [`parse_to_structured`] turns raw XML text into a [`DocumentEnvelope`];
//! [`render_from_structured`] writes it back. For documents with a declaration
//! and doctype, written without pretty-printing, the pair is byte-exact.
//!
//! Text is stored decoded, so character references and CDATA sections come
//! back as escaped text, and quoting is normalised to double quotes.
//!
//! [`DocumentEnvelope`]: crate::tree::DocumentEnvelope

pub mod decompose;
pub(crate) mod parse;
pub(crate) mod render;

pub use decompose::{Prolog, decompose};
pub use parse::parse_to_structured;
pub use render::{RenderOptions, render, render_from_structured, strip_root_declarations};

use std::path::Path;

use crate::error::{Error, Result};
use crate::tree::StructuredRecord;

/// Read an XML file into its structured-form record.
pub fn record_from_xml_file(path: &Path) -> Result<StructuredRecord> {
    if !path.is_file() {
        return Err(Error::ResourceNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    let envelope = parse_to_structured(&text)?;
    log::info!("decomposed {} into structured form", path.display());
    Ok(StructuredRecord::from(&envelope))
}
