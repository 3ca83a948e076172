//! Schema tree construction
//!
//! Two strategies, chosen by what the caller has:
//!
//! - **Lossless**: a full structured-form record. The tree is rebuilt exactly
//!   as recorded, comments and tails included, and written without
//!   pretty-printing.
//! - **Heuristic**: the paragraph sequence of a word-processor document,
//!   optionally overlaid with a metadata record. Structure is inferred from
//!   paragraph styles and text, and ids come from fixed counters.

pub mod classify;
pub mod heuristic;
pub mod ids;
pub mod meta;

pub use classify::{LineKind, classify};
pub use heuristic::{SchemaTree, build_article};
pub use meta::{ArticleMeta, Author};

use std::path::Path;

use crate::error::{Error, Result};
use crate::transcode::render_from_structured;
use crate::tree::{DocumentEnvelope, StructuredRecord};

/// Lossless path: rebuild and serialize a structured-form record.
///
/// A record whose `article` is a template string, or anything other than an
/// object, is rejected with [`crate::Error::InvalidStructuredData`].
pub fn build_from_record(record: StructuredRecord) -> Result<String> {
    let envelope = DocumentEnvelope::try_from(record)?;
    render_from_structured(&envelope)
}

/// Lossless path from record JSON text.
pub fn build_from_json(json: &str) -> Result<String> {
    build_from_record(StructuredRecord::from_json(json)?)
}

/// Lossless path from a record file on disk.
pub fn build_from_record_file(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::ResourceNotFound(path.to_path_buf()));
    }
    let xml = build_from_json(&std::fs::read_to_string(path)?)?;
    log::info!("rebuilt XML from structured record {}", path.display());
    Ok(xml)
}
