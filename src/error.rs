//! Error types for conversion, transcoding and validation
//!
//! Every failure the library can surface is a variant of [`Error`]. A tree that
//! merely fails schema validation is *not* an error: see
//! [`crate::validate::ValidationReport`].

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// An input document, metadata record or schema file does not exist.
    #[error("resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    /// The input is not a word-processor document this crate can read.
    #[error("unsupported document: {0}")]
    UnsupportedDocument(String),

    /// Structured input is malformed, or is a template where a tree was required.
    #[error("invalid structured data: {0}")]
    InvalidStructuredData(String),

    /// A `prefix:local` name uses a prefix absent from the active namespace map.
    #[error("unknown namespace prefix: {0}")]
    UnknownPrefix(String),

    /// A structured node is neither an element nor a comment.
    #[error("unsupported node type: {0}")]
    UnsupportedNodeType(String),

    /// A structured element has no tag name.
    #[error("structured element missing 'tag'")]
    MissingTag,

    /// The schema resource is not a schema at all (e.g. a saved HTML page).
    #[error(
        "schema resource {} looks like an HTML page; re-download the raw DTD files",
        .0.display()
    )]
    SchemaResourceInvalid(PathBuf),

    /// The schema could not be parsed, even after the patched retry.
    #[error("schema parse error: {0}")]
    SchemaParse(String),

    /// XML body text rejected by the reader (unbalanced tags, undefined entities).
    #[error("malformed XML at byte {position}: {message}")]
    MalformedXml { position: usize, message: String },

    #[error("the external schema validator could not be run: {0}")]
    OracleUnavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Docx(#[from] docx_rs::ReaderError),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// True for the fail-fast structural errors raised while building or transcoding.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::UnknownPrefix(_) | Error::UnsupportedNodeType(_) | Error::MissingTag
        )
    }
}
