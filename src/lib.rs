//! artxml: publisher-schema XML from word-processor documents
//!
//! This library converts .docx manuscripts into journal-article XML shaped
//! for a publisher DTD, and moves arbitrary XML through a lossless JSON
//! structured form and back.
//!
//! - [`transcode`]: byte-faithful XML ⇄ structured-form conversion
//! - [`document`]: paragraph and style extraction from .docx files
//! - [`builder`]: schema tree construction (lossless and heuristic)
//! - [`validate`]: DTD validation through an external checker

pub mod builder;
pub mod config;
pub mod document;
pub mod error;
pub mod transcode;
pub mod tree;
pub mod validate;

// Re-export commonly used types
pub use builder::{ArticleMeta, SchemaTree, build_article, build_from_record};
pub use config::Config;
pub use document::{StyledParagraph, open_paragraphs};
pub use error::{Error, Result};
pub use transcode::{parse_to_structured, render_from_structured};
pub use tree::{DocumentEnvelope, Element, Node, StructuredRecord};
pub use validate::{ValidationReport, Violation, validate};
