//! Content extraction from word-processor documents
//!
//! This module reads Microsoft Word (.docx) documents into an ordered
//! sequence of (text, style name) records for the schema builder.

pub mod extract;
pub(crate) mod io;
pub mod models;

pub use extract::{Paragraphs, open_paragraphs, read_paragraphs};
pub use models::{DEFAULT_STYLE, StyledParagraph};
