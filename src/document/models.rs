//! Extracted paragraph records

use serde::{Deserialize, Serialize};

/// The style applied when a paragraph names none.
pub const DEFAULT_STYLE: &str = "Normal";

/// One non-blank paragraph: trimmed text plus the name of its paragraph style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledParagraph {
    pub text: String,
    pub style: String,
}

impl StyledParagraph {
    pub fn new(text: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: style.into(),
        }
    }
}

impl<T: Into<String>, S: Into<String>> From<(T, S)> for StyledParagraph {
    fn from((text, style): (T, S)) -> Self {
        Self::new(text, style)
    }
}
