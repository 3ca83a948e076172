//! Paragraph roles for the heuristic builder

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::StyledParagraph;

static NUMBERED_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s").unwrap());

// "Fig. 2: Sample image", "Figure 7 Results", "fig.3"
static FIGURE_CAPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^(Fig\.|Figure)\s*(\d+)[\.:]?\s*(.*)$").unwrap());

/// What a paragraph becomes in the schema tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// The first paragraph of the document.
    Title,
    Header,
    /// `number` is the figure number written in the caption.
    Caption { number: u32, text: String },
    Body,
}

/// Classify the paragraph at `index` (position among non-blank paragraphs).
///
/// Rules apply in order: first paragraph, heading style or `N. ` numbering,
/// figure caption, everything else.
pub fn classify(index: usize, paragraph: &StyledParagraph) -> LineKind {
    if index == 0 {
        return LineKind::Title;
    }

    if paragraph.style.to_lowercase().starts_with("heading")
        || NUMBERED_HEADER.is_match(&paragraph.text)
    {
        return LineKind::Header;
    }

    if let Some(caps) = FIGURE_CAPTION.captures(&paragraph.text) {
        // A number too large for u32 cannot name a graphic; keep it as text.
        if let Ok(number) = caps[2].parse::<u32>() {
            return LineKind::Caption {
                number,
                text: caps[3].trim().to_string(),
            };
        }
    }

    LineKind::Body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(text: &str, style: &str) -> StyledParagraph {
        StyledParagraph::new(text, style)
    }

    #[test]
    fn test_first_paragraph_is_always_title() {
        assert_eq!(classify(0, &para("1. Intro", "Heading 1")), LineKind::Title);
        assert_eq!(classify(0, &para("Fig. 1 x", "Caption")), LineKind::Title);
    }

    #[test]
    fn test_header_by_style_or_numbering() {
        assert_eq!(classify(1, &para("Methods", "Heading 2")), LineKind::Header);
        assert_eq!(classify(1, &para("Methods", "heading1")), LineKind::Header);
        assert_eq!(classify(1, &para("1. Introduction", "Normal")), LineKind::Header);
        assert_eq!(classify(1, &para("1.5 percent", "Normal")), LineKind::Body);
        assert_eq!(classify(1, &para("Subheading", "Subheading")), LineKind::Body);
    }

    #[test]
    fn test_caption_forms() {
        assert_eq!(
            classify(3, &para("Fig. 2: Sample image", "Caption")),
            LineKind::Caption {
                number: 2,
                text: "Sample image".to_string()
            }
        );
        assert_eq!(
            classify(3, &para("FIGURE 12 Phase portrait", "Normal")),
            LineKind::Caption {
                number: 12,
                text: "Phase portrait".to_string()
            }
        );
        assert_eq!(
            classify(3, &para("Fig.3", "Normal")),
            LineKind::Caption {
                number: 3,
                text: String::new()
            }
        );
    }

    #[test]
    fn test_header_wins_over_caption() {
        assert_eq!(
            classify(2, &para("Figure 1 overview", "Heading 1")),
            LineKind::Header
        );
    }

    #[test]
    fn test_plain_text_is_body() {
        assert_eq!(classify(5, &para("Figures show results.", "Normal")), LineKind::Body);
        assert_eq!(classify(5, &para("Some text.", "Normal")), LineKind::Body);
    }
}
