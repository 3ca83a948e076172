//! Element identifiers
//!
//! Each category draws from its own counter. Values are zero-padded to four
//! digits (`s0010`, `p0120`, `f0005`).

/// A counter that yields `start`, `start + step`, ...
#[derive(Debug, Clone)]
pub struct IdSequence {
    next: u32,
    step: u32,
}

impl IdSequence {
    pub fn new(start: u32, step: u32) -> Self {
        Self { next: start, step }
    }

    /// Take the current value and advance.
    pub fn advance(&mut self) -> u32 {
        let value = self.next;
        self.next += self.step;
        value
    }
}

pub fn format_id(prefix: &str, value: u32) -> String {
    format!("{prefix}{value:04}")
}

/// Ids for one section and its title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionIds {
    pub section: String,
    pub title: String,
}

/// Ids for one figure, its caption and the caption's paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureIds {
    pub figure: String,
    pub caption: String,
    pub simple_para: String,
}

/// All counters used by one heuristic build.
///
/// Paragraph ids run across the whole document and are never reset when a
/// new section opens.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    sections: IdSequence,
    paragraphs: IdSequence,
    figures: IdSequence,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            sections: IdSequence::new(10, 10),
            paragraphs: IdSequence::new(10, 10),
            figures: IdSequence::new(5, 5),
        }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_section(&mut self) -> SectionIds {
        let value = self.sections.advance();
        SectionIds {
            section: format_id("s", value),
            title: format_id("st", value),
        }
    }

    pub fn next_paragraph(&mut self) -> String {
        format_id("p", self.paragraphs.advance())
    }

    /// Figure ids follow caption encounter order, not the caption's own number.
    pub fn next_figure(&mut self) -> FigureIds {
        let value = self.figures.advance();
        FigureIds {
            figure: format_id("f", value),
            caption: format_id("ca", value),
            simple_para: format_id("sp", value),
        }
    }
}
