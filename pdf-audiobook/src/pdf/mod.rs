//! PDF reading and structure-aware text extraction.

mod extract;
pub mod structure;

pub use extract::{extract_blocks, page_count};
pub use structure::StructureOptions;

use crate::error::PipelineError;

/// Inclusive 1-indexed page selection. `None` bounds mean "from the first
/// page" / "to the last page".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRange {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl PageRange {
    pub const ALL: Self = Self {
        start: None,
        end: None,
    };

    pub fn new(start: Option<usize>, end: Option<usize>) -> Self {
        Self { start, end }
    }

    /// Parse a range string like "5-12", "7", "5-" or "-12".
    pub fn parse(s: &str) -> Result<Self, PipelineError> {
        let parse_bound = |part: &str| -> Result<Option<usize>, PipelineError> {
            if part.is_empty() {
                return Ok(None);
            }
            part.parse().map(Some).map_err(|_| {
                PipelineError::Config(format!(
                    "invalid page range '{}': use 'start-end' with 1-indexed pages (e.g. '5-12')",
                    s
                ))
            })
        };

        let trimmed = s.trim();
        if let Some((start, end)) = trimmed.split_once('-') {
            Ok(Self::new(parse_bound(start.trim())?, parse_bound(end.trim())?))
        } else {
            let page = parse_bound(trimmed)?;
            Ok(Self::new(page, page))
        }
    }

    /// Resolve against a page count, validating the bounds.
    pub fn resolve(&self, page_count: usize) -> Result<(usize, usize), PipelineError> {
        let start = self.start.unwrap_or(1);
        let end = self.end.unwrap_or(page_count);

        let reason = if start == 0 {
            Some("pages are 1-indexed")
        } else if start > end {
            Some("start page is after end page")
        } else if end > page_count {
            Some("end page is past the last page")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(PipelineError::InvalidRange {
                start,
                end,
                page_count,
                reason,
            }),
            None => Ok((start, end)),
        }
    }
}

/// Classification of one extracted block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Heading with rank 1 (most senior) to 3.
    Heading { level: u8 },
    Paragraph,
}

/// One structurally-classified unit of extracted text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub text: String,
    /// Position in document reading order.
    pub order: usize,
}

impl TextBlock {
    pub fn heading(level: u8, text: impl Into<String>, order: usize) -> Self {
        Self {
            kind: BlockKind::Heading { level },
            text: text.into(),
            order,
        }
    }

    pub fn paragraph(text: impl Into<String>, order: usize) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: text.into(),
            order,
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self.kind, BlockKind::Heading { .. })
    }
}
