//! PDFium-backed page reading.
//!
//! Only this layer touches PDFium: it reads characters with their font size
//! and bounds, groups them into lines, and hands the lines to the structure
//! heuristics. Pages without extractable text (image-only scans) yield no
//! lines; that is only an error when the whole selection comes back empty.

use pdfium_render::prelude::*;

use super::structure::{self, Line, StructureOptions};
use super::{PageRange, TextBlock};
use crate::error::PipelineError;

/// Vertical drift, as a fraction of char height, tolerated when grouping
/// characters into one line.
const LINE_MERGE_TOLERANCE: f32 = 0.5;

fn bind_pdfium() -> Result<Pdfium, PipelineError> {
    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| PipelineError::Pdf(format!("failed to load the PDFium library: {:?}", e)))
}

fn load_error(e: PdfiumError) -> PipelineError {
    PipelineError::Pdf(format!("failed to open document: {:?}", e))
}

/// Number of pages in the document.
pub fn page_count(pdf_bytes: &[u8]) -> Result<usize, PipelineError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(pdf_bytes, None)
        .map_err(load_error)?;
    Ok(document.pages().len() as usize)
}

/// Extract ordered, structure-classified text blocks from the selected
/// pages.
pub fn extract_blocks(
    pdf_bytes: &[u8],
    range: PageRange,
    opts: &StructureOptions,
) -> Result<Vec<TextBlock>, PipelineError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(pdf_bytes, None)
        .map_err(load_error)?;

    let pages = document.pages();
    let (start, end) = range.resolve(pages.len() as usize)?;

    let mut blocks = Vec::new();
    let mut order = 0;

    for index in (start - 1)..end {
        let page = pages.get(index as u16).map_err(|e| {
            PipelineError::Pdf(format!("failed to load page {}: {:?}", index + 1, e))
        })?;
        let lines = read_lines(&page)?;
        blocks.extend(structure::blocks_from_lines(&lines, opts, &mut order));
    }

    if blocks.is_empty() {
        return Err(PipelineError::ExtractionEmpty);
    }
    Ok(blocks)
}

/// Accumulates characters into one visual line.
#[derive(Default)]
struct LineBuilder {
    text: String,
    font_size: f32,
    top: f32,
    bottom: f32,
}

impl LineBuilder {
    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn midpoint(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    fn push(&mut self, c: char, font_size: f32, top: f32, bottom: f32) {
        if self.is_empty() {
            self.top = top;
            self.bottom = bottom;
        } else {
            self.top = self.top.max(top);
            self.bottom = self.bottom.min(bottom);
        }
        self.font_size = self.font_size.max(font_size);
        self.text.push(c);
    }

    fn flush(&mut self, lines: &mut Vec<Line>) {
        if !self.text.trim().is_empty() {
            lines.push(Line::new(
                std::mem::take(&mut self.text),
                self.font_size,
                self.top,
                self.bottom,
            ));
        } else {
            self.text.clear();
        }
        self.font_size = 0.0;
        self.top = 0.0;
        self.bottom = 0.0;
    }
}

fn read_lines(page: &PdfPage) -> Result<Vec<Line>, PipelineError> {
    let text = page
        .text()
        .map_err(|e| PipelineError::Pdf(format!("failed to read page text: {:?}", e)))?;

    let mut lines = Vec::new();
    let mut current = LineBuilder::default();

    for ch in text.chars().iter() {
        let Some(c) = ch.unicode_char() else {
            continue;
        };
        if c == '\r' {
            continue;
        }
        if c == '\n' {
            current.flush(&mut lines);
            continue;
        }

        let Ok(bounds) = ch.loose_bounds() else {
            continue;
        };
        let top = bounds.top.value;
        let bottom = bounds.bottom.value;
        let height = (top - bottom).max(1.0);
        let midpoint = (top + bottom) / 2.0;

        // A character that sits clearly above or below the running line
        // starts a new one.
        if !current.is_empty()
            && (midpoint - current.midpoint()).abs() > height * LINE_MERGE_TOLERANCE
        {
            current.flush(&mut lines);
        }

        if !c.is_control() {
            current.push(c, ch.unscaled_font_size().value, top, bottom);
        }
    }
    current.flush(&mut lines);

    Ok(lines)
}
