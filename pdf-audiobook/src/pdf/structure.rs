//! Heading/paragraph classification from raw page lines.
//!
//! Works on plain `Line` data so the heuristics stay testable without a
//! rendered PDF. Headings are detected relative to the page's body font
//! size; there is no absolute point-size threshold. Results on multi-column
//! or heavily designed layouts are best-effort.

use std::collections::HashMap;

use super::TextBlock;
use crate::text::cleaner::clean_text;

/// Tunables for the structure heuristics.
#[derive(Debug, Clone)]
pub struct StructureOptions {
    /// A line whose font size is at least this multiple of the page's body
    /// size is heading-sized.
    pub heading_ratio: f32,
    /// Heading-sized blocks longer than this read as display paragraphs,
    /// not headings.
    pub max_heading_chars: usize,
    /// Vertical gap, as a multiple of the previous line's height, that ends
    /// a paragraph.
    pub gap_factor: f32,
}

impl Default for StructureOptions {
    fn default() -> Self {
        Self {
            heading_ratio: 1.2,
            max_heading_chars: 120,
            gap_factor: 0.8,
        }
    }
}

/// One line of text as read from a page, in top-down reading order.
///
/// Coordinates are PDF user-space points, y growing upward: `top` is the
/// larger value.
#[derive(Debug, Clone)]
pub struct Line {
    pub text: String,
    /// Dominant font size on the line, in points.
    pub font_size: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Line {
    pub fn new(text: impl Into<String>, font_size: f32, top: f32, bottom: f32) -> Self {
        Self {
            text: text.into(),
            font_size,
            top,
            bottom,
        }
    }

    fn height(&self) -> f32 {
        (self.top - self.bottom).max(1.0)
    }
}

/// Most frequent font size on the page, weighted by character count.
///
/// Sizes are bucketed to half points; ties go to the smaller size, since
/// body text runs smaller than display text.
pub fn body_font_size(lines: &[Line]) -> Option<f32> {
    let mut weights: HashMap<i32, usize> = HashMap::new();
    for line in lines {
        let chars = line.text.chars().filter(|c| !c.is_whitespace()).count();
        if chars == 0 {
            continue;
        }
        let bucket = (line.font_size * 2.0).round() as i32;
        *weights.entry(bucket).or_insert(0) += chars;
    }

    weights
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(bucket, _)| bucket as f32 / 2.0)
}

/// Heading rank from the size ratio over body text: larger face, more
/// senior heading.
fn heading_level(ratio: f32) -> u8 {
    if ratio >= 1.6 {
        1
    } else if ratio >= 1.3 {
        2
    } else {
        3
    }
}

/// Close the running line group into one classified block.
fn flush_group(
    group: &mut Vec<&Line>,
    is_heading: bool,
    body_size: f32,
    opts: &StructureOptions,
    blocks: &mut Vec<TextBlock>,
    next_order: &mut usize,
) {
    if group.is_empty() {
        return;
    }
    let joined = group
        .iter()
        .map(|l| l.text.trim())
        .collect::<Vec<_>>()
        .join(" ");
    let max_size = group.iter().map(|l| l.font_size).fold(0.0f32, f32::max);
    group.clear();

    let text = clean_text(&joined);
    if text.is_empty() {
        return;
    }

    let block = if is_heading && text.chars().count() <= opts.max_heading_chars {
        TextBlock::heading(heading_level(max_size / body_size), text, *next_order)
    } else {
        TextBlock::paragraph(text, *next_order)
    };

    blocks.push(block);
    *next_order += 1;
}

/// Group a page's lines into classified blocks, appending reading-order
/// positions from `next_order`.
pub fn blocks_from_lines(
    lines: &[Line],
    opts: &StructureOptions,
    next_order: &mut usize,
) -> Vec<TextBlock> {
    let Some(body_size) = body_font_size(lines) else {
        return Vec::new();
    };

    let mut blocks = Vec::new();
    let mut group: Vec<&Line> = Vec::new();
    let mut group_is_heading = false;

    for line in lines {
        if line.text.trim().is_empty() {
            continue;
        }

        let is_heading = line.font_size >= body_size * opts.heading_ratio;

        let breaks_group = match group.last() {
            None => false,
            Some(prev) => {
                let gap = prev.bottom - line.top;
                is_heading != group_is_heading
                    // only lines of similar size belong to one block
                    || (line.font_size - prev.font_size).abs() > 0.5
                    || gap > opts.gap_factor * prev.height()
            }
        };

        if breaks_group {
            flush_group(
                &mut group,
                group_is_heading,
                body_size,
                opts,
                &mut blocks,
                next_order,
            );
        }
        group_is_heading = is_heading;
        group.push(line);
    }
    flush_group(
        &mut group,
        group_is_heading,
        body_size,
        opts,
        &mut blocks,
        next_order,
    );

    blocks
}
