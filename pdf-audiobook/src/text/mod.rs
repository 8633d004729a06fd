//! Text processing: flattening extracted blocks and chunking for synthesis.

pub mod chunker;
pub mod cleaner;

pub use chunker::{DEFAULT_MAX_CHUNK_CHARS, split_into_chunks};

use crate::pdf::TextBlock;

/// A bounded-length slice of the flattened document text.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// 0-based position; synthesis and concatenation follow this order.
    pub index: usize,
    /// The text content
    pub text: String,
    /// Length in characters
    pub char_count: usize,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(index: usize, text: String) -> Self {
        let char_count = text.chars().count();
        Self {
            index,
            text,
            char_count,
        }
    }
}

/// Render blocks into the single text stream fed to the chunker.
///
/// Headings become a `# `-prefixed line; blocks are separated by a blank
/// line.
pub fn flatten_blocks(blocks: &[TextBlock]) -> String {
    let mut out = String::new();
    for block in blocks {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        if block.is_heading() {
            out.push_str("# ");
        }
        out.push_str(&block.text);
    }
    out
}
