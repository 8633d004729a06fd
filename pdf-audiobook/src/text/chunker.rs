//! Bounded chunking of the flattened text stream.
//!
//! Chunks are direct slices of the input: concatenating them in index order
//! reproduces the flattened text exactly, so nothing the extractor produced
//! is dropped or duplicated on its way to synthesis.

use super::Chunk;
use crate::error::PipelineError;

/// Default maximum chunk size in characters.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 4_500;

/// Split text into chunks of at most `max_chars` characters.
///
/// Each chunk closes at the best available break point at or before the
/// limit, in preference order: paragraph boundary, sentence-ending
/// punctuation, any whitespace, hard cut.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Result<Vec<Chunk>, PipelineError> {
    if max_chars == 0 {
        return Err(PipelineError::Config(
            "maximum chunk size must be at least 1 character".to_string(),
        ));
    }

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let total = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < total {
        let end = if total - start <= max_chars {
            total
        } else {
            find_break(&chars, start, start + max_chars)
        };

        let byte_start = chars[start].0;
        let byte_end = if end == total { text.len() } else { chars[end].0 };
        chunks.push(Chunk::new(chunks.len(), text[byte_start..byte_end].to_string()));

        start = end;
    }

    Ok(chunks)
}

/// Best break position in `(start, limit]`, as a char index one past the
/// last character of the closing chunk. `limit` is always < `chars.len()`.
fn find_break(chars: &[(usize, char)], start: usize, limit: usize) -> usize {
    // Paragraph boundary: break just after the last blank line in the
    // window, keeping the separator with the text it follows.
    let mut i = limit;
    while i >= start + 2 {
        if chars[i - 1].1 == '\n' && chars[i - 2].1 == '\n' {
            return i;
        }
        i -= 1;
    }

    // Sentence end: punctuation followed by whitespace. Trailing whitespace
    // rides along with the closing chunk, up to the limit.
    let mut i = limit;
    while i > start + 1 {
        let c = chars[i - 1].1;
        if matches!(c, '.' | '!' | '?') && chars[i].1.is_whitespace() {
            return consume_whitespace(chars, i, limit);
        }
        i -= 1;
    }

    // Any whitespace.
    let mut i = limit;
    while i > start {
        if chars[i - 1].1.is_whitespace() {
            return i;
        }
        i -= 1;
    }

    // Hard cut at the limit.
    limit
}

/// Extend a break point over a whitespace run, capped at `limit`.
fn consume_whitespace(chars: &[(usize, char)], mut i: usize, limit: usize) -> usize {
    while i < limit && chars[i].1.is_whitespace() {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn join(chunks: &[Chunk]) -> String {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = split_into_chunks("Hello world. How are you?", 4500).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello world. How are you?");
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let chunks = split_into_chunks("", 4500).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_zero_max_is_a_configuration_error() {
        let err = split_into_chunks("text", 0).unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn test_prefers_paragraph_boundary() {
        let text = "First paragraph.\n\nSecond paragraph that keeps going for a while.";
        let chunks = split_into_chunks(text, 40).unwrap();
        assert_eq!(chunks[0].text, "First paragraph.\n\n");
        assert_eq!(join(&chunks), text);
    }

    #[test]
    fn test_falls_back_to_sentence_end() {
        let text = "One sentence here. Another sentence there. And a third one.";
        let chunks = split_into_chunks(text, 30).unwrap();
        assert_eq!(chunks[0].text, "One sentence here. ");
        assert_eq!(join(&chunks), text);
    }

    #[test]
    fn test_falls_back_to_whitespace() {
        let text = "no sentence punctuation in this stretch of words at all";
        let chunks = split_into_chunks(text, 20).unwrap();
        assert!(chunks.len() > 1);
        assert!(chunks[0].text.ends_with(' '));
        assert_eq!(join(&chunks), text);
    }

    #[test]
    fn test_hard_cut_without_any_break_point() {
        let text = "a".repeat(25);
        let chunks = split_into_chunks(&text, 10).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].char_count, 10);
        assert_eq!(chunks[2].char_count, 5);
        assert_eq!(join(&chunks), text);
    }

    #[test]
    fn test_indices_are_sequential() {
        let text = "word ".repeat(100);
        let chunks = split_into_chunks(&text, 30).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn test_multibyte_text_respects_char_limit() {
        let text = "héllo wörld ".repeat(40);
        let chunks = split_into_chunks(&text, 50).unwrap();
        for chunk in &chunks {
            assert!(chunk.char_count <= 50);
            assert!(chunk.char_count > 0);
        }
        assert_eq!(join(&chunks), text);
    }

    #[test]
    fn test_two_page_preview_scenario() {
        // 6000 chars of paragraphs at the default limit must give exactly
        // two chunks, the first closing on a boundary.
        let paragraph = format!("{}.", "x".repeat(199));
        let text = std::iter::repeat(paragraph)
            .take(30)
            .collect::<Vec<_>>()
            .join("\n\n");
        assert_eq!(text.chars().count(), 6000 + 58);

        let chunks = split_into_chunks(&text, DEFAULT_MAX_CHUNK_CHARS).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].char_count <= DEFAULT_MAX_CHUNK_CHARS);
        assert!(chunks[0].text.ends_with("\n\n"));
        assert_eq!(join(&chunks), text);
    }

    proptest! {
        #[test]
        fn prop_chunks_reassemble_exactly(
            text in proptest::collection::vec(any::<char>(), 0..600).prop_map(String::from_iter),
            max in 1usize..200,
        ) {
            let chunks = split_into_chunks(&text, max).unwrap();
            prop_assert_eq!(join(&chunks), text);
        }

        #[test]
        fn prop_chunks_respect_bound(
            text in "[ -~\\n]{0,600}",
            max in 1usize..100,
        ) {
            let chunks = split_into_chunks(&text, max).unwrap();
            for chunk in &chunks {
                prop_assert!(chunk.char_count > 0);
                prop_assert!(chunk.char_count <= max);
            }
        }
    }
}
