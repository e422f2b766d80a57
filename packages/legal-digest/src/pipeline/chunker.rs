//! Fixed-window character chunker.
//!
//! Splits text into windows of at most `max_size` characters, each starting
//! `max_size - overlap` characters after the previous one, so the last
//! `overlap` characters of a chunk open the next. Boundaries ignore words
//! and sentences; sizes count characters, never bytes.
//!
//! # Example
//!
//! ```rust
//! use legal_digest::pipeline::chunker::split;
//!
//! let chunks = split("abcdefghij", 4, 1).unwrap();
//! let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
//! assert_eq!(texts, ["abcd", "defg", "ghij"]);
//! ```

use crate::error::{DigestError, Result};
use crate::types::{chunk::Chunk, config::PipelineConfig, document::Document};

/// Split `text` into overlapping chunks.
///
/// # Guarantees
///
/// - Empty text yields no chunks.
/// - Every chunk except the last is exactly `max_size` characters.
/// - Chunk `i + 1` starts with the last `overlap` characters of chunk `i`.
/// - No chunk lies entirely inside its predecessor.
pub fn split(text: &str, max_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    if max_size == 0 || overlap >= max_size {
        return Err(DigestError::invalid_config(format!(
            "max_size must be greater than overlap (got {} and {})",
            max_size, overlap
        )));
    }

    let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let total = offsets.len();
    let byte_at = |char_pos: usize| offsets.get(char_pos).copied().unwrap_or(text.len());

    let step = max_size - overlap;
    let mut chunks = Vec::with_capacity(total / step + 1);
    let mut start = 0;

    while start < total {
        let end = (start + max_size).min(total);
        chunks.push(Chunk::new(
            chunks.len(),
            start,
            &text[byte_at(start)..byte_at(end)],
        ));
        if end == total {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

/// Split a document with the configured chunk size and overlap.
pub fn split_document(document: &Document, config: &PipelineConfig) -> Result<Vec<Chunk>> {
    split(&document.text, config.chunk_size, config.chunk_overlap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::chunk::reassemble;
    use proptest::prelude::*;

    #[test]
    fn test_empty_text() {
        assert!(split("", 800, 100).unwrap().is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = split("short", 800, 100).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short");
        assert_eq!(chunks[0].start, 0);
    }

    #[test]
    fn test_exact_fit_has_no_trailing_chunk() {
        let text = "x".repeat(800);
        assert_eq!(split(&text, 800, 100).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(split("abc", 0, 0).is_err());
        assert!(split("abc", 10, 10).is_err());
        assert!(split("abc", 10, 11).is_err());
    }

    #[test]
    fn test_zero_overlap_partitions() {
        let chunks = split("abcdefg", 3, 0).unwrap();
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["abc", "def", "g"]);
    }

    #[test]
    fn test_multibyte_boundaries() {
        let text = "§ä€😀".repeat(10);
        let chunks = split(&text, 7, 2).unwrap();

        assert!(chunks.iter().all(|c| c.char_len() <= 7));
        assert_eq!(reassemble(&chunks), text);
    }

    #[test]
    fn test_indices_are_contiguous() {
        let chunks = split(&"y".repeat(5000), 800, 100).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.start, i * 700);
        }
    }

    proptest! {
        #[test]
        fn prop_reassembly_is_lossless(text in "\\PC{0,600}", size in 2usize..120, overlap_frac in 0usize..100) {
            let overlap = (size - 1) * overlap_frac / 100;
            let chunks = split(&text, size, overlap).unwrap();
            prop_assert_eq!(reassemble(&chunks), text);
        }

        #[test]
        fn prop_adjacent_chunks_share_overlap(text in "[a-z ]{0,600}", size in 2usize..120, overlap_frac in 0usize..100) {
            let overlap = (size - 1) * overlap_frac / 100;
            let chunks = split(&text, size, overlap).unwrap();
            for pair in chunks.windows(2) {
                let prev: Vec<char> = pair[0].text.chars().collect();
                let next: Vec<char> = pair[1].text.chars().collect();
                prop_assert_eq!(prev.len(), size);
                prop_assert_eq!(&prev[size - overlap..], &next[..overlap]);
            }
        }
    }
}
