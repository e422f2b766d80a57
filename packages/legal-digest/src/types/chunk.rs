//! Chunk type - one bounded, overlapping slice of a document.

use serde::{Deserialize, Serialize};

/// An ordered slice of document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the chunk sequence, starting at 0
    pub index: usize,

    /// Character offset of the first character in the document
    pub start: usize,

    /// Chunk text
    pub text: String,
}

impl Chunk {
    pub fn new(index: usize, start: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            text: text.into(),
        }
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Character offset one past the last character.
    pub fn end(&self) -> usize {
        self.start + self.char_len()
    }

    /// The part of this chunk not repeated from its predecessor.
    ///
    /// `prev_end` is the end offset of the previous chunk (0 for the first).
    pub fn fresh_text(&self, prev_end: usize) -> &str {
        let skip = prev_end.saturating_sub(self.start);
        match self.text.char_indices().nth(skip) {
            Some((byte, _)) => &self.text[byte..],
            None => "",
        }
    }
}

/// Rebuild the source text from an ordered chunk sequence.
pub fn reassemble(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    let mut prev_end = 0;
    for chunk in chunks {
        out.push_str(chunk.fresh_text(prev_end));
        prev_end = chunk.end();
    }
    out
}
