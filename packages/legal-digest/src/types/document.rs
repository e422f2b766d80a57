//! Document types - loaded source text and its media kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// Declared media kind of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// `.txt`, `.md`
    PlainText,

    /// `.csv`
    Tabular,

    /// `.pdf`
    Paginated,
}

impl MediaKind {
    /// Guess the kind from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "text" | "md" => Some(Self::PlainText),
            "csv" => Some(Self::Tabular),
            "pdf" => Some(Self::Paginated),
            _ => None,
        }
    }

    /// Guess the kind from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PlainText => "text",
            Self::Tabular => "csv",
            Self::Paginated => "pdf",
        };
        f.write_str(name)
    }
}

/// A loaded document. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Filename or other source identifier
    pub source: String,

    /// Declared media kind
    pub kind: MediaKind,

    /// Extracted text
    pub text: String,

    /// SHA-256 hash of the text
    pub content_hash: String,

    /// When the document was loaded
    pub loaded_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document.
    pub fn new(source: impl Into<String>, kind: MediaKind, text: impl Into<String>) -> Self {
        let text = text.into();
        let content_hash = Self::hash_content(&text);

        Self {
            source: source.into(),
            kind,
            text,
            content_hash,
            loaded_at: Utc::now(),
        }
    }

    /// Plain-text document, mostly for tests and examples.
    pub fn plain(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(source, MediaKind::PlainText, text)
    }

    /// Calculate SHA-256 hash of content.
    pub fn hash_content(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// True when there is no non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Same source text as `other`.
    pub fn same_content(&self, other: &Document) -> bool {
        self.content_hash == other.content_hash
    }
}
