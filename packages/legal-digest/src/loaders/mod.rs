//! Document loaders for the supported media kinds.
//!
//! # Available Loaders
//!
//! - `text` - UTF-8 plain text
//! - `csv` - rows flattened to `header: value` lines
//! - `pdf` - page text via pdf-extract (requires `pdf` feature)
//!
//! # Example
//!
//! ```rust,ignore
//! use legal_digest::loaders;
//!
//! let document = loaders::load_path("lease.pdf").await?;
//! let summary = digest.run_summary(&document).await?;
//! ```

mod csv;
mod pdf;
mod text;

use std::path::Path;
use tracing::info;

use crate::error::{LoadError, LoadResult};
use crate::types::document::{Document, MediaKind};

/// Decode `bytes` of the declared `kind` into a document.
pub fn load(bytes: &[u8], kind: MediaKind, source: impl Into<String>) -> LoadResult<Document> {
    let source = source.into();
    let text = match kind {
        MediaKind::PlainText => text::extract(bytes)?,
        MediaKind::Tabular => csv::extract(bytes)?,
        MediaKind::Paginated => pdf::extract(bytes)?,
    };

    info!(source = %source, kind = %kind, chars = text.chars().count(), "Document loaded");
    Ok(Document::new(source, kind, text))
}

/// Read a file and load it, taking the media kind from its extension.
pub async fn load_path(path: impl AsRef<Path>) -> LoadResult<Document> {
    let path = path.as_ref();
    let kind = MediaKind::from_path(path).ok_or_else(|| {
        LoadError::Unsupported(
            path.extension()
                .and_then(|e| e.to_str())
                .unwrap_or("<none>")
                .to_string(),
        )
    })?;

    let bytes = tokio::fs::read(path).await?;
    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    load(&bytes, kind, source)
}
