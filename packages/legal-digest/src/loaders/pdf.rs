use crate::error::{LoadError, LoadResult};

/// Extract the text of every page.
#[cfg(feature = "pdf")]
pub(super) fn extract(bytes: &[u8]) -> LoadResult<String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| LoadError::Malformed {
        kind: "pdf".into(),
        reason: e.to_string(),
    })
}

#[cfg(not(feature = "pdf"))]
pub(super) fn extract(_bytes: &[u8]) -> LoadResult<String> {
    Err(LoadError::Unsupported(
        "pdf (built without the `pdf` feature)".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "pdf")]
    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            extract(b"not a pdf"),
            Err(LoadError::Malformed { .. })
        ));
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn test_unsupported_without_feature() {
        assert!(matches!(extract(b"%PDF-1.4"), Err(LoadError::Unsupported(_))));
    }
}
