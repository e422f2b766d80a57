use crate::error::{LoadError, LoadResult};

const BOM: char = '\u{feff}';

/// Decode UTF-8, dropping a leading byte-order mark.
pub(super) fn extract(bytes: &[u8]) -> LoadResult<String> {
    let text = std::str::from_utf8(bytes).map_err(|e| LoadError::Malformed {
        kind: "text".into(),
        reason: e.to_string(),
    })?;
    Ok(text.strip_prefix(BOM).unwrap_or(text).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_bom() {
        assert_eq!(extract("\u{feff}Clause 1".as_bytes()).unwrap(), "Clause 1");
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        assert!(matches!(
            extract(&[0x66, 0xff, 0xfe]),
            Err(LoadError::Malformed { .. })
        ));
    }
}
