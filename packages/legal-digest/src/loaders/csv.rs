//! Minimal RFC 4180 reader.
//!
//! Each data row becomes one `header: value` line per non-empty cell; rows
//! are separated by a blank line.

use crate::error::{LoadError, LoadResult};
use crate::loaders::text;

pub(super) fn extract(bytes: &[u8]) -> LoadResult<String> {
    let content = text::extract(bytes)?;
    let mut rows = parse(&content)?.into_iter();

    let Some(headers) = rows.next() else {
        return Ok(String::new());
    };

    let records: Vec<String> = rows
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|row| {
            row.iter()
                .enumerate()
                .filter(|(_, cell)| !cell.trim().is_empty())
                .map(|(i, cell)| {
                    let header = headers
                        .get(i)
                        .map(|h| h.trim().to_string())
                        .filter(|h| !h.is_empty())
                        .unwrap_or_else(|| format!("column {}", i + 1));
                    format!("{}: {}", header, cell.trim())
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect();

    Ok(records.join("\n\n"))
}

fn malformed(reason: impl Into<String>) -> LoadError {
    LoadError::Malformed {
        kind: "csv".into(),
        reason: reason.into(),
    }
}

/// Split into rows of cells, honouring quoted fields.
fn parse(content: &str) -> LoadResult<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => in_quotes = false,
                _ => cell.push(c),
            }
            continue;
        }

        match c {
            '"' if cell.is_empty() => in_quotes = true,
            ',' => row.push(std::mem::take(&mut cell)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut cell));
                rows.push(std::mem::take(&mut row));
            }
            _ => cell.push(c),
        }
    }

    if in_quotes {
        return Err(malformed(format!(
            "unterminated quoted field in row {}",
            rows.len() + 1
        )));
    }
    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }

    Ok(rows)
}
