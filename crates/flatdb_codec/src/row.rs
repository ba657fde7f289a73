//! Flat row format.
//!
//! One row per line, fields separated by commas. Field text is escaped so a
//! row always occupies exactly one physical line:
//!
//! | raw        | escaped |
//! |------------|---------|
//! | `\`        | `\\`    |
//! | `,`        | `\,`    |
//! | newline    | `\n`    |
//! | CR         | `\r`    |
//!
//! The splitter only splits on unescaped commas, so
//! `split_row(&join_row(fields)) == fields` for any field list.

use crate::error::{CodecError, CodecResult};

const SEPARATOR: char = ',';
const ESCAPE: char = '\\';

/// Escapes one field for inclusion in a row.
#[must_use]
pub fn escape_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        match c {
            ESCAPE => out.push_str("\\\\"),
            SEPARATOR => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// Joins fields into one row line (without the trailing newline).
#[must_use]
pub fn join_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Splits one row line into unescaped fields.
///
/// # Errors
///
/// Returns [`CodecError::DanglingEscape`] if the line ends with a lone
/// backslash and [`CodecError::UnknownEscape`] for escapes the writer never
/// produces.
pub fn split_row(line: &str) -> CodecResult<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                Some(ESCAPE) => current.push(ESCAPE),
                Some(SEPARATOR) => current.push(SEPARATOR),
                Some('n') => current.push('\n'),
                Some('r') => current.push('\r'),
                Some(other) => return Err(CodecError::UnknownEscape(other)),
                None => return Err(CodecError::DanglingEscape),
            },
            SEPARATOR => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    fields.push(current);

    Ok(fields)
}

/// Parses the full contents of a backing file into rows.
///
/// Empty lines are skipped. Each returned row is paired with its 1-based
/// line number for error reporting.
pub fn parse_rows(data: &[u8]) -> CodecResult<Vec<(usize, Vec<String>)>> {
    let text = std::str::from_utf8(data).map_err(|_| CodecError::InvalidUtf8)?;
    let mut rows = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        rows.push((idx + 1, split_row(line)?));
    }
    Ok(rows)
}

/// Renders rows into backing file contents. Every row is newline terminated.
#[must_use]
pub fn render_rows(rows: &[Vec<String>]) -> Vec<u8> {
    let mut out = String::new();
    for row in rows {
        out.push_str(&join_row(row));
        out.push('\n');
    }
    out.into_bytes()
}
