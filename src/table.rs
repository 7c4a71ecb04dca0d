//! Minimal comma-separated table reading and writing.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },
    #[error("line {line}: expected {expected} fields, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Parses a whole comma-separated document into rows of fields.
///
/// Handles quoted fields, doubled quotes and CRLF line endings. Blank lines are skipped.
/// Every row must have as many fields as the first one.
pub fn parse_rows(raw: &str) -> Result<Vec<Vec<String>>, TableError> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quote_line = 0usize;
    let mut line = 1usize;
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(ch);
                }
                _ => field.push(ch),
            }
            continue;
        }
        match ch {
            '"' => {
                in_quotes = true;
                quote_line = line;
            }
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                push_row(&mut rows, std::mem::take(&mut row), line)?;
                line += 1;
            }
            _ => field.push(ch),
        }
    }
    if in_quotes {
        return Err(TableError::UnterminatedQuote { line: quote_line });
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        push_row(&mut rows, row, line)?;
    }
    Ok(rows)
}

fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>, line: usize) -> Result<(), TableError> {
    if row.len() == 1 && row[0].is_empty() {
        return Ok(());
    }
    if let Some(first) = rows.first()
        && first.len() != row.len()
    {
        return Err(TableError::RaggedRow {
            line,
            expected: first.len(),
            found: row.len(),
        });
    }
    rows.push(row);
    Ok(())
}

pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn push_row_line<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    for (idx, value) in fields.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(value.as_ref()));
    }
    out.push('\n');
}

/// Shortest round-trip rendering; non-finite values become empty cells.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}
