//! Tabular Parser
//!
//! Splits captured tool output into rows of fields and decodes typed
//! fields. The tool prints `-` for values that are absent.

use crate::error::{Error, Result};

/// Marker the tool prints for an absent value
pub const ABSENT: &str = "-";

/// Split output into lines of whitespace-separated fields.
///
/// The tool terminates its output with a newline, so a single trailing
/// empty line is dropped.
pub fn split_table(stdout: &str) -> Vec<Vec<String>> {
    lines(stdout)
        .map(|line| line.split_whitespace().map(str::to_string).collect())
        .collect()
}

/// Split output into lines of tab-separated fields, keeping empty fields
pub fn split_records(stdout: &str) -> Vec<Vec<String>> {
    lines(stdout)
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

fn lines(stdout: &str) -> impl Iterator<Item = &str> {
    let body = stdout.strip_suffix('\n').unwrap_or(stdout);
    let empty = stdout.is_empty();
    body.split('\n').filter(move |_| !empty)
}

/// Decode a string field; the absent marker becomes an empty string
pub fn parse_string(value: &str) -> String {
    if value == ABSENT {
        String::new()
    } else {
        value.to_string()
    }
}

/// Decode an unsigned byte count; the absent marker becomes zero
pub fn parse_u64(column: &'static str, value: &str) -> Result<u64> {
    if value == ABSENT {
        return Ok(0);
    }

    let invalid = || Error::InvalidNumber {
        column,
        value: value.to_string(),
    };
    // str::parse alone would take a leading '+'
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    value.parse().map_err(|_| invalid())
}

/// Ensure a row has exactly `expected` fields
pub fn expect_columns(row: &[String], expected: usize) -> Result<()> {
    if row.len() != expected {
        return Err(Error::ColumnMismatch {
            expected,
            found: row.len(),
            line: row.join(" "),
        });
    }
    Ok(())
}
