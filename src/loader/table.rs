//! Header-less delimited numeric tables.
//!
//! One table row per non-blank line. The delimiter is detected once per
//! table from the first data line: tab, then comma, then semicolon, and
//! finally runs of whitespace. Empty fields read as NaN.

use std::path::Path;

use thiserror::Error;

/// Failure to read a numeric table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read table {path:?}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}, field {field}: '{text}' is not a number")]
    Parse {
        line: usize,
        field: usize,
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Char(char),
    Whitespace,
}

impl Delimiter {
    fn detect(line: &str) -> Self {
        ['\t', ',', ';']
            .into_iter()
            .find(|&c| line.contains(c))
            .map_or(Self::Whitespace, Self::Char)
    }

    fn split<'a>(self, line: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        match self {
            Self::Char(c) => Box::new(line.split(c)),
            Self::Whitespace => Box::new(line.split_whitespace()),
        }
    }
}

/// Reads a table file. Rows may still be ragged; shape is checked on assembly.
pub fn read_table(path: &Path) -> Result<Vec<Vec<f64>>, TableError> {
    let text = std::fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(&text)
}

/// Parses table text into rows of values.
pub fn parse_table(text: &str) -> Result<Vec<Vec<f64>>, TableError> {
    let mut delimiter = None;
    let mut rows = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let delim = *delimiter.get_or_insert_with(|| Delimiter::detect(line));

        let row = delim
            .split(line)
            .enumerate()
            .map(|(field, text)| parse_value(text).ok_or_else(|| TableError::Parse {
                line: idx + 1,
                field: field + 1,
                text: text.trim().to_string(),
            }))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }

    Ok(rows)
}

fn parse_value(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(f64::NAN);
    }
    text.parse::<f64>().ok()
}
