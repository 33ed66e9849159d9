//! CSV record source.
//!
//! Reads delimited text into a [`DataFrame`](crate::dataframe::DataFrame)
//! of normalized values. Only the empty token counts as missing; markers
//! such as `NA` or `null` are kept as text so the column-type heuristic
//! can see them.
//!
//! # Features
//!
//! - RFC 4180 quoting (quoted fields, escaped quotes, delimiters and newlines in fields)
//! - `\n`, `\r\n` and bare `\r` line endings
//! - UTF-8 BOM stripped
//! - Blank lines skipped
//! - Configurable delimiter and header row
//!
//! # Example
//!
//! ```
//! use u_datalens::csv_parser::CsvParser;
//! use u_datalens::value::Value;
//!
//! let csv = "name,value\nAlice,1.5\nBob,\n";
//! let df = CsvParser::new().parse_str(csv).unwrap();
//! assert_eq!(df.row_count(), 2);
//! assert_eq!(df.column(1).unwrap().get(0), Some(&Value::Number(1.5)));
//! assert_eq!(df.column(1).unwrap().get(1), Some(&Value::Missing));
//! ```

use tracing::debug;

use crate::dataframe::DataFrame;
use crate::error::InsightError;

/// A raw row together with the physical line it started on.
type RawRow = (usize, Vec<String>);

/// CSV parser configuration and entry point.
#[derive(Debug, Clone)]
pub struct CsvParser {
    delimiter: u8,
    has_header: bool,
}

impl CsvParser {
    /// Creates a parser with default settings (comma delimiter, header row).
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
        }
    }

    /// Sets the field delimiter (default: comma).
    pub fn delimiter(mut self, delim: u8) -> Self {
        self.delimiter = delim;
        self
    }

    /// Sets whether the first row is a header (default: true).
    ///
    /// Without a header, columns are named `col_0`, `col_1`, ...
    pub fn has_header(mut self, header: bool) -> Self {
        self.has_header = header;
        self
    }

    /// Parses CSV text into a DataFrame.
    ///
    /// # Errors
    ///
    /// - [`InsightError::EmptyInput`] if there are no data rows.
    /// - [`InsightError::MalformedSource`] on a field-count mismatch or an
    ///   unterminated quoted field.
    pub fn parse_str(&self, input: &str) -> Result<DataFrame, InsightError> {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);

        let raw_rows = self.parse_raw(input)?;
        if raw_rows.is_empty() {
            return Err(InsightError::EmptyInput);
        }

        let (headers, data_rows) = if self.has_header {
            (raw_rows[0].1.clone(), &raw_rows[1..])
        } else {
            let n_cols = raw_rows[0].1.len();
            let headers: Vec<String> = (0..n_cols).map(|i| format!("col_{i}")).collect();
            (headers, &raw_rows[..])
        };

        if data_rows.is_empty() {
            return Err(InsightError::EmptyInput);
        }

        let n_cols = headers.len();
        if let Some((line, row)) = data_rows.iter().find(|(_, row)| row.len() != n_cols) {
            return Err(InsightError::MalformedSource {
                line: *line,
                message: format!("expected {n_cols} fields, got {}", row.len()),
            });
        }

        let rows: Vec<&Vec<String>> = data_rows.iter().map(|(_, row)| row).collect();
        let df = DataFrame::from_rows(headers, &rows)?;
        debug!(
            rows = df.row_count(),
            columns = df.column_count(),
            "parsed csv"
        );
        Ok(df)
    }

    /// Parses CSV bytes, rejecting invalid UTF-8 as unreadable.
    pub fn parse_bytes(&self, input: &[u8]) -> Result<DataFrame, InsightError> {
        let text = std::str::from_utf8(input)
            .map_err(|e| InsightError::UnreadableSource(format!("invalid UTF-8: {e}")))?;
        self.parse_str(text)
    }

    /// Parses a CSV file from disk into a DataFrame.
    pub fn parse_file(&self, path: impl AsRef<std::path::Path>) -> Result<DataFrame, InsightError> {
        let bytes = std::fs::read(path)?;
        self.parse_bytes(&bytes)
    }

    // ── Internal parsing ─────────────────────────────────────────

    /// Splits raw CSV text into rows of string fields.
    fn parse_raw(&self, input: &str) -> Result<Vec<RawRow>, InsightError> {
        let delim = self.delimiter as char;
        let mut rows: Vec<RawRow> = Vec::new();
        let mut current_row: Vec<String> = Vec::new();
        let mut current_field = String::new();
        let mut in_quotes = false;
        let mut saw_quote = false;
        let mut line_num: usize = 1;
        let mut row_start: usize = 1;
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quotes {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        // Escaped quote ""
                        chars.next();
                        current_field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    if c == '\n' || (c == '\r' && chars.peek() != Some(&'\n')) {
                        line_num += 1;
                    }
                    current_field.push(c);
                }
            } else if c == '"' && current_field.is_empty() {
                in_quotes = true;
                saw_quote = true;
            } else if c == delim {
                current_row.push(std::mem::take(&mut current_field));
            } else if c == '\n' || c == '\r' {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                current_row.push(std::mem::take(&mut current_field));
                finish_row(&mut rows, &mut current_row, row_start, saw_quote);
                saw_quote = false;
                line_num += 1;
                row_start = line_num;
            } else {
                current_field.push(c);
            }
        }

        if in_quotes {
            return Err(InsightError::MalformedSource {
                line: row_start,
                message: "unterminated quoted field".to_string(),
            });
        }

        // Last row without trailing newline
        if !current_field.is_empty() || !current_row.is_empty() || saw_quote {
            current_row.push(current_field);
            finish_row(&mut rows, &mut current_row, row_start, saw_quote);
        }

        Ok(rows)
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Moves a completed row into `rows`, dropping blank lines.
fn finish_row(rows: &mut Vec<RawRow>, row: &mut Vec<String>, line: usize, saw_quote: bool) {
    let blank = !saw_quote && row.len() == 1 && row[0].is_empty();
    if blank {
        row.clear();
    } else {
        rows.push((line, std::mem::take(row)));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
