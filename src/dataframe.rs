//! Column-major DataFrame of normalized cell values.
//!
//! A [`DataFrame`] holds an ordered list of column names and one
//! [`Column`] of [`Value`]s per name. All columns have the same length.
//! Row order is ingestion order.
//!
//! # Example
//!
//! ```
//! use u_datalens::dataframe::DataFrame;
//! use u_datalens::value::Value;
//!
//! let row = |cells: &[&str]| cells.iter().map(|c| c.to_string()).collect::<Vec<_>>();
//! let df = DataFrame::from_rows(row(&["x", "label"]), &[row(&["1", "a"]), row(&["", "b"])])
//!     .unwrap();
//! assert_eq!(df.row_count(), 2);
//! assert_eq!(df.column(0).unwrap().get(1), Some(&Value::Missing));
//! ```

use tracing::warn;

use crate::error::InsightError;
use crate::value::{normalize_token, Value};

// ── Column ────────────────────────────────────────────────────────────

/// A single column of normalized values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Column {
    values: Vec<Value>,
}

impl Column {
    /// Creates a column from already-normalized values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Creates a column by normalizing raw tokens.
    ///
    /// ```
    /// use u_datalens::dataframe::Column;
    ///
    /// let col = Column::from_tokens(["1", "", "two"]);
    /// assert_eq!(col.missing_count(), 1);
    /// assert_eq!(col.numeric_count(), 1);
    /// ```
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            values: tokens
                .into_iter()
                .map(|t| normalize_token(t.as_ref()))
                .collect(),
        }
    }

    /// Returns the number of rows in this column.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the column has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns all values in row order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the value at `idx`.
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Number of [`Value::Missing`] cells.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    /// Number of non-missing cells (numbers and text).
    pub fn present_count(&self) -> usize {
        self.len() - self.missing_count()
    }

    /// Number of [`Value::Number`] cells.
    pub fn numeric_count(&self) -> usize {
        self.values.iter().filter(|v| v.as_number().is_some()).count()
    }

    /// Returns the numeric cells in row order; missing and text are skipped.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::as_number).collect()
    }

    /// Returns one slot per row: `Some(x)` for numbers, `None` otherwise.
    pub fn numeric_slots(&self) -> Vec<Option<f64>> {
        self.values.iter().map(Value::as_number).collect()
    }

    fn push(&mut self, value: Value) {
        self.values.push(value);
    }
}

impl FromIterator<Value> for Column {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ── DataFrame ─────────────────────────────────────────────────────────

/// Column-major tabular data structure.
///
/// # Example
///
/// ```
/// use u_datalens::dataframe::{Column, DataFrame};
///
/// let mut df = DataFrame::new();
/// df.add_column("x".to_string(), Column::from_tokens(["1", "2", "3"])).unwrap();
/// df.add_column("y".to_string(), Column::from_tokens(["a", "", "c"])).unwrap();
/// assert_eq!(df.row_count(), 3);
/// assert_eq!(df.column_names(), &["x", "y"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    names: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl DataFrame {
    /// Creates an empty DataFrame with no columns or rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a DataFrame from a header and rectangular rows of raw tokens.
    ///
    /// Every row must have exactly `headers.len()` fields.
    pub fn from_rows<R>(headers: Vec<String>, rows: &[R]) -> Result<Self, InsightError>
    where
        R: AsRef<[String]>,
    {
        let n_cols = headers.len();
        let mut columns: Vec<Column> = (0..n_cols)
            .map(|_| Column::new(Vec::with_capacity(rows.len())))
            .collect();

        for row in rows {
            let row = row.as_ref();
            if row.len() != n_cols {
                return Err(InsightError::DimensionMismatch {
                    expected: n_cols,
                    actual: row.len(),
                });
            }
            for (col, token) in columns.iter_mut().zip(row) {
                col.push(normalize_token(token));
            }
        }

        Ok(Self {
            names: headers,
            columns,
            row_count: rows.len(),
        })
    }

    /// Builds a DataFrame from keyed records.
    ///
    /// Column names and their order come from the first record. A later
    /// record that lacks a key contributes [`Value::Missing`] for it; keys
    /// absent from the first record are ignored.
    ///
    /// ```
    /// use u_datalens::dataframe::DataFrame;
    /// use u_datalens::value::Value;
    ///
    /// let df = DataFrame::from_records(vec![
    ///     vec![("a", "1"), ("b", "x")],
    ///     vec![("a", "2")],
    /// ]);
    /// assert_eq!(df.column_names(), &["a", "b"]);
    /// assert_eq!(df.column_by_name("b").unwrap().get(1), Some(&Value::Missing));
    /// ```
    pub fn from_records<I, R, K, V>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut df = Self::new();
        let mut ignored_keys = 0usize;

        for record in records {
            let mut cells: Vec<(String, V)> =
                record.into_iter().map(|(k, v)| (k.into(), v)).collect();

            if df.row_count == 0 {
                df.names = cells.iter().map(|(k, _)| k.clone()).collect();
                df.columns = vec![Column::default(); df.names.len()];
            }

            for (idx, name) in df.names.iter().enumerate() {
                let value = match cells.iter().position(|(k, _)| k == name) {
                    Some(pos) => normalize_token(cells.swap_remove(pos).1.as_ref()),
                    None => Value::Missing,
                };
                df.columns[idx].push(value);
            }
            ignored_keys += cells.len();
            df.row_count += 1;
        }

        if ignored_keys > 0 {
            warn!(ignored_keys, "records carried keys not present in the first record");
        }
        df
    }

    /// Adds a named column to the DataFrame.
    ///
    /// Returns an error if the column length doesn't match the existing
    /// row count (unless this is the first column).
    pub fn add_column(&mut self, name: String, column: Column) -> Result<(), InsightError> {
        let col_len = column.len();
        if self.columns.is_empty() {
            self.row_count = col_len;
        } else if col_len != self.row_count {
            return Err(InsightError::DimensionMismatch {
                expected: self.row_count,
                actual: col_len,
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Returns the number of rows.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns the number of columns.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the DataFrame has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns column names.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Returns a reference to the column at `index`.
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Returns a reference to the column with the given `name`.
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    /// Returns the index of the column with the given `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Returns an iterator over (name, column) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(|s| s.as_str()).zip(self.columns.iter())
    }

    /// Returns the values of row `idx` in column order.
    pub fn row(&self, idx: usize) -> Option<Vec<&Value>> {
        if idx >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[idx]).collect())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
