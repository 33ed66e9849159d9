//! Column type inference and per-column descriptive statistics.
//!
//! Profiling tolerates dirty data: missing cells are counted, stray text
//! in a mostly-numeric column is ignored by the numeric aggregates, and no
//! input makes it fail.
//!
//! # Numeric inference
//!
//! A column is numeric when it holds at least one number and the share of
//! numbers among its non-missing cells is **strictly greater** than the
//! threshold (default [`DEFAULT_NUMERIC_THRESHOLD`] = 0.8). A column with
//! no non-missing cells is never numeric.
//!
//! # Example
//!
//! ```
//! use u_datalens::csv_parser::CsvParser;
//! use u_datalens::profiling::{profile_dataframe, DEFAULT_NUMERIC_THRESHOLD};
//!
//! let csv = "temp,status\n20.5,OK\n21.5,OK\n,FAIL\n19.5,OK\n";
//! let df = CsvParser::new().parse_str(csv).unwrap();
//! let stats = profile_dataframe(&df, DEFAULT_NUMERIC_THRESHOLD);
//!
//! assert_eq!(stats[0].missing, 1);
//! assert!(stats[0].is_numeric);
//! assert_eq!(stats[0].mean, Some(20.5));
//! assert_eq!(stats[1].unique, Some(2));
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataframe::{Column, DataFrame};
use crate::value::Value;

/// Default share of numeric cells a column must exceed to be numeric.
pub const DEFAULT_NUMERIC_THRESHOLD: f64 = 0.8;

// ── Column Stats ──────────────────────────────────────────────────────

/// Summary statistics for one column.
///
/// Numeric columns with at least one number carry `mean`, `std_dev`, `min`
/// and `max`; every other column carries `unique`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStats {
    /// Column name.
    pub column: String,
    /// Number of rows in the dataset.
    pub count: usize,
    /// Number of missing (empty) cells.
    pub missing: usize,
    /// Whether the column was inferred as numeric.
    pub is_numeric: bool,
    /// Arithmetic mean of the numeric cells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    /// Sample standard deviation (divisor n-1; 0 for a single value).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
    /// Smallest numeric cell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Largest numeric cell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Number of distinct non-missing values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<usize>,
}

// ── Profiling functions ───────────────────────────────────────────────

/// Profiles all columns in a DataFrame.
///
/// Returns one [`ColumnStats`] per column, in the same order as the
/// DataFrame's columns.
pub fn profile_dataframe(df: &DataFrame, numeric_threshold: f64) -> Vec<ColumnStats> {
    df.iter()
        .map(|(name, col)| profile_column(name, col, numeric_threshold))
        .collect()
}

/// Profiles a single column.
///
/// ```
/// use u_datalens::dataframe::Column;
/// use u_datalens::profiling::profile_column;
///
/// // 9 numbers, 1 stray token: 0.9 > 0.8
/// let col = Column::from_tokens(["1", "2", "3", "4", "5", "6", "7", "8", "9", "N/A"]);
/// let stats = profile_column("x", &col, 0.8);
/// assert!(stats.is_numeric);
/// assert_eq!(stats.max, Some(9.0));
/// ```
pub fn profile_column(name: &str, col: &Column, numeric_threshold: f64) -> ColumnStats {
    let count = col.len();
    let missing = col.missing_count();
    let present = count - missing;
    let numbers = col.numeric_values();
    let is_numeric = is_numeric_column(numbers.len(), present, numeric_threshold);

    debug!(
        column = name,
        numeric = numbers.len(),
        present,
        is_numeric,
        "inferred column type"
    );

    let mut stats = ColumnStats {
        column: name.to_string(),
        count,
        missing,
        is_numeric,
        mean: None,
        std_dev: None,
        min: None,
        max: None,
        unique: None,
    };

    if is_numeric && !numbers.is_empty() {
        let summary = summarize_numbers(&numbers);
        stats.mean = Some(summary.mean);
        stats.std_dev = Some(summary.std_dev);
        stats.min = Some(summary.min);
        stats.max = Some(summary.max);
    } else {
        stats.unique = Some(distinct_count(col.values()));
    }

    stats
}

/// Applies the numeric-share heuristic.
///
/// ```
/// use u_datalens::profiling::is_numeric_column;
///
/// assert!(is_numeric_column(9, 10, 0.8));
/// assert!(!is_numeric_column(8, 10, 0.8));
/// assert!(!is_numeric_column(0, 0, 0.8));
/// ```
pub fn is_numeric_column(numeric_count: usize, present_count: usize, threshold: f64) -> bool {
    if numeric_count == 0 || present_count == 0 {
        return false;
    }
    numeric_count as f64 / present_count as f64 > threshold
}

// ── Internal helpers ──────────────────────────────────────────────────

struct NumberSummary {
    mean: f64,
    std_dev: f64,
    min: f64,
    max: f64,
}

/// Aggregates a non-empty slice of finite numbers.
///
/// Sums that overflow near `f64::MAX` are recomputed on values scaled into
/// `[-1, 1]`. A standard deviation beyond `f64::MAX` saturates there.
fn summarize_numbers(values: &[f64]) -> NumberSummary {
    let min = u_numflow::stats::min(values).unwrap_or(0.0);
    let max = u_numflow::stats::max(values).unwrap_or(0.0);
    let mut mean = mean_of(values);
    let mut std_dev = std_dev_of(values);

    let scale = min.abs().max(max.abs());
    if (!mean.is_finite() || !std_dev.is_finite()) && scale > 0.0 {
        let scaled: Vec<f64> = values.iter().map(|v| v / scale).collect();
        mean = mean_of(&scaled) * scale;
        std_dev = (std_dev_of(&scaled) * scale).min(f64::MAX);
    }

    NumberSummary {
        mean,
        std_dev,
        min,
        max,
    }
}

fn mean_of(values: &[f64]) -> f64 {
    u_numflow::stats::mean(values).unwrap_or(0.0)
}

fn std_dev_of(values: &[f64]) -> f64 {
    if values.len() < 2 {
        0.0
    } else {
        u_numflow::stats::std_dev(values).unwrap_or(0.0)
    }
}

/// Identity of a non-missing cell for distinct counting.
#[derive(PartialEq, Eq, Hash)]
enum DistinctKey<'a> {
    Number(u64),
    Text(&'a str),
}

/// Counts distinct non-missing values by exact equality.
///
/// Numbers compare by value (`0` and `-0` are the same); text compares
/// byte-for-byte.
fn distinct_count(values: &[Value]) -> usize {
    let mut seen: HashSet<DistinctKey<'_>> = HashSet::new();
    for value in values {
        match value {
            Value::Missing => {}
            Value::Number(v) => {
                let v = if *v == 0.0 { 0.0 } else { *v };
                seen.insert(DistinctKey::Number(v.to_bits()));
            }
            Value::Text(s) => {
                seen.insert(DistinctKey::Text(s));
            }
        }
    }
    seen.len()
}

// ── Tests ─────────────────────────────────────────────────────────────
