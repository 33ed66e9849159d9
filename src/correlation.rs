//! Pairwise Pearson correlation over numeric columns.
//!
//! Missing values are handled with **pairwise complete-case alignment**:
//! each pair of columns uses only the rows where both hold a number, so
//! different pairs may use different rows. A pair whose aligned vectors
//! have zero variance (including zero or one aligned row) has an undefined
//! coefficient, reported as `None` rather than `0`.
//!
//! The diagonal is fixed at `1.0` for every column.
//!
//! ```
//! use u_datalens::correlation::correlation_matrix;
//! use u_datalens::dataframe::DataFrame;
//!
//! let df = DataFrame::from_records(vec![
//!     vec![("a", "1"), ("b", ""), ("c", "10")],
//!     vec![("a", ""), ("b", "2"), ("c", "20")],
//!     vec![("a", "3"), ("b", "4"), ("c", "30")],
//! ]);
//! let m = correlation_matrix(&df, &[0, 1, 2]);
//!
//! assert_eq!(m.get(0, 2), Some(1.0)); // rows 0 and 2
//! assert_eq!(m.get(0, 1), None); // only row 2 aligns
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::dataframe::DataFrame;

// ── Correlation Matrix ────────────────────────────────────────────────

/// Symmetric correlation matrix over the numeric columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Names of the correlated columns, in dataset order.
    pub columns: Vec<String>,
    /// `matrix[i][j]` is the coefficient for `columns[i]` and `columns[j]`,
    /// or `None` when undefined.
    pub matrix: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Number of correlated columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if there are no numeric columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the coefficient at `(i, j)`, or `None` if undefined or out of range.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.matrix.get(i).and_then(|row| row.get(j)).copied().flatten()
    }

    /// Returns the coefficient for two columns by name.
    pub fn get_by_name(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.get(i, j)
    }
}

// ── Computation ───────────────────────────────────────────────────────

/// Computes the pairwise correlation matrix for the given column indices.
///
/// `numeric_columns` lists DataFrame column indices in the order they
/// should appear in the matrix. Indices past the last column are ignored.
pub fn correlation_matrix(df: &DataFrame, numeric_columns: &[usize]) -> CorrelationMatrix {
    let names = df.column_names();
    let selected: Vec<usize> = numeric_columns
        .iter()
        .copied()
        .filter(|&idx| idx < df.column_count())
        .collect();
    let n = selected.len();

    // Per-call cache: column index → one numeric slot per row.
    let mut slots: HashMap<usize, Vec<Option<f64>>> = HashMap::with_capacity(n);
    for &idx in &selected {
        if let Some(col) = df.column(idx) {
            slots.entry(idx).or_insert_with(|| col.numeric_slots());
        }
    }

    let mut matrix = vec![vec![None; n]; n];
    for i in 0..n {
        matrix[i][i] = Some(1.0);
        for j in (i + 1)..n {
            let (x, y) = align_pair(&slots[&selected[i]], &slots[&selected[j]]);
            let r = pearson(&x, &y);
            trace!(
                a = names[selected[i]].as_str(),
                b = names[selected[j]].as_str(),
                aligned = x.len(),
                ?r,
                "correlated pair"
            );
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: selected.iter().map(|&idx| names[idx].clone()).collect(),
        matrix,
    }
}

/// Keeps only the rows where both slots hold a number, in row order.
fn align_pair(a: &[Option<f64>], b: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    a.iter()
        .zip(b)
        .filter_map(|(&x, &y)| Some((x?, y?)))
        .unzip()
}

/// Pearson correlation of two equal-length vectors.
///
/// Returns `None` when the vectors differ in length or when either has
/// zero variance (which includes empty and single-element input).
///
/// ```
/// use u_datalens::correlation::pearson;
///
/// assert_eq!(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]), Some(1.0));
/// assert_eq!(pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]), None);
/// ```
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    let mut sums = CoMoments::of(x, y);
    if !sums.is_finite() {
        // r is scale-invariant; bring magnitudes near f64::MAX back into range.
        sums = CoMoments::of(&unit_scaled(x), &unit_scaled(y));
    }
    let CoMoments {
        numerator,
        sum_sq_x,
        sum_sq_y,
    } = sums;

    if sum_sq_x == 0.0 || sum_sq_y == 0.0 {
        return None;
    }
    // One sqrt keeps exactly linear pairs at ±1; two when the product over/underflows.
    let product = sum_sq_x * sum_sq_y;
    let denominator = if product.is_normal() {
        product.sqrt()
    } else {
        sum_sq_x.sqrt() * sum_sq_y.sqrt()
    };
    let r = numerator / denominator;
    if r.is_finite() {
        Some(r.clamp(-1.0, 1.0))
    } else {
        None
    }
}

/// Centered cross and squared sums of two equal-length vectors.
struct CoMoments {
    numerator: f64,
    sum_sq_x: f64,
    sum_sq_y: f64,
}

impl CoMoments {
    fn of(x: &[f64], y: &[f64]) -> Self {
        let mean_x = u_numflow::stats::mean(x).unwrap_or(0.0);
        let mean_y = u_numflow::stats::mean(y).unwrap_or(0.0);

        let mut sums = Self {
            numerator: 0.0,
            sum_sq_x: 0.0,
            sum_sq_y: 0.0,
        };
        for (&xi, &yi) in x.iter().zip(y) {
            let dx = xi - mean_x;
            let dy = yi - mean_y;
            sums.numerator += dx * dy;
            sums.sum_sq_x += dx * dx;
            sums.sum_sq_y += dy * dy;
        }
        sums
    }

    fn is_finite(&self) -> bool {
        self.numerator.is_finite() && self.sum_sq_x.is_finite() && self.sum_sq_y.is_finite()
    }
}

/// Divides by the largest magnitude so every value lies in `[-1, 1]`.
fn unit_scaled(values: &[f64]) -> Vec<f64> {
    let scale = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if scale == 0.0 {
        return values.to_vec();
    }
    values.iter().map(|v| v / scale).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::Column;

    fn frame(cols: &[(&str, &[&str])]) -> DataFrame {
        let mut df = DataFrame::new();
        for (name, tokens) in cols {
            df.add_column(name.to_string(), Column::from_tokens(tokens.iter()))
                .unwrap();
        }
        df
    }

    // ── pearson ──────────────────────────────────────────────────

    #[test]
    fn pearson_perfect_positive_and_negative() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let up = [2.0, 4.0, 6.0, 8.0, 10.0];
        let down = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert!((pearson(&x, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_known_value() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        // r = 6 / sqrt(10 * 6)
        let expected = 6.0 / (10.0f64 * 6.0).sqrt();
        assert!((pearson(&x, &y).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn pearson_undefined_cases() {
        assert_eq!(pearson(&[], &[]), None);
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0, 2.0], &[1.0]), None);
    }

    #[test]
    fn pearson_uncorrelated_is_zero_not_none() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [1.0, -1.0, -1.0, 1.0];
        assert_eq!(pearson(&x, &y), Some(0.0));
    }

    // ── Matrix ───────────────────────────────────────────────────

    #[test]
    fn pairwise_alignment() {
        let df = frame(&[
            ("A", &["1", "", "3"]),
            ("B", &["", "2", "4"]),
            ("C", &["10", "20", "30"]),
        ]);
        let m = correlation_matrix(&df, &[0, 1, 2]);
        assert_eq!(m.columns, vec!["A", "B", "C"]);
        assert!((m.get(0, 2).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(m.get(0, 1), None);
        // B-C aligns rows 1 and 2
        assert!((m.get(1, 2).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn text_cells_are_excluded_from_pairs() {
        let df = frame(&[
            ("x", &["1", "2", "oops", "4"]),
            ("y", &["1", "2", "100", "4"]),
        ]);
        let m = correlation_matrix(&df, &[0, 1]);
        assert!((m.get(0, 1).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn diagonal_is_one_even_without_numbers() {
        let df = frame(&[("empty", &["", "", ""]), ("x", &["1", "2", "3"])]);
        let m = correlation_matrix(&df, &[0, 1]);
        assert_eq!(m.matrix[0][0], Some(1.0));
        assert_eq!(m.matrix[1][1], Some(1.0));
        assert_eq!(m.matrix[0][1], None);
    }

    #[test]
    fn constant_column_is_undefined_everywhere() {
        let df = frame(&[
            ("k", &["5", "5", "5", "5"]),
            ("x", &["1", "2", "3", "4"]),
            ("y", &["4", "1", "3", "2"]),
        ]);
        let m = correlation_matrix(&df, &[0, 1, 2]);
        assert_eq!(m.get(0, 1), None);
        assert_eq!(m.get(0, 2), None);
        assert_eq!(m.get(1, 0), None);
        assert!(m.get(1, 2).is_some());
    }

    #[test]
    fn matrix_is_symmetric() {
        let df = frame(&[
            ("a", &["1", "5", "2", "", "9"]),
            ("b", &["3", "1", "", "7", "2"]),
            ("c", &["2", "2", "8", "1", "4"]),
        ]);
        let m = correlation_matrix(&df, &[0, 1, 2]);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(m.matrix[i][j], m.matrix[j][i]);
            }
        }
    }

    #[test]
    fn subset_keeps_requested_order() {
        let df = frame(&[
            ("a", &["1", "2"]),
            ("label", &["x", "y"]),
            ("b", &["3", "1"]),
        ]);
        let m = correlation_matrix(&df, &[0, 2]);
        assert_eq!(m.columns, vec!["a", "b"]);
        assert_eq!(m.len(), 2);
        assert!((m.get_by_name("a", "b").unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn no_numeric_columns() {
        let df = frame(&[("label", &["x", "y"])]);
        let m = correlation_matrix(&df, &[]);
        assert!(m.is_empty());
        assert!(m.matrix.is_empty());
    }

    #[test]
    fn out_of_range_index_ignored() {
        let df = frame(&[("a", &["1", "2"])]);
        let m = correlation_matrix(&df, &[0, 7]);
        assert_eq!(m.columns, vec!["a"]);
    }

    #[test]
    fn pearson_survives_magnitudes_near_f64_max() {
        let x = [1e300, 2e300, 3e300, 4e300];
        let y = [-1e200, -2e200, -3e200, -4e200];
        let r = pearson(&x, &y).unwrap();
        assert!((r + 1.0).abs() < 1e-12);

        let df = frame(&[("a", &["1e308", "-1e308", "5e307"]), ("b", &["1", "-1", "0.5"])]);
        let m = correlation_matrix(&df, &[0, 1]);
        assert!((m.get(0, 1).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn serializes_undefined_as_null() {
        let df = frame(&[("k", &["1", "1"]), ("x", &["1", "2"])]);
        let m = correlation_matrix(&df, &[0, 1]);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(
            json,
            r#"{"columns":["k","x"],"matrix":[[1.0,null],[null,1.0]]}"#
        );
    }
}
