//! Insight engine entry point.
//!
//! [`compute_insights`] turns a [`DataFrame`] into per-column
//! [`ColumnStats`] and a [`CorrelationMatrix`] over the numeric columns.
//! It is a pure function of its input: no I/O, no shared state, and no
//! failure mode. Data-quality problems show up as `None` fields in the
//! result.
//!
//! ```
//! use u_datalens::dataframe::DataFrame;
//! use u_datalens::insights::compute_insights;
//!
//! let df = DataFrame::from_records(vec![
//!     vec![("x", "1"), ("y", "2")],
//!     vec![("x", "2"), ("y", "4")],
//!     vec![("x", "3"), ("y", "6")],
//! ]);
//! let insights = compute_insights(&df);
//!
//! assert_eq!(insights.stats[0].mean, Some(2.0));
//! assert_eq!(insights.stats[1].max, Some(6.0));
//! assert_eq!(insights.matrix.matrix, vec![vec![Some(1.0); 2]; 2]);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::correlation::{correlation_matrix, CorrelationMatrix};
use crate::dataframe::DataFrame;
use crate::error::InsightError;
use crate::profiling::{profile_dataframe, ColumnStats, DEFAULT_NUMERIC_THRESHOLD};

// ── Configuration ─────────────────────────────────────────────────────

/// Configuration for the insight engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct InsightConfig {
    /// Share of numeric cells (among non-missing cells) a column must
    /// exceed to be treated as numeric. Default: 0.8.
    pub numeric_threshold: f64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            numeric_threshold: DEFAULT_NUMERIC_THRESHOLD,
        }
    }
}

impl InsightConfig {
    /// Creates a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the numeric-share threshold.
    pub fn numeric_threshold(mut self, threshold: f64) -> Self {
        self.numeric_threshold = threshold;
        self
    }

    /// Checks that the threshold lies in `[0, 1)`.
    pub fn validate(&self) -> Result<(), InsightError> {
        let t = self.numeric_threshold;
        if !(0.0..1.0).contains(&t) {
            return Err(InsightError::InvalidConfig(format!(
                "numeric_threshold must be in [0, 1), got {t}"
            )));
        }
        Ok(())
    }

    /// Parses and validates a JSON config. Missing fields take defaults.
    ///
    /// ```
    /// use u_datalens::insights::InsightConfig;
    ///
    /// let config = InsightConfig::from_json(r#"{"numericThreshold": 0.6}"#).unwrap();
    /// assert_eq!(config.numeric_threshold, 0.6);
    /// assert!(InsightConfig::from_json(r#"{"numericThreshold": 1.5}"#).is_err());
    /// ```
    pub fn from_json(json: &str) -> Result<Self, InsightError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| InsightError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

// ── Result ────────────────────────────────────────────────────────────

/// Statistics for every column plus the numeric correlation matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    /// One entry per column, in dataset order.
    pub stats: Vec<ColumnStats>,
    /// Correlations between the numeric columns.
    pub matrix: CorrelationMatrix,
}

impl Insights {
    /// Returns the stats for the column named `name`.
    pub fn column(&self, name: &str) -> Option<&ColumnStats> {
        self.stats.iter().find(|s| s.column == name)
    }

    /// Serializes to the JSON shape consumed by the presentation layer.
    pub fn to_json(&self) -> String {
        // Aggregates and coefficients are always finite, so this cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

// ── Engine ────────────────────────────────────────────────────────────

/// Computes insights with the default configuration.
pub fn compute_insights(df: &DataFrame) -> Insights {
    compute_insights_with(df, &InsightConfig::default())
}

/// Computes insights with an explicit configuration.
///
/// A DataFrame with zero rows yields empty stats and an empty matrix.
#[instrument(skip_all, fields(rows = df.row_count(), columns = df.column_count()))]
pub fn compute_insights_with(df: &DataFrame, config: &InsightConfig) -> Insights {
    if df.row_count() == 0 {
        debug!("no rows, returning empty insights");
        return Insights::default();
    }

    let stats = profile_dataframe(df, config.numeric_threshold);
    let numeric: Vec<usize> = stats
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_numeric)
        .map(|(idx, _)| idx)
        .collect();
    let matrix = correlation_matrix(df, &numeric);

    debug!(numeric_columns = numeric.len(), "computed insights");
    Insights { stats, matrix }
}

// ── Tests ─────────────────────────────────────────────────────────────
