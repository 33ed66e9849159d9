//! # u-datalens
//!
//! Column statistics and correlation insights for raw tabular data, with
//! C FFI bindings.
//!
//! u-datalens turns rows of raw text cells into a statistical summary
//! suitable for driving tables, heatmaps and question answering:
//!
//! - **Normalization** — every cell becomes missing, a number, or text
//! - **Profiling** — per-column counts, numeric inference, mean / std-dev / min / max or distinct count
//! - **Correlation** — Pearson matrix over the numeric columns with pairwise complete-case alignment
//!
//! The engine is a pure, synchronous function of its input. Failures only
//! happen at the record source (reading and decoding CSV).
//!
//! ## Modules
//!
//! - [`value`] — Cell normalization (`Missing` / `Number` / `Text`)
//! - [`dataframe`] — Column-major table of normalized values
//! - [`csv_parser`] — CSV record source
//! - [`profiling`] — Numeric inference and [`ColumnStats`](profiling::ColumnStats)
//! - [`correlation`] — Pairwise Pearson [`CorrelationMatrix`](correlation::CorrelationMatrix)
//! - [`insights`] — [`compute_insights`](insights::compute_insights) entry point and configuration
//! - [`summary`] — Dataset summaries for an external question-answering service
//! - [`ffi`] — C FFI bindings (opaque handle, JSON export, auto-generated C header via cbindgen)
//! - [`error`] — Error types
//!
//! ## Quick Start
//!
//! ```
//! use u_datalens::csv_parser::CsvParser;
//! use u_datalens::insights::compute_insights;
//!
//! let csv = "height,weight,team\n170,65,red\n180,80,blue\n,72,red\n175,N/A,blue\n";
//! let df = CsvParser::new().parse_str(csv).unwrap();
//! let insights = compute_insights(&df);
//!
//! let height = &insights.stats[0];
//! assert_eq!(height.missing, 1);
//! assert!(height.is_numeric);
//!
//! // weight: 3 numbers out of 4 present cells = 0.75, not above 0.8
//! assert!(!insights.stats[1].is_numeric);
//! assert_eq!(insights.matrix.columns, vec!["height"]);
//! ```

pub mod correlation;
pub mod csv_parser;
pub mod dataframe;
pub mod error;
pub mod ffi;
pub mod insights;
pub mod profiling;
pub mod summary;
pub mod value;

pub use error::InsightError;
pub use insights::{compute_insights, compute_insights_with, InsightConfig, Insights};
