//! Error types for u-datalens.
//!
//! The insight engine itself never fails. Errors come from the record
//! source boundary (reading and decoding raw rows) and from programmatic
//! construction of a [`DataFrame`](crate::dataframe::DataFrame).

use thiserror::Error;

/// All errors produced by u-datalens operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InsightError {
    /// The source decoded to zero data rows.
    #[error("source contains no data rows")]
    EmptyInput,
    /// The source could not be read at all.
    #[error("unreadable source: {0}")]
    UnreadableSource(String),
    /// The source could not be decoded into rectangular rows.
    #[error("malformed source at line {line}: {message}")]
    MalformedSource { line: usize, message: String },
    /// A row does not have the same number of fields as the header.
    #[error("expected {expected} fields, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for InsightError {
    fn from(e: std::io::Error) -> Self {
        Self::UnreadableSource(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            InsightError::EmptyInput.to_string(),
            "source contains no data rows"
        );
        let e = InsightError::MalformedSource {
            line: 3,
            message: "unterminated quote".into(),
        };
        assert_eq!(e.to_string(), "malformed source at line 3: unterminated quote");
        let e = InsightError::DimensionMismatch {
            expected: 2,
            actual: 3,
        };
        assert_eq!(e.to_string(), "expected 2 fields, got 3");
    }

    #[test]
    fn io_error_maps_to_unreadable() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let e: InsightError = io.into();
        assert!(matches!(e, InsightError::UnreadableSource(ref m) if m.contains("no such file")));
    }
}
