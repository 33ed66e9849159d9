//! Cell value normalization.
//!
//! Every raw cell token maps to exactly one [`Value`]:
//!
//! | Raw token | Value |
//! |-----------|-------|
//! | `""` | [`Missing`](Value::Missing) |
//! | whole token is a finite number | [`Number`](Value::Number) |
//! | anything else | [`Text`](Value::Text) (original string) |
//!
//! Partial numeric prefixes are text: `"3abc"` stays `Text("3abc")`.
//!
//! ```
//! use u_datalens::value::{normalize_token, Value};
//!
//! assert_eq!(normalize_token(""), Value::Missing);
//! assert_eq!(normalize_token("2.5e3"), Value::Number(2500.0));
//! assert_eq!(normalize_token("N/A"), Value::Text("N/A".into()));
//! ```

use std::fmt;

/// A normalized cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Empty raw token.
    Missing,
    /// Token that parsed completely to a finite `f64`.
    Number(f64),
    /// Any other non-empty token, unmodified.
    Text(String),
}

impl Value {
    /// Returns `true` for [`Value::Missing`].
    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns the number held by a [`Value::Number`].
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Parses a token as a finite number.
///
/// Surrounding ASCII whitespace is ignored; the remainder must parse in
/// full. `NaN` and infinities (including overflow such as `"1e400"`) are
/// rejected.
///
/// ```
/// use u_datalens::value::parse_number;
///
/// assert_eq!(parse_number(" 42 "), Some(42.0));
/// assert_eq!(parse_number("3abc"), None);
/// assert_eq!(parse_number("inf"), None);
/// ```
pub fn parse_number(token: &str) -> Option<f64> {
    let trimmed = token.trim_matches(|c: char| c.is_ascii_whitespace());
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalizes a single raw token.
pub fn normalize_token(token: &str) -> Value {
    if token.is_empty() {
        return Value::Missing;
    }
    match parse_number(token) {
        Some(v) => Value::Number(v),
        None => Value::Text(token.to_string()),
    }
}

/// Normalizes a keyed raw row, preserving key order.
///
/// ```
/// use u_datalens::value::{normalize_row, Value};
///
/// let row = normalize_row([("x", "1"), ("label", "a"), ("note", "")]);
/// assert_eq!(row[0], ("x".to_string(), Value::Number(1.0)));
/// assert_eq!(row[1].1, Value::Text("a".into()));
/// assert!(row[2].1.is_missing());
/// ```
pub fn normalize_row<I, K, V>(row: I) -> Vec<(String, Value)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    row.into_iter()
        .map(|(k, v)| (k.into(), normalize_token(v.as_ref())))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_missing() {
        assert_eq!(normalize_token(""), Value::Missing);
    }

    #[test]
    fn plain_numbers() {
        assert_eq!(normalize_token("1"), Value::Number(1.0));
        assert_eq!(normalize_token("-4.5E-3"), Value::Number(-4.5e-3));
        assert_eq!(normalize_token("+7"), Value::Number(7.0));
        assert_eq!(normalize_token(".5"), Value::Number(0.5));
    }

    #[test]
    fn padded_number_is_numeric() {
        assert_eq!(normalize_token("  12.5\t"), Value::Number(12.5));
    }

    #[test]
    fn partial_prefix_is_text() {
        assert_eq!(normalize_token("3abc"), Value::Text("3abc".into()));
        assert_eq!(normalize_token("1,000"), Value::Text("1,000".into()));
        assert_eq!(normalize_token("12 34"), Value::Text("12 34".into()));
    }

    #[test]
    fn non_finite_is_text() {
        for token in ["NaN", "nan", "inf", "-Infinity", "1e400"] {
            assert_eq!(normalize_token(token), Value::Text(token.into()), "{token}");
        }
    }

    #[test]
    fn whitespace_only_is_text() {
        assert_eq!(normalize_token("   "), Value::Text("   ".into()));
    }

    #[test]
    fn text_keeps_original_string() {
        assert_eq!(normalize_token(" Hello "), Value::Text(" Hello ".into()));
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::Number(2.0).as_number(), Some(2.0));
        assert_eq!(Value::Text("a".into()).as_number(), None);
        assert!(Value::Missing.is_missing());
    }

    #[test]
    fn display() {
        assert_eq!(Value::Missing.to_string(), "");
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(Value::Number(2.0).to_string(), "2");
        assert_eq!(Value::Text("x".into()).to_string(), "x");
    }
}
