//! Compact dataset summaries for an external question-answering service.
//!
//! The service itself is out of scope; this module only builds the text it
//! receives: row and column counts, the header list, and the first few
//! rows re-encoded as CSV.
//!
//! ```
//! use u_datalens::csv_parser::CsvParser;
//! use u_datalens::summary::dataset_summary;
//!
//! let df = CsvParser::new().parse_str("city,pop\nOslo,0.7\n\"Rome, IT\",2.8\n").unwrap();
//! let text = dataset_summary(&df, 5);
//!
//! assert!(text.starts_with("The dataset has 2 rows and 2 columns."));
//! assert!(text.contains("\"Rome, IT\",\"2.8\""));
//! ```

use std::fmt::Write;

use crate::dataframe::DataFrame;
use crate::value::Value;

/// Number of sample rows included by [`question_prompt`].
pub const DEFAULT_SAMPLE_ROWS: usize = 5;

/// Instructions for the answering service, sent once per conversation.
pub const SYSTEM_INSTRUCTION: &str = "\
You are a data analyst answering questions about a tabular dataset.
- A summary with the column headers and a few sample rows comes first, then the question.
- Base every answer only on the data provided; never invent values.
- If the data cannot answer the question, say so plainly.
- Keep answers short and clear, formatted as Markdown.
- Wrap column names in backticks, like `column_name`.";

/// Builds the textual summary of `df`, including up to `sample_rows` rows.
pub fn dataset_summary(df: &DataFrame, sample_rows: usize) -> String {
    if df.row_count() == 0 {
        return "The dataset is empty.".to_string();
    }

    let shown = sample_rows.min(df.row_count());
    let mut out = String::new();
    // Writing to a String is infallible.
    let _ = writeln!(
        out,
        "The dataset has {} rows and {} columns.",
        df.row_count(),
        df.column_count()
    );
    let _ = writeln!(out, "Column headers: {}", df.column_names().join(", "));
    out.push('\n');
    let _ = writeln!(out, "First {shown} rows:");
    for idx in 0..shown {
        if let Some(row) = df.row(idx) {
            let line: Vec<String> = row.into_iter().map(csv_cell).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
    }
    out.push('\n');
    out
}

/// Builds the full prompt for one question: summary followed by the question.
///
/// ```
/// use u_datalens::dataframe::DataFrame;
/// use u_datalens::summary::question_prompt;
///
/// let df = DataFrame::from_records(vec![vec![("a", "1")]]);
/// let prompt = question_prompt(&df, "What is the mean of a?");
/// assert!(prompt.ends_with("Question: \"What is the mean of a?\""));
/// ```
pub fn question_prompt(df: &DataFrame, question: &str) -> String {
    let mut prompt = dataset_summary(df, DEFAULT_SAMPLE_ROWS);
    let _ = write!(prompt, "Question: \"{question}\"");
    prompt
}

/// Encodes one cell: missing cells are empty, everything else is quoted.
fn csv_cell(value: &Value) -> String {
    match value {
        Value::Missing => String::new(),
        other => format!("\"{}\"", other.to_string().replace('"', "\"\"")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_parser::CsvParser;

    #[test]
    fn summary_layout() {
        let df = CsvParser::new().parse_str("a,b\n1,x\n,y\n").unwrap();
        let text = dataset_summary(&df, 5);
        assert_eq!(
            text,
            "The dataset has 2 rows and 2 columns.\n\
             Column headers: a, b\n\
             \n\
             First 2 rows:\n\
             \"1\",\"x\"\n\
             ,\"y\"\n\
             \n"
        );
    }

    #[test]
    fn sample_is_truncated() {
        let csv = "n\n1\n2\n3\n4\n5\n6\n7\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let text = dataset_summary(&df, DEFAULT_SAMPLE_ROWS);
        assert!(text.contains("First 5 rows:"));
        assert!(text.contains("\"5\"\n"));
        assert!(!text.contains("\"6\""));
    }

    #[test]
    fn quotes_are_escaped() {
        let df = CsvParser::new()
            .parse_str("q\n\"say \"\"hi\"\"\"\n")
            .unwrap();
        assert!(dataset_summary(&df, 1).contains("\"say \"\"hi\"\"\""));
    }

    #[test]
    fn numbers_render_normalized() {
        let df = CsvParser::new().parse_str("v\n1.50\n2.0\n").unwrap();
        let text = dataset_summary(&df, 2);
        assert!(text.contains("\"1.5\"\n\"2\"\n"));
    }

    #[test]
    fn empty_dataset() {
        assert_eq!(dataset_summary(&DataFrame::new(), 5), "The dataset is empty.");
    }

    #[test]
    fn prompt_appends_question() {
        let df = CsvParser::new().parse_str("a\n1\n").unwrap();
        let prompt = question_prompt(&df, "How many rows?");
        assert!(prompt.starts_with("The dataset has 1 rows and 1 columns."));
        assert!(prompt.ends_with("\n\nQuestion: \"How many rows?\""));
    }

    #[test]
    fn system_instruction_mentions_backticks() {
        assert!(SYSTEM_INSTRUCTION.contains("`column_name`"));
    }
}
