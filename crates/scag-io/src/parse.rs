//! Delimited-text dataset parsing.
//!
//! The first non-blank, non-comment record holds the variable labels;
//! every following record holds one sample per variable. The separator
//! is picked from the label record: comma if it has one, else tab, else
//! runs of whitespace.
//!
//! Empty fields and the tokens `NA`, `NaN` and `?` (case-insensitive)
//! are missing values and parse to `f64::NAN`. Lines starting with `#`
//! are skipped.

use scag_pipeline::Dataset;

use crate::DatasetError;

/// Field separator of a dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Comma,
    Tab,
    Whitespace,
}

impl Separator {
    /// Pick the separator used by a label record.
    #[must_use]
    pub fn detect(header: &str) -> Self {
        if header.contains(',') {
            Self::Comma
        } else if header.contains('\t') {
            Self::Tab
        } else {
            Self::Whitespace
        }
    }

    /// Split one record into trimmed fields.
    #[must_use]
    pub fn split(self, line: &str) -> Vec<&str> {
        match self {
            Self::Comma => line.split(',').map(str::trim).collect(),
            Self::Tab => line.split('\t').map(str::trim).collect(),
            Self::Whitespace => line.split_whitespace().collect(),
        }
    }
}

/// Whether a token stands for a missing value.
fn is_missing(token: &str) -> bool {
    token.is_empty()
        || token == "?"
        || token.eq_ignore_ascii_case("na")
        || token.eq_ignore_ascii_case("nan")
}

fn unquote(label: &str) -> &str {
    label
        .strip_prefix('"')
        .and_then(|l| l.strip_suffix('"'))
        .unwrap_or(label)
}

/// Parse one sample field.
fn parse_value(token: &str, line: usize, column: usize) -> Result<f64, DatasetError> {
    let token = unquote(token);
    if is_missing(token) {
        return Ok(f64::NAN);
    }
    token
        .parse::<f64>()
        .map_err(|_| DatasetError::NonNumeric {
            line,
            column,
            token: token.to_owned(),
        })
}

/// Parse a dataset from delimited text.
///
/// # Errors
///
/// Returns [`DatasetError::NoHeader`] when the text has no label record,
/// [`DatasetError::Ragged`] for a record with the wrong number of fields
/// and [`DatasetError::NonNumeric`] for a field that is neither a number
/// nor a missing-value token. Line numbers are 1-based.
///
/// # Examples
///
/// ```
/// let dataset = scag_io::parse_dataset("a,b\n1,2\n3,NA\n").unwrap();
/// assert_eq!(dataset.labels, vec!["a", "b"]);
/// assert!(dataset.columns[1][1].is_nan());
/// ```
pub fn parse_dataset(text: &str) -> Result<Dataset, DatasetError> {
    let mut records = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty() && !line.trim_start().starts_with('#'));

    let Some((_, header)) = records.next() else {
        return Err(DatasetError::NoHeader);
    };
    let separator = Separator::detect(header);
    let labels: Vec<String> = separator
        .split(header)
        .into_iter()
        .map(|l| unquote(l).to_owned())
        .collect();

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); labels.len()];
    for (line, record) in records {
        let fields = separator.split(record);
        if fields.len() != labels.len() {
            return Err(DatasetError::Ragged {
                line,
                expected: labels.len(),
                found: fields.len(),
            });
        }
        for (column, (field, values)) in fields.iter().zip(&mut columns).enumerate() {
            values.push(parse_value(field, line, column + 1)?);
        }
    }

    tracing::debug!(
        variables = labels.len(),
        rows = columns.first().map_or(0, Vec::len),
        ?separator,
        "dataset parsed"
    );
    Ok(Dataset { labels, columns })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn separator_detection() {
        assert_eq!(Separator::detect("a,b"), Separator::Comma);
        assert_eq!(Separator::detect("a\tb"), Separator::Tab);
        assert_eq!(Separator::detect("a  b"), Separator::Whitespace);
        assert_eq!(Separator::detect("a,\tb"), Separator::Comma);
    }

    #[test]
    fn comma_separated() {
        let d = parse_dataset("x,y,z\n1,2,3\n4,5,6\n").unwrap();
        assert_eq!(d.labels, vec!["x", "y", "z"]);
        assert_eq!(d.columns, vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]);
    }

    #[test]
    fn tab_separated_with_crlf() {
        let d = parse_dataset("x\ty\r\n1.5\t-2\r\n").unwrap();
        assert_eq!(d.columns, vec![vec![1.5], vec![-2.0]]);
    }

    #[test]
    fn whitespace_separated() {
        let d = parse_dataset("x   y\n  1   2e3 \n").unwrap();
        assert_eq!(d.labels, vec!["x", "y"]);
        assert_eq!(d.columns, vec![vec![1.0], vec![2000.0]]);
    }

    #[test]
    fn missing_tokens_become_nan() {
        let d = parse_dataset("a,b,c,d,e\n,NA,nan,?,1\n").unwrap();
        for column in &d.columns[..4] {
            assert!(column[0].is_nan());
        }
        assert!((d.columns[4][0] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn quoted_labels_and_values_are_unwrapped() {
        let d = parse_dataset("\"sepal length\",\"petal\"\n\"1\",2\n").unwrap();
        assert_eq!(d.labels, vec!["sepal length", "petal"]);
        assert_eq!(d.columns[0], vec![1.0]);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let d = parse_dataset("# generated\n\na,b\n\n1,2\n# note\n3,4\n").unwrap();
        assert_eq!(d.row_count(), 2);
    }

    #[test]
    fn ragged_row_reports_its_line() {
        let err = parse_dataset("a,b\n1,2\n3\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            DatasetError::Ragged {
                line: 3,
                expected: 2,
                found: 1
            }
            .to_string()
        );
    }

    #[test]
    fn non_numeric_reports_line_and_column() {
        let err = parse_dataset("a,b\n\n1,two\n").unwrap_err();
        assert!(matches!(
            err,
            DatasetError::NonNumeric { line: 3, column: 2, ref token } if token == "two"
        ));
    }

    #[test]
    fn empty_text_has_no_header() {
        assert!(matches!(parse_dataset(""), Err(DatasetError::NoHeader)));
        assert!(matches!(parse_dataset("# only\n\n"), Err(DatasetError::NoHeader)));
    }

    #[test]
    fn header_only_gives_empty_columns() {
        let d = parse_dataset("a,b\n").unwrap();
        assert_eq!(d.variable_count(), 2);
        assert_eq!(d.row_count(), 0);
    }
}
