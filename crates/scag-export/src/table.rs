//! Delimited measure table serializer.
//!
//! One row per scatterplot, comma-separated, with a fixed header:
//!
//! ```text
//! x,y,outlying,skewed,clumpy,sparse,striated,convex,skinny,stringy,monotonic,outlier_plot
//! ```
//!
//! `x` and `y` are the variable labels of the pair. Measures are written
//! with six decimal places and `outlier_plot` as `1` or `0`.
//!
//! Lines beginning with `#` are metadata or report a pair whose
//! computation failed; readers should skip them.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::fmt::Write;

use scag_pipeline::{Measure, PairResult, PlotFlags};

/// Metadata to embed as `#`-prefixed comment lines above the header.
#[derive(Debug, Clone, Default)]
pub struct TableMetadata<'a> {
    /// Source dataset name, emitted as `# Source: <name>`.
    pub source: Option<&'a str>,

    /// Free-form description, one `#` line per input line.
    pub description: Option<&'a str>,

    /// Full `ScagnosticsConfig` JSON, emitted as `# Config: <json>`.
    pub config_json: Option<&'a str>,
}

/// Column names of the table header, in order.
#[must_use]
pub fn header() -> String {
    let mut columns = vec!["x", "y"];
    columns.extend(Measure::ALL.iter().map(|m| m.name()));
    columns.extend(["outlier_plot", "exemplar_plot"]);
    columns.join(",")
}

/// Serialize pair results into a delimited table.
///
/// `results` pairs each [`PairResult`] with its plot flags, as
/// returned by `scag_pipeline::process_dataset`. Variable indices are
/// resolved through `labels`; an index without a label is written as
/// `v<index>`.
///
/// # Examples
///
/// ```
/// use scag_export::table::{TableMetadata, to_table};
/// use scag_pipeline::{PairResult, PlotFlags, ScagError};
///
/// let labels = vec!["a".to_owned(), "b".to_owned()];
/// let failed = PairResult { x: 0, y: 1, result: Err(ScagError::NoFiniteValues) };
/// let table = to_table(&labels, &[(failed, PlotFlags::default())], &TableMetadata::default());
/// assert!(table.starts_with("# scagnostics\n"));
/// assert!(table.contains("# Failed: a,b: "));
/// ```
#[must_use]
pub fn to_table(
    labels: &[String],
    results: &[(PairResult, PlotFlags)],
    metadata: &TableMetadata<'_>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# scagnostics");
    if let Some(source) = metadata.source {
        for line in source.lines() {
            let _ = writeln!(out, "# Source: {line}");
        }
    }
    if let Some(description) = metadata.description {
        for line in description.lines() {
            let _ = writeln!(out, "# {line}");
        }
    }
    if let Some(config_json) = metadata.config_json {
        for line in config_json.lines() {
            let _ = writeln!(out, "# Config: {line}");
        }
    }

    let _ = writeln!(out, "{}", header());

    for (pair, flags) in results {
        let x = field(&label(labels, pair.x));
        let y = field(&label(labels, pair.y));
        match &pair.result {
            Ok(scagnostics) => {
                let _ = write!(out, "{x},{y}");
                for value in scagnostics.to_array() {
                    let _ = write!(out, ",{value:.6}");
                }
                let _ = writeln!(
                    out,
                    ",{},{}",
                    u8::from(flags.outlier),
                    u8::from(flags.exemplar)
                );
            }
            Err(err) => {
                let _ = writeln!(out, "# Failed: {x},{y}: {err}");
            }
        }
    }
    out
}

fn label(labels: &[String], index: usize) -> String {
    labels
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("v{index}"))
}

/// Quote a field when it would otherwise break the row.
fn field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_owned()
    }
}
