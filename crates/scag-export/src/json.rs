//! JSON report serializer.
//!
//! The report carries the configuration the measures were computed
//! with and one record per scatterplot. A failed pair has `error` set
//! and no `scagnostics`.

use serde::{Deserialize, Serialize};

use scag_pipeline::{PairResult, PlotFlags, Scagnostics, ScagnosticsConfig};

/// A whole-dataset report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Source dataset name, when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
    pub config: ScagnosticsConfig,
    pub labels: Vec<String>,
    pub pairs: Vec<PairRecord>,
}

/// One scatterplot of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRecord {
    pub x: usize,
    pub y: usize,
    pub x_label: String,
    pub y_label: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub scagnostics: Option<Scagnostics>,
    pub outlier_plot: bool,
    pub exemplar_plot: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl Report {
    /// Assemble a report from pair results and their plot flags.
    #[must_use]
    pub fn new(
        source: Option<&str>,
        config: &ScagnosticsConfig,
        labels: &[String],
        results: &[(PairResult, PlotFlags)],
    ) -> Self {
        let label = |i: usize| labels.get(i).cloned().unwrap_or_else(|| format!("v{i}"));
        let pairs = results
            .iter()
            .map(|(pair, flags)| {
                let (scagnostics, error) = match &pair.result {
                    Ok(s) => (Some(*s), None),
                    Err(err) => (None, Some(err.to_string())),
                };
                PairRecord {
                    x: pair.x,
                    y: pair.y,
                    x_label: label(pair.x),
                    y_label: label(pair.y),
                    scagnostics,
                    outlier_plot: flags.outlier,
                    exemplar_plot: flags.exemplar,
                    error,
                }
            })
            .collect();
        Self {
            source: source.map(str::to_owned),
            config: config.clone(),
            labels: labels.to_vec(),
            pairs,
        }
    }
}

/// Serialize a report as pretty-printed JSON.
///
/// # Errors
///
/// Returns the serializer error if the report cannot be encoded.
pub fn to_json(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use scag_pipeline::ScagError;

    use super::*;

    fn results() -> Vec<(PairResult, PlotFlags)> {
        vec![
            (
                PairResult {
                    x: 0,
                    y: 1,
                    result: Ok(Scagnostics::degenerate(0.5)),
                },
                PlotFlags {
                    outlier: true,
                    exemplar: false,
                },
            ),
            (
                PairResult {
                    x: 0,
                    y: 2,
                    result: Err(ScagError::EmptyInput),
                },
                PlotFlags::default(),
            ),
        ]
    }

    #[test]
    fn records_carry_labels_and_flags() {
        let labels = vec!["a".to_owned(), "b".to_owned()];
        let report = Report::new(Some("data.csv"), &ScagnosticsConfig::default(), &labels, &results());
        assert_eq!(report.pairs[0].x_label, "a");
        assert_eq!(report.pairs[0].y_label, "b");
        assert!(report.pairs[0].outlier_plot);
        assert!(!report.pairs[0].exemplar_plot);
        assert_eq!(report.pairs[1].y_label, "v2");
        assert!(report.pairs[1].scagnostics.is_none());
        assert_eq!(report.pairs[1].error.as_deref(), Some("input point set is empty"));
    }

    #[test]
    fn failed_pairs_omit_measures_in_json() {
        let report = Report::new(None, &ScagnosticsConfig::default(), &[], &results());
        let value: serde_json::Value = serde_json::from_str(&to_json(&report).unwrap()).unwrap();
        assert!(value.get("source").is_none());
        assert!(value["pairs"][1].get("scagnostics").is_none());
        assert_eq!(value["pairs"][0]["exemplar_plot"], serde_json::Value::Bool(false));
        assert!((value["pairs"][0]["scagnostics"]["monotonic"].as_f64().unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn report_reads_back() {
        let report = Report::new(Some("x"), &ScagnosticsConfig::default(), &[], &results());
        let back: Report = serde_json::from_str(&to_json(&report).unwrap()).unwrap();
        assert_eq!(back, report);
    }
}
