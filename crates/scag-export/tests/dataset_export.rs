//! Integration test: run a small dataset through the pipeline and export every format.

#![allow(clippy::unwrap_used)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scag_export::{Report, SvgMetadata, TableMetadata, to_json, to_pair_svg, to_table};
use scag_pipeline::{Dataset, ScagnosticsConfig, analyze, normalize_columns, process_dataset};

fn dataset() -> Dataset {
    let mut rng = StdRng::seed_from_u64(12);
    let a: Vec<f64> = (0..200).map(|_| rng.r#gen::<f64>() * 10.0).collect();
    let b: Vec<f64> = a.iter().map(|v| v * v).collect();
    let c: Vec<f64> = (0..200).map(|_| rng.r#gen::<f64>()).collect();
    Dataset {
        labels: vec!["a".into(), "b".into(), "c".into()],
        columns: vec![a, b, c],
    }
}

fn config() -> ScagnosticsConfig {
    ScagnosticsConfig {
        seed: Some(7),
        ..ScagnosticsConfig::default()
    }
}

#[test]
fn table_has_one_row_per_pair() {
    let dataset = dataset();
    let results = process_dataset(&dataset, &config());
    let config_json = serde_json::to_string(&config()).unwrap();
    let metadata = TableMetadata {
        source: Some("synthetic"),
        config_json: Some(&config_json),
        ..TableMetadata::default()
    };
    let table = to_table(&dataset.labels, &results, &metadata);

    let rows: Vec<Vec<&str>> = table
        .lines()
        .filter(|l| !l.starts_with('#'))
        .skip(1)
        .map(|l| l.split(',').collect())
        .collect();
    assert_eq!(rows.len(), 3);
    let pairs: Vec<(&str, &str)> = rows.iter().map(|r| (r[0], r[1])).collect();
    assert_eq!(pairs, vec![("a", "b"), ("a", "c"), ("b", "c")]);
    assert!(rows.iter().all(|r| r.len() == 13));
    assert!(rows.iter().any(|r| r[12] == "1"));

    // a and b are monotonically related.
    let monotonic: f64 = rows[0][10].parse().unwrap();
    assert!((monotonic - 1.0).abs() < 1e-6);
    for row in &rows {
        for value in &row[2..11] {
            let v: f64 = value.parse().unwrap();
            assert!((0.0..=1.0).contains(&v));
        }
    }
}

#[test]
fn json_report_matches_results() {
    let dataset = dataset();
    let results = process_dataset(&dataset, &config());
    let report = Report::new(Some("synthetic"), &config(), &dataset.labels, &results);
    let json = to_json(&report).unwrap();
    let back: Report = serde_json::from_str(&json).unwrap();
    assert_eq!(back.pairs.len(), 3);
    assert_eq!(back.pairs[2].x_label, "b");
    assert_eq!(back.pairs[2].y_label, "c");
    assert_eq!(back.config, config());
}

#[test]
fn svg_for_a_normalized_pair() {
    let dataset = dataset();
    let columns = normalize_columns(&dataset.columns);
    let analysis = analyze(&columns[0], &columns[2], &config()).unwrap();
    let svg = to_pair_svg(
        &analysis,
        &SvgMetadata {
            title: Some("a vs c"),
            x_label: Some("a"),
            y_label: Some("c"),
            ..SvgMetadata::default()
        },
    );
    assert!(svg.contains("<svg"));
    assert!(svg.contains("id=\"tree\""));
    assert!(svg.contains("</svg>"));
}
