//! scag: compute scagnostics for every variable pair of delimited datasets.
//!
//! Each input file (or every matching file of an input directory) is
//! parsed, its variables are rescaled onto `[0, 1]`, and the nine
//! measures are computed for every pair of variables. Results go to
//! stdout, or to one file per dataset with `--output-dir`.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin scag -- [OPTIONS] <INPUTS>...
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use scag_export::{Report, SvgMetadata, TableMetadata, to_json, to_pair_svg, to_table};
use scag_pipeline::diagnostics::{Clock, analyze_with_diagnostics};
use scag_pipeline::{
    Dataset, PairResult, PlotFlags, ScagnosticsConfig, batch_seed, normalize_columns, pair_rng,
    pin_seed, process_dataset,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Scatterplot diagnostics for multivariate datasets.
///
/// Computes nine graph-theoretic shape measures (outlying, skewed,
/// clumpy, sparse, striated, convex, skinny, stringy, monotonic) for
/// every pair of variables.
#[derive(Parser)]
#[command(name = "scag", version)]
struct Cli {
    /// Dataset files, or directories to scan for them.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// File extension scanned for inside directories.
    #[arg(long, default_value = scag_io::DEFAULT_EXTENSION)]
    extension: String,

    /// Target linear bin resolution.
    #[arg(long, default_value_t = ScagnosticsConfig::DEFAULT_NUM_BINS, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..=ScagnosticsConfig::MAX_NUM_BINS as u64))]
    num_bins: usize,

    /// Maximum number of nonempty bins.
    #[arg(long, default_value_t = ScagnosticsConfig::DEFAULT_MAX_BINS, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    max_bins: usize,

    /// Initial subsampling scale (at least 1).
    #[arg(long, default_value_t = ScagnosticsConfig::DEFAULT_INITIAL_SCALE)]
    scale: f64,

    /// Seed for the subsampling RNG. Drawn from entropy when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Full scagnostics config as a JSON string.
    ///
    /// When provided, all other config flags are ignored. The JSON must
    /// be a valid `ScagnosticsConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Write one result file per dataset into this directory instead of
    /// printing to stdout.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Emit a JSON report instead of a delimited table.
    #[arg(long)]
    json: bool,

    /// Write a diagnostic SVG of every pair into this directory.
    #[arg(long)]
    svg_dir: Option<PathBuf>,

    /// Print per-stage timing diagnostics for every pair to stderr.
    #[arg(long)]
    diagnostics: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

/// Build a [`ScagnosticsConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. The seed is pinned either
/// way so the config recorded in the output reproduces it.
fn config_from_cli(cli: &Cli) -> Result<ScagnosticsConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        ScagnosticsConfig {
            num_bins: cli.num_bins,
            max_bins: cli.max_bins,
            initial_scale: cli.scale,
            seed: cli.seed,
            ..ScagnosticsConfig::default()
        }
    };
    config
        .validate()
        .map_err(|e| format!("Invalid configuration: {e}"))?;
    Ok(pin_seed(&config))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let files = match scag_io::discover(&cli.inputs, &cli.extension) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if files.is_empty() {
        eprintln!("No dataset files found");
        return ExitCode::FAILURE;
    }

    let mut failed = 0usize;
    for file in &files {
        if let Err(msg) = process_file(&cli, &config, file) {
            eprintln!("{}: {msg}", file.display());
            failed += 1;
        }
    }

    if failed > 0 {
        eprintln!("{failed} of {} datasets failed", files.len());
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// Compute and emit all outputs for one dataset file.
fn process_file(cli: &Cli, config: &ScagnosticsConfig, file: &Path) -> Result<(), String> {
    let dataset = scag_io::read_dataset(file).map_err(|e| e.to_string())?;
    let source = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    tracing::info!(
        file = %file.display(),
        variables = dataset.variable_count(),
        rows = dataset.row_count(),
        "processing dataset"
    );

    let results = process_dataset(&dataset, config);
    let failures = results.iter().filter(|(p, _)| p.result.is_err()).count();
    if failures > 0 {
        tracing::warn!(file = %file.display(), failures, "some pairs failed");
    }

    let (contents, suffix) = if cli.json {
        let report = Report::new(Some(&source), config, &dataset.labels, &results);
        let json = to_json(&report).map_err(|e| format!("Error serializing report: {e}"))?;
        (json, ".scag.json")
    } else {
        let config_json = serde_json::to_string(config)
            .map_err(|e| format!("Error serializing config: {e}"))?;
        let metadata = TableMetadata {
            source: Some(&source),
            config_json: Some(&config_json),
            ..TableMetadata::default()
        };
        (to_table(&dataset.labels, &results, &metadata), ".scag.csv")
    };

    if let Some(ref dir) = cli.output_dir {
        let target = scag_io::output_path(file, Some(dir), suffix);
        scag_io::write_output(&target, &contents).map_err(|e| e.to_string())?;
        eprintln!("Results written to {}", target.display());
    } else {
        print!("{contents}");
    }

    if cli.svg_dir.is_some() || cli.diagnostics {
        explain_pairs(cli, config, file, &dataset, &results)?;
    }
    Ok(())
}

/// Re-run each successful pair with its batch RNG to render SVGs and
/// per-stage diagnostics.
fn explain_pairs(
    cli: &Cli,
    config: &ScagnosticsConfig,
    file: &Path,
    dataset: &Dataset,
    results: &[(PairResult, PlotFlags)],
) -> Result<(), String> {
    let columns = normalize_columns(&dataset.columns);
    let base = batch_seed(config);
    let stem = file
        .file_stem()
        .map_or_else(|| "dataset".to_owned(), |s| s.to_string_lossy().into_owned());

    for (k, (pair, _)) in results.iter().enumerate() {
        let Ok(scagnostics) = &pair.result else {
            continue;
        };
        let x_label = label(dataset, pair.x);
        let y_label = label(dataset, pair.y);
        let (analysis, diagnostics) = analyze_with_diagnostics(
            &columns[pair.x],
            &columns[pair.y],
            config,
            &mut pair_rng(base, k),
            &StdClock,
        )
        .map_err(|e| format!("{x_label} vs {y_label}: {e}"))?;

        if cli.diagnostics {
            eprintln!("{stem}: {x_label} vs {y_label}");
            eprintln!("{}", diagnostics.report());
            eprintln!();
        }

        if let Some(ref dir) = cli.svg_dir {
            let title = format!("{x_label} vs {y_label}");
            let description = serde_json::to_string(scagnostics)
                .map_err(|e| format!("Error serializing measures: {e}"))?;
            let metadata = SvgMetadata {
                title: Some(&title),
                description: Some(&description),
                x_label: Some(&x_label),
                y_label: Some(&y_label),
            };
            let svg = to_pair_svg(&analysis, &metadata);
            let name = format!(
                "{stem}_{}_{}.svg",
                file_safe(&x_label),
                file_safe(&y_label)
            );
            let target = dir.join(name);
            scag_io::write_output(&target, &svg).map_err(|e| e.to_string())?;
            tracing::debug!(path = %target.display(), bytes = svg.len(), "SVG written");
        }
    }
    Ok(())
}

fn label(dataset: &Dataset, index: usize) -> String {
    dataset
        .labels
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("v{index}"))
}

/// Replace characters that are awkward in file names.
fn file_safe(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
