//! snapgraph-bench: CLI tool for tolerance experimentation and diagnostics.
//!
//! Builds a graph from line segments read from a JSON file and prints
//! build diagnostics. Useful for:
//!
//! - Seeing how many endpoints snap at a given tolerance
//! - Measuring build time on large segment sets
//! - Rendering the resulting network to SVG for inspection
//!
//! The input file holds an array of line strings, each an array of
//! `[x, y]` pairs:
//!
//! ```text
//! [[[1, 1], [2, 2]], [[2.01, 2.0007], [3, 3]]]
//! ```
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin snapgraph-bench -- [OPTIONS] <SEGMENTS_PATH>
//! ```
//!
//! Set `RUST_LOG=snapgraph=debug` to log every snap and node creation.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use geo::LineString;
use snapgraph::diagnostics::{BuildReport, Clock};
use tracing_subscriber::EnvFilter;

/// Tolerant graph building diagnostics for snapgraph.
///
/// Builds a graph from the segments in a JSON file and prints endpoint
/// resolution counts and timing.
#[derive(Parser)]
#[command(name = "snapgraph-bench", version)]
struct Cli {
    /// Path to a JSON array of line strings (arrays of `[x, y]` pairs).
    segments_path: PathBuf,

    /// Snapping tolerance: endpoints closer than this share a node.
    #[arg(long, default_value_t = snapgraph::BuildConfig::DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Write SVG output to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full build config as a JSON string.
    ///
    /// When provided, `--tolerance` is ignored. The JSON must be a valid
    /// `BuildConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Build a [`BuildConfig`](snapgraph::BuildConfig) from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and
/// `--tolerance` is ignored.
fn config_from_cli(cli: &Cli) -> Result<snapgraph::BuildConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str::<snapgraph::BuildConfig>(json)
            .map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        snapgraph::BuildConfig::new(cli.tolerance)
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Parse a JSON array of coordinate arrays into line strings.
fn parse_segments(json: &str) -> Result<Vec<LineString<f64>>, serde_json::Error> {
    let raw: Vec<Vec<[f64; 2]>> = serde_json::from_str(json)?;
    Ok(raw.into_iter().map(LineString::from).collect())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let json = match std::fs::read_to_string(&cli.segments_path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.segments_path.display());
            return ExitCode::FAILURE;
        }
    };

    let segments = match parse_segments(&json) {
        Ok(segments) => segments,
        Err(e) => {
            eprintln!("Error parsing {}: {e}", cli.segments_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Segments: {} ({} from {})",
        segments.len(),
        segments.iter().map(|s| s.0.len()).sum::<usize>(),
        cli.segments_path.display(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_reports = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match snapgraph::diagnostics::build_with_diagnostics(&segments, config, &StdClock) {
            Ok((store, report)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&report) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", report.report());
                }

                // Write SVG on the first run only.
                if run == 0
                    && let Some(ref svg_path) = cli.svg
                {
                    write_svg(svg_path, &cli, &config, &store);
                }

                all_reports.push(report);
            }
            Err(e) => {
                eprintln!("Build error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_reports);
    }

    ExitCode::SUCCESS
}

/// Render the built graph and write it to `svg_path`, reporting the
/// outcome on stderr.
fn write_svg(
    svg_path: &Path,
    cli: &Cli,
    config: &snapgraph::BuildConfig,
    store: &snapgraph::PetgraphStore,
) {
    let title = cli
        .segments_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bench");
    let desc = format!("tolerance={}", config.tolerance);
    let config_json = serde_json::to_string(config).ok();
    let metadata = snapgraph_export::SvgMetadata {
        title: Some(title),
        description: Some(&desc),
        config_json: config_json.as_deref(),
    };
    let svg = snapgraph_export::graph_to_svg(store, &metadata);
    match std::fs::write(svg_path, &svg) {
        Ok(()) => {
            eprintln!(
                "SVG written to {} ({} bytes)",
                svg_path.display(),
                svg.len(),
            );
        }
        Err(e) => {
            eprintln!("Error writing SVG to {}: {e}", svg_path.display());
        }
    }
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

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_reports: &[BuildReport]) {
    debug_assert!(!all_reports.is_empty(), "no reports to summarize");

    println!();
    println!("Summary ({} runs)\n{}", all_reports.len(), "=".repeat(60));

    if all_reports.is_empty() {
        println!("Warning: no reports to summarize");
        return;
    }

    let durations: Vec<f64> = all_reports
        .iter()
        .map(|r| r.duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    // Builds are deterministic, so the graph shape is the same every run.
    let first = &all_reports[0];
    println!(
        "Nodes: {}  |  Edges: {}  |  Snapped endpoints: {}",
        first.node_count, first.edge_count, first.counters.endpoints_snapped,
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("snapgraph-bench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parse_segments_reads_coordinate_arrays() {
        let segments =
            parse_segments("[[[1, 1], [2, 2]], [[2.01, 2.0007], [3, 3], [4, 3]]]").unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].0.len(), 3);
        assert_eq!(segments[1].0[0], geo::coord! { x: 2.01, y: 2.0007 });
    }

    #[test]
    fn parse_segments_rejects_bad_shapes() {
        assert!(parse_segments("[[1, 2]]").is_err());
        assert!(parse_segments("{}").is_err());
    }

    #[test]
    fn tolerance_flag_builds_config() {
        let config = config_from_cli(&cli(&["in.json", "--tolerance", "0.25"])).unwrap();
        assert!((config.tolerance - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn config_json_overrides_flags() {
        let config = config_from_cli(&cli(&[
            "in.json",
            "--tolerance",
            "0.25",
            "--config-json",
            r#"{"tolerance": 0.5}"#,
        ]))
        .unwrap();
        assert!((config.tolerance - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_tolerance_is_reported() {
        let err = config_from_cli(&cli(&["in.json", "--tolerance", "0"])).unwrap_err();
        assert!(err.contains("tolerance"), "{err}");
    }

    #[test]
    fn runs_must_be_positive() {
        assert!(Cli::try_parse_from(["snapgraph-bench", "in.json", "--runs", "0"]).is_err());
    }
}
