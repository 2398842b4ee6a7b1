// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: find facing, unobstructed element pairs in a batch of floor plans
//!
//! Usage:
//!   planlint <manifest.json> [options]

use anyhow::{bail, Context, Result};
use planlint_vision::{AnalysisConfig, BatchSummary, ConflictPipeline, ImageAnalysis, Manifest};
use serde::Serialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Options {
    manifest: PathBuf,
    config: Option<PathBuf>,
    overlap: Option<f64>,
    obstruction: Option<f64>,
    threads: Option<usize>,
    output: Option<PathBuf>,
    json_logs: bool,
}

#[derive(Serialize)]
struct ImageReport<'a> {
    image: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<&'a ImageAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct Report<'a> {
    summary: BatchSummary,
    images: Vec<ImageReport<'a>>,
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return Ok(());
    }

    let options = parse_args(&args)?;
    init_logging(options.json_logs);
    run(&options)
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i)
        .map(String::as_str)
        .with_context(|| format!("Missing value for {}", flag))
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options {
        manifest: PathBuf::from(&args[1]),
        ..Default::default()
    };

    let mut i = 2;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--config" => {
                i += 1;
                options.config = Some(PathBuf::from(value(args, i, flag)?));
            }
            "--overlap" => {
                i += 1;
                options.overlap = Some(
                    value(args, i, flag)?
                        .parse()
                        .context("Invalid overlap threshold")?,
                );
            }
            "--obstruction" => {
                i += 1;
                options.obstruction = Some(
                    value(args, i, flag)?
                        .parse()
                        .context("Invalid obstruction threshold")?,
                );
            }
            "--threads" => {
                i += 1;
                options.threads = Some(value(args, i, flag)?.parse().context("Invalid thread count")?);
            }
            "--output" => {
                i += 1;
                options.output = Some(PathBuf::from(value(args, i, flag)?));
            }
            "--json-logs" => {
                options.json_logs = true;
            }
            other => {
                print_usage();
                bail!("Unknown option: {}", other);
            }
        }
        i += 1;
    }

    Ok(options)
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(options: &Options) -> Result<AnalysisConfig> {
    let config = match &options.config {
        Some(path) => AnalysisConfig::from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    let overlap = options.overlap.unwrap_or(config.overlap_threshold);
    let obstruction = options.obstruction.unwrap_or(config.obstruction_threshold);
    Ok(config.with_thresholds(overlap, obstruction))
}

fn run(options: &Options) -> Result<()> {
    let start = Instant::now();
    let config = load_config(options)?;

    if let Some(threads) = options.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let manifest = Manifest::from_path(&options.manifest)
        .with_context(|| format!("Failed to read manifest {}", options.manifest.display()))?;

    tracing::info!(
        manifest = %options.manifest.display(),
        images = manifest.images.len(),
        overlap_threshold = config.overlap_threshold,
        obstruction_threshold = config.obstruction_threshold,
        threads = rayon::current_num_threads(),
        "Starting analysis"
    );

    let pipeline = ConflictPipeline::new(config);
    let outcomes = pipeline.analyze_batch(&manifest.images);

    let report = Report {
        summary: BatchSummary::from_outcomes(&outcomes),
        images: outcomes
            .iter()
            .map(|outcome| ImageReport {
                image: &outcome.image,
                analysis: outcome.result.as_ref().ok(),
                error: outcome.result.as_ref().err().map(|e| e.to_string()),
            })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&report)?;

    match &options.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(output = %path.display(), "Report written");
        }
        None => println!("{}", json),
    }

    tracing::info!(
        images = report.summary.images,
        failed = report.summary.failed,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Done"
    );
    for (selection, count) in &report.summary.conflicts {
        tracing::info!(selection = %selection, conflicts = count, "Selection total");
    }

    Ok(())
}

fn print_usage() {
    eprintln!("planlint - Facing and line-of-sight conflicts in floor plans");
    eprintln!();
    eprintln!("Usage: planlint <manifest.json> [options]");
    eprintln!();
    eprintln!("The manifest lists images with their detections:");
    eprintln!("  {{ \"images\": [ {{ \"path\": \"plan.png\",");
    eprintln!("      \"detections\": [ {{ \"bbox\": [x1, y1, x2, y2], \"class_name\": \"door\" }} ],");
    eprintln!("      \"orientations\": {{ \"door\": [\"vertical\"] }} }} ] }}");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <file>        Analysis config (JSON)");
    eprintln!("  --overlap <rate>       Minimum projection overlap (default: 0.5)");
    eprintln!("  --obstruction <rate>   Maximum obstruction rate (default: 0.5)");
    eprintln!("  --threads <n>          Worker threads (default: all cores)");
    eprintln!("  --output <file>        Write the JSON report to a file instead of stdout");
    eprintln!("  --json-logs            Log as JSON lines");
    eprintln!();
    eprintln!("Log level is taken from RUST_LOG (default: info).");
}
