//! # CLI Module
//!
//! Command-line interface for pdupe.
//!
//! ## Usage
//! ```bash
//! # Compare every photo under a directory with every other one
//! pdupe ~/Photos
//!
//! # Stricter threshold, dispersion metric
//! pdupe ~/Photos --metric stddev --threshold 10
//!
//! # Everything against one photo, as JSON
//! pdupe ~/Photos --reference ~/Photos/original.jpg --output json
//!
//! # Only write sidecars
//! pdupe ~/Photos --fingerprint-only -j 4
//! ```
//!
//! Results go to stdout; progress, per-file errors and the summary go to
//! stderr.

use clap::{Parser, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use pdupe::core::comparator::{ChannelBreakdown, DistanceMetric, MatchResult, DEFAULT_THRESHOLD};
use pdupe::core::fingerprint::{Fingerprint, DEFAULT_GRID};
use pdupe::core::pipeline::{Pipeline, PipelineResult};
use pdupe::core::scheduler::default_parallelism;
use pdupe::error::Result;
use pdupe::events::{CollectEvent, CompareEvent, Event, EventChannel, FingerprintEvent, PipelineEvent};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::thread;

/// pdupe - Find similar photos by comparing color grid fingerprints
#[derive(Parser, Debug)]
#[command(name = "pdupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Images, `.cd.gz` sidecars or directories (walked recursively)
    paths: Vec<PathBuf>,

    /// Compare everything against this image or sidecar
    #[arg(short, long)]
    reference: Option<PathBuf>,

    /// Distance metric: simple, prism or stddev
    #[arg(short, long, default_value = "simple", value_parser = DistanceMetric::from_str)]
    metric: DistanceMetric,

    /// Match threshold (a pair matches when its distance is at most this)
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Regenerate sidecars that already exist
    #[arg(long)]
    overwrite: bool,

    /// Write sidecars and stop
    #[arg(long)]
    fingerprint_only: bool,

    /// Print every compared pair with a per-channel breakdown
    #[arg(short, long)]
    verbose: bool,

    /// Images fingerprinted at once (default: available cores)
    #[arg(short = 'j', long)]
    parallelism: Option<usize>,

    /// Grid rows and columns
    #[arg(long, default_value_t = DEFAULT_GRID)]
    grid: u32,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Include hidden files and directories
    #[arg(long)]
    include_hidden: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One line per pair, colored summary on stderr
    Pretty,
    /// JSON document for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let metric = cli.metric;
    let parallelism = cli.parallelism.unwrap_or_else(default_parallelism);

    let pipeline = Pipeline::builder()
        .paths(cli.paths.clone())
        .reference(cli.reference.clone())
        .metric(metric)
        .threshold(cli.threshold)
        .grid(cli.grid, cli.grid)
        .parallelism(parallelism)
        .overwrite(cli.overwrite)
        .fingerprint_only(cli.fingerprint_only)
        .include_hidden(cli.include_hidden)
        .verbose(cli.verbose)
        .build()?;

    tracing::debug!(
        metric = metric.name(),
        threshold = cli.threshold,
        parallelism,
        grid = cli.grid,
        "starting run"
    );

    // Set up event handling
    let (sender, receiver) = EventChannel::new();

    let progress = if matches!(cli.output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        let bar_style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("█▓░"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(bar_style);
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose = cli.verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        let Some(pb) = progress_clone else {
            // Drain so senders never observe a full channel
            for _ in receiver.iter() {}
            return;
        };
        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_position(0);
                    pb.set_message(format!("{}", phase));
                }
                Event::Collect(CollectEvent::Completed { images, .. }) => {
                    pb.set_length(images as u64);
                }
                Event::Fingerprint(FingerprintEvent::Started { total }) => {
                    pb.set_length(total as u64);
                }
                Event::Fingerprint(FingerprintEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(
                            p.current_path
                                .file_name()
                                .unwrap_or_default()
                                .to_string_lossy()
                                .to_string(),
                        );
                    }
                }
                Event::Compare(CompareEvent::Started { total_comparisons }) => {
                    pb.set_length(total_comparisons as u64);
                }
                Event::Compare(CompareEvent::Progress(p)) => {
                    pb.set_position(p.comparisons_completed as u64);
                }
                Event::Pipeline(PipelineEvent::Completed { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
        pb.finish_and_clear();
    });

    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    let result = result?;
    let term = Term::stderr();

    for error in &result.errors {
        term.write_line(&format!("{} {}", style("warning:").yellow().bold(), error))
            .ok();
    }

    match cli.output {
        OutputFormat::Pretty => print_pretty_results(&term, &result, metric, verbose),
        OutputFormat::Json => print_json_results(&result, metric, cli.threshold, verbose),
    }

    Ok(())
}

/// Fingerprints by display path, so verbose output can break a pair down
fn index_fingerprints(result: &PipelineResult) -> HashMap<&str, &Fingerprint> {
    result
        .fingerprints
        .iter()
        .chain(result.reference.iter())
        .map(|fp| (fp.path(), fp))
        .collect()
}

fn breakdown_for(
    index: &HashMap<&str, &Fingerprint>,
    pair: &MatchResult,
) -> Option<ChannelBreakdown> {
    let a = index.get(pair.photo_a.as_str())?;
    let b = index.get(pair.photo_b.as_str())?;
    ChannelBreakdown::compute(a, b).ok()
}

fn print_pretty_results(term: &Term, result: &PipelineResult, metric: DistanceMetric, verbose: bool) {
    let pairs = result.matches.surfaced(verbose);
    let index = if verbose {
        index_fingerprints(result)
    } else {
        HashMap::new()
    };

    for pair in &pairs {
        if verbose {
            let marker = if pair.matched {
                style("MATCH").green().bold().to_string()
            } else {
                style("-----").dim().to_string()
            };
            println!(
                "{} {:.4} {} {} {}",
                marker,
                pair.distance,
                metric.name(),
                pair.photo_a,
                pair.photo_b
            );
            if let Some(breakdown) = breakdown_for(&index, pair) {
                println!("{}", style(format_breakdown(&breakdown)).dim());
            }
        } else {
            println!(
                "{:.4} {} {} {}",
                pair.distance,
                metric.name(),
                pair.photo_a,
                pair.photo_b
            );
        }
    }

    let report = &result.fingerprinting;
    term.write_line("").ok();
    term.write_line(&format!(
        "{} {} fingerprinted, {} reused, {} failed in {:.1}s",
        style("✓").green().bold(),
        style(report.fingerprinted()).cyan(),
        style(report.skipped()).cyan(),
        style(report.failed()).red(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();

    if result.matches.comparisons > 0 {
        term.write_line(&format!(
            "  {} pairs compared with {}, {} matched",
            style(result.matches.comparisons).cyan(),
            style(metric.name()).yellow(),
            style(result.matches.match_count()).cyan()
        ))
        .ok();
    }
}

fn format_breakdown(breakdown: &ChannelBreakdown) -> String {
    let [r, g, b] = breakdown.mean_abs;
    let [mr, mg, mb] = breakdown.mean_signed;
    let [sr, sg, sb] = breakdown.std_dev;
    format!(
        "    abs r {:.2} g {:.2} b {:.2} | shift r {:.2}±{:.2} g {:.2}±{:.2} b {:.2}±{:.2}",
        r, g, b, mr, sr, mg, sg, mb, sb
    )
}

#[derive(Serialize)]
struct JsonPair<'a> {
    #[serde(flatten)]
    result: &'a MatchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    breakdown: Option<ChannelBreakdown>,
}

fn print_json_results(result: &PipelineResult, metric: DistanceMetric, threshold: f64, verbose: bool) {
    let pairs = result.matches.surfaced(verbose);
    let index = index_fingerprints(result);
    let pairs: Vec<JsonPair> = pairs
        .iter()
        .map(|pair| JsonPair {
            result: pair,
            breakdown: if verbose {
                breakdown_for(&index, pair)
            } else {
                None
            },
        })
        .collect();

    let output = serde_json::json!({
        "metric": metric.name(),
        "threshold": threshold,
        "fingerprinted": result.fingerprinting.fingerprinted(),
        "skipped": result.fingerprinting.skipped(),
        "failed": result.fingerprinting.failed(),
        "compared": result.matches.comparisons,
        "matches": result.matches.match_count(),
        "duration_ms": result.duration_ms,
        "pairs": pairs,
        "errors": result.errors,
    });

    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(error) => tracing::error!(%error, "failed to serialize results"),
    }
}
