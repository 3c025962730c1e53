//! Background keying CLI tool
//!
//! Command-line driver that keys files, directories and glob patterns with
//! the border-seeded flood fill, or prints border color histograms.

use super::config::CliConfigBuilder;
use crate::{
    config::{KeyingConfig, OutputFormat, OutputMode},
    diagnostics::BorderReport,
    processor::BackgroundKeyer,
    services::{
        create_cli_progress_reporter, BatchProcessingStats, ImageIOService, OutputFormatHandler,
        ProgressTracker,
    },
    tracing_config::{events, init_cli_tracing, spans},
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use instant::Instant;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Border-seeded chroma-key background remover
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgkey")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input image files, directories or glob patterns (e.g. "logos/logo_*.png")
    #[arg(value_name = "INPUT", required = true)]
    pub input: Vec<String>,

    /// Output file (single input) or directory (batch processing)
    #[arg(short, long, value_name = "OUTPUT", conflicts_with = "in_place")]
    pub output: Option<String>,

    /// Overwrite each input file with its keyed version
    #[arg(long)]
    pub in_place: bool,

    /// Output format [default: from config, or png]
    #[arg(short, long, value_enum)]
    pub format: Option<CliOutputFormat>,

    /// Process directory recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Pattern for directory enumeration (e.g., "logo_*.png")
    #[arg(long)]
    pub pattern: Option<String>,

    /// Process at most N files, taken in sorted order
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Print border color histograms instead of keying
    #[arg(long)]
    pub analyze: bool,

    /// Number of border colors listed per file in analyze mode
    #[arg(long, default_value_t = 5)]
    pub top: usize,

    /// Print analyze reports as JSON
    #[arg(long, requires = "analyze")]
    pub json: bool,

    /// Minimum value for each of R, G and B to count as background
    #[arg(long, value_name = "VALUE")]
    pub min_channel: Option<u8>,

    /// Maximum spread between the largest and smallest channel (exclusive)
    #[arg(long, value_name = "VALUE")]
    pub max_spread: Option<u8>,

    /// JSON keying configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Show detailed batch progress instead of the progress bar
    #[arg(long)]
    pub progress: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Png,
    Tiff,
    Webp,
    Rgba8,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(format: CliOutputFormat) -> Self {
        match format {
            CliOutputFormat::Png => OutputFormat::Png,
            CliOutputFormat::Tiff => OutputFormat::Tiff,
            CliOutputFormat::Webp => OutputFormat::WebP,
            CliOutputFormat::Rgba8 => OutputFormat::Rgba8,
        }
    }
}

/// Totals of one driver run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct BatchSummary {
    processed: usize,
    failed: usize,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (_guard, session_id) =
        init_cli_tracing(cli.verbose).context("Failed to initialize tracing")?;
    let mode = if cli.analyze { "analyze" } else { "key" };
    let _session = spans::session(&session_id, mode).entered();

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    info!("Starting bgkey in {} mode", mode);
    info!("Input(s): {}", cli.input.join(", "));
    debug!(
        min_channel = config.classifier.min_channel,
        max_spread = config.classifier.max_spread,
        output_format = %config.output_format,
        "Keying configuration"
    );

    let files = collect_inputs(&cli)?;
    if files.is_empty() {
        warn!("No supported image files found in the provided inputs");
        return Ok(());
    }
    info!("Found {} image file(s) to process", files.len());

    let start_time = Instant::now();
    let summary = if cli.analyze {
        analyze_files(&cli, &config, &files)?
    } else {
        key_files(&cli, config, &files)?
    };

    info!(
        "Processed {} image(s) in {:.2}s",
        summary.processed,
        start_time.elapsed().as_secs_f64()
    );

    if summary.failed > 0 {
        anyhow::bail!(
            "{} of {} file(s) failed to process",
            summary.failed,
            files.len()
        );
    }

    Ok(())
}

/// Expand inputs into a sorted, deduplicated and limited list of image files
fn collect_inputs(cli: &Cli) -> Result<Vec<PathBuf>> {
    let mut all_files = Vec::new();

    for input in &cli.input {
        let path = PathBuf::from(input);

        if path.is_file() {
            if ImageIOService::is_supported_format(&path) {
                all_files.push(path);
            } else {
                warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            all_files.extend(find_image_files(&path, cli.recursive, cli.pattern.as_deref())?);
        } else if is_glob(input) {
            let matches = expand_glob(input, cli.recursive, cli.pattern.as_deref())?;
            if matches.is_empty() {
                warn!("Pattern matched no image files: {}", input);
            }
            all_files.extend(matches);
        } else {
            anyhow::bail!(
                "Input path does not exist or is not accessible: {}",
                path.display()
            );
        }
    }

    // Sort files alphanumerically for consistent processing order
    all_files.sort();
    all_files.dedup();

    if let Some(limit) = cli.limit {
        all_files.truncate(limit);
    }

    Ok(all_files)
}

fn is_glob(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

fn expand_glob(pattern: &str, recursive: bool, name_pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let paths =
        glob::glob(pattern).with_context(|| format!("Invalid glob pattern: {pattern}"))?;

    for entry in paths {
        let path = entry.context("Failed to read glob match")?;
        if path.is_dir() {
            files.extend(find_image_files(&path, recursive, name_pattern)?);
        } else if ImageIOService::is_supported_format(&path) {
            files.push(path);
        }
    }

    Ok(files)
}

/// Find image files in a directory
fn find_image_files(dir: &Path, recursive: bool, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if recursive {
        for entry in walkdir::WalkDir::new(dir) {
            let entry = entry?;
            if entry.file_type().is_file() {
                let path = entry.path();
                if ImageIOService::is_supported_format(path) && matches_pattern(path, pattern) {
                    files.push(path.to_path_buf());
                }
            }
        }
    } else {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let path = entry.path();
                if ImageIOService::is_supported_format(&path) && matches_pattern(&path, pattern) {
                    files.push(path);
                }
            }
        }
    }

    Ok(files)
}

/// Check if the file name matches the given pattern
fn matches_pattern(path: &Path, pattern: Option<&str>) -> bool {
    match pattern {
        Some(pat) => {
            if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
                glob::Pattern::new(pat)
                    .map(|p| p.matches(filename))
                    .unwrap_or(false)
            } else {
                false
            }
        },
        None => true,
    }
}

/// `<stem>_keyed.<ext>` next to the input, or inside `output_dir` when given
fn generate_output_path(input_path: &Path, output_dir: Option<&Path>, format: OutputFormat) -> PathBuf {
    let stem = input_path.file_stem().unwrap_or_default();
    let dir = output_dir
        .or_else(|| input_path.parent())
        .unwrap_or(Path::new("."));

    dir.join(format!(
        "{}_keyed.{}",
        stem.to_string_lossy(),
        OutputFormatHandler::get_extension(format)
    ))
}

/// Where one input's keyed image goes, and in which format
fn resolve_output(
    cli: &Cli,
    config: &KeyingConfig,
    input_path: &Path,
    file_count: usize,
) -> Result<(PathBuf, OutputFormat)> {
    if config.output_mode == OutputMode::InPlace {
        let format = OutputFormatHandler::from_path(input_path).with_context(|| {
            format!(
                "Cannot overwrite {} losslessly; use --format with a suffixed output instead",
                input_path.display()
            )
        })?;
        return Ok((input_path.to_path_buf(), format));
    }

    match cli.output.as_deref() {
        Some(target) if file_count == 1 => {
            let output_path = PathBuf::from(target);
            // An explicit --format wins; otherwise the target's extension decides
            let format = match cli.format {
                Some(format) => format.into(),
                None => OutputFormatHandler::from_path(&output_path)
                    .unwrap_or(config.output_format),
            };
            Ok((output_path, format))
        },
        Some(dir) => Ok((
            generate_output_path(input_path, Some(Path::new(dir)), config.output_format),
            config.output_format,
        )),
        None => Ok((
            generate_output_path(input_path, None, config.output_format),
            config.output_format,
        )),
    }
}

fn batch_progress_bar(file_count: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(file_count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Decode, key and encode every file, continuing past failures
fn key_files(cli: &Cli, config: KeyingConfig, files: &[PathBuf]) -> Result<BatchSummary> {
    let file_count = files.len();
    let _batch = spans::batch_processing(file_count).entered();

    if file_count > 1 {
        if let Some(ref output) = cli.output {
            let output_path = PathBuf::from(output);
            if output_path.is_file() {
                anyhow::bail!(
                    "Output path exists and is a file, not a directory: {}",
                    output_path.display()
                );
            }
            std::fs::create_dir_all(&output_path).with_context(|| {
                format!(
                    "Failed to create output directory: {}",
                    output_path.display()
                )
            })?;
        }
    }

    let batch_tracker =
        ProgressTracker::new(create_cli_progress_reporter(cli.progress, cli.verbose > 0));
    let mut keyer = BackgroundKeyer::new(config)
        .context("Failed to create background keyer")?
        .with_progress_tracker(ProgressTracker::new(create_cli_progress_reporter(
            cli.progress,
            cli.verbose > 0,
        )));

    let indicatif_progress = if !cli.progress && file_count > 1 {
        Some(batch_progress_bar(file_count)?)
    } else {
        None
    };

    let mut summary = BatchSummary::default();
    let batch_start_time = Instant::now();

    for input_file in files {
        if let Some(ref pb) = indicatif_progress {
            pb.set_message(format!("Processing {}", input_file.display()));
        }

        if cli.progress && file_count > 1 {
            let elapsed_seconds = batch_start_time.elapsed().as_secs_f64();
            let processing_rate = if elapsed_seconds > 0.0 && summary.processed > 0 {
                summary.processed as f64 / elapsed_seconds
            } else {
                0.0
            };
            batch_tracker.report_batch(BatchProcessingStats {
                items_completed: summary.processed,
                items_total: file_count,
                items_failed: summary.failed,
                current_item_name: input_file.display().to_string(),
                processing_rate,
            });
        }

        match key_single_file(cli, &mut keyer, input_file, file_count) {
            Ok(()) => summary.processed += 1,
            Err(e) => {
                summary.failed += 1;
                events::error_with_context(&format!("{e:#}"), &input_file.display().to_string());
            },
        }

        if let Some(ref pb) = indicatif_progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = indicatif_progress {
        pb.finish_with_message(format!(
            "Completed! Processed: {}, Failed: {}",
            summary.processed, summary.failed
        ));
    }

    if file_count > 1 {
        let batch_total_time = batch_start_time.elapsed();
        info!("📊 Batch processing summary:");
        info!("  ├─ Files processed: {}", summary.processed);
        info!("  ├─ Files failed: {}", summary.failed);
        info!("  ├─ Total time: {:.2}s", batch_total_time.as_secs_f64());
        info!(
            "  └─ Average per file: {:.2}s",
            if summary.processed > 0 {
                batch_total_time.as_secs_f64() / (summary.processed as f64)
            } else {
                0.0
            }
        );
    }

    Ok(summary)
}

fn key_single_file(
    cli: &Cli,
    keyer: &mut BackgroundKeyer,
    input_path: &Path,
    file_count: usize,
) -> Result<()> {
    let (output_path, format) = resolve_output(cli, keyer.config(), input_path, file_count)?;
    let _span = spans::file_processing(input_path, &format.to_string()).entered();

    let result = keyer
        .process_file_to(input_path, &output_path, format)
        .context("Failed to key background")?;

    let stats = &result.stats;
    debug!(
        background = stats.background_pixels,
        total = stats.total_pixels(),
        seeds = stats.seeds_enqueued,
        "Keyed {}",
        input_path.display()
    );
    if stats.background_pixels == 0 {
        events::warning_with_recommendation(
            &format!("No border background found in {}", input_path.display()),
            "Run with --analyze to inspect the border colors",
        );
    }
    events::performance_metric("flood_fill", result.timings.flood_fill_ms);
    events::performance_metric("replacement", result.timings.replacement_ms);
    debug!("{}", result.timing_summary());

    Ok(())
}

/// Print one border report per file, continuing past decode failures
fn analyze_files(cli: &Cli, config: &KeyingConfig, files: &[PathBuf]) -> Result<BatchSummary> {
    let _batch = spans::batch_processing(files.len()).entered();
    let classifier = config.classifier();
    let mut summary = BatchSummary::default();
    let mut reports = Vec::with_capacity(files.len());

    for input_file in files {
        let _span = spans::file_processing(input_file, "analyze").entered();
        match ImageIOService::load_rgba(input_file) {
            Ok(image) => {
                let report = BorderReport::new(
                    input_file.display().to_string(),
                    &image,
                    cli.top,
                    &classifier,
                );
                if !cli.json {
                    println!("{}", report.to_text());
                }
                reports.push(report);
                summary.processed += 1;
            },
            Err(e) => {
                summary.failed += 1;
                error!("❌ Failed to analyze {}: {}", input_file.display(), e);
            },
        }
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&reports)
            .context("Failed to serialize border reports")?;
        println!("{json}");
    }

    Ok(summary)
}
