//! Progress reporting service
//!
//! Keying stages are reported through a trait so the CLI, tests and library
//! callers can each decide what to do with them.

use crate::types::ProcessingTimings;
use instant::Instant;

/// Progress stages while keying an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Loading and decoding input image
    ImageLoading,
    /// Border-seeded flood fill over background pixels
    FloodFill,
    /// Writing the key color over detected background
    Replacement,
    /// Encoding and writing the result
    FileSaving,
    /// Processing completed
    Completed,

    // Batch processing stages
    /// Collecting and ordering input files
    BatchInitialization,
    /// Processing individual item in batch
    BatchItemProcessing,
    /// Finalizing batch processing
    BatchFinalization,
}

impl ProcessingStage {
    /// Get a human-readable description of the processing stage
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            ProcessingStage::ImageLoading => "Loading input image",
            ProcessingStage::FloodFill => "Tracing border-connected background",
            ProcessingStage::Replacement => "Applying key color",
            ProcessingStage::FileSaving => "Saving result",
            ProcessingStage::Completed => "Processing completed",

            ProcessingStage::BatchInitialization => "Collecting input files",
            ProcessingStage::BatchItemProcessing => "Processing batch item",
            ProcessingStage::BatchFinalization => "Finalizing batch processing",
        }
    }

    /// Get the typical progress percentage for this stage
    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        match self {
            ProcessingStage::ImageLoading => 10,
            ProcessingStage::FloodFill => 60,
            ProcessingStage::Replacement => 80,
            ProcessingStage::FileSaving => 95,
            ProcessingStage::Completed => 100,

            ProcessingStage::BatchInitialization => 5,
            ProcessingStage::BatchItemProcessing => 50, // Variable based on items
            ProcessingStage::BatchFinalization => 98,
        }
    }
}

/// Progress update containing stage and timing information
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Current processing stage
    pub stage: ProcessingStage,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Human-readable stage description
    pub description: String,
    /// Elapsed time since processing started (milliseconds)
    pub elapsed_ms: u64,
}

impl ProgressUpdate {
    #[must_use]
    pub fn new(stage: ProcessingStage, start_time: Instant) -> Self {
        Self {
            progress: stage.progress_percentage(),
            description: stage.description().to_string(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            stage,
        }
    }

    /// Create a progress update with custom description
    #[must_use]
    pub fn with_description(
        stage: ProcessingStage,
        description: String,
        start_time: Instant,
    ) -> Self {
        Self {
            progress: stage.progress_percentage(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            stage,
            description,
        }
    }
}

/// Statistics for batch processing operations
#[derive(Debug, Clone, Default)]
pub struct BatchProcessingStats {
    pub items_completed: usize,
    pub items_total: usize,
    pub items_failed: usize,
    /// Name/path of the current item being processed
    pub current_item_name: String,
    /// Processing rate in items per second
    pub processing_rate: f64,
}

/// Progress update for batch operations
#[derive(Debug, Clone)]
pub struct BatchProgressUpdate {
    /// Overall batch progress
    pub total_progress: ProgressUpdate,
    pub stats: BatchProcessingStats,
}

/// Trait for reporting progress during keying operations
pub trait ProgressReporter: Send + Sync {
    /// Report a progress update
    fn report_progress(&self, update: ProgressUpdate);

    /// Report processing completion with final timings
    fn report_completion(&self, timings: ProcessingTimings);

    /// Report an error during processing
    fn report_error(&self, stage: ProcessingStage, error: &str);

    /// Report batch progress; ignored unless a reporter opts in
    fn report_batch_progress(&self, update: BatchProgressUpdate) {
        drop(update);
    }
}

/// No-op progress reporter that discards all progress updates
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _update: ProgressUpdate) {}

    fn report_completion(&self, _timings: ProcessingTimings) {}

    fn report_error(&self, _stage: ProcessingStage, _error: &str) {}
}

/// Console progress reporter that logs progress through `log`
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

fn log_completion(timings: &ProcessingTimings, verbose: bool) {
    log::info!("✅ Keying completed in {}ms", timings.total_ms);

    if verbose {
        log::info!("  📊 Detailed timings:");
        log::info!("    • Image decode: {}ms", timings.image_decode_ms);
        log::info!("    • Flood fill: {}ms", timings.flood_fill_ms);
        log::info!("    • Replacement: {}ms", timings.replacement_ms);
        if let Some(encode_ms) = timings.image_encode_ms {
            log::info!("    • Image encode: {}ms", encode_ms);
        }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        if self.verbose {
            log::info!(
                "[{}%] {} ({}ms elapsed)",
                update.progress,
                update.description,
                update.elapsed_ms
            );
        } else {
            log::debug!("[{}%] {}", update.progress, update.description);
        }
    }

    fn report_completion(&self, timings: ProcessingTimings) {
        log_completion(&timings, self.verbose);
    }

    fn report_error(&self, stage: ProcessingStage, error: &str) {
        log::error!("❌ Error during {}: {}", stage.description(), error);
    }
}

/// Progress reporter that also renders batch totals
pub struct EnhancedProgressReporter {
    verbose: bool,
}

impl EnhancedProgressReporter {
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn progress_bar(percentage: u8) -> String {
        let filled = (usize::from(percentage.min(100)) * 20) / 100;
        let empty = 20 - filled;
        format!("{}{}", "█".repeat(filled), "░".repeat(empty))
    }
}

impl ProgressReporter for EnhancedProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        log::info!(
            "[{}] {}% {}",
            Self::progress_bar(update.progress),
            update.progress,
            update.description
        );
    }

    fn report_completion(&self, timings: ProcessingTimings) {
        log_completion(&timings, self.verbose);
    }

    fn report_error(&self, stage: ProcessingStage, error: &str) {
        log::error!("❌ Error during {}: {}", stage.description(), error);
    }

    fn report_batch_progress(&self, update: BatchProgressUpdate) {
        log::info!(
            "📁 Batch: {}/{} files, {} failed ({:.1} files/sec) - current: {}",
            update.stats.items_completed,
            update.stats.items_total,
            update.stats.items_failed,
            update.stats.processing_rate,
            update.stats.current_item_name
        );
        log::info!(
            "[{}] {}% Overall Progress",
            Self::progress_bar(update.total_progress.progress),
            update.total_progress.progress
        );
    }
}

/// Progress tracker that manages timing and progress reporting
pub struct ProgressTracker {
    reporter: Box<dyn ProgressReporter>,
    start_time: Instant,
    current_stage: Option<ProcessingStage>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(reporter: Box<dyn ProgressReporter>) -> Self {
        Self {
            reporter,
            start_time: Instant::now(),
            current_stage: None,
        }
    }

    /// Create a progress tracker with no-op reporter
    #[must_use]
    pub fn no_op() -> Self {
        Self::new(Box::new(NoOpProgressReporter))
    }

    #[must_use]
    pub fn console(verbose: bool) -> Self {
        Self::new(Box::new(ConsoleProgressReporter::new(verbose)))
    }

    /// Report progress for a specific stage
    pub fn report_stage(&mut self, stage: ProcessingStage) {
        self.current_stage = Some(stage.clone());
        let update = ProgressUpdate::new(stage, self.start_time);
        self.reporter.report_progress(update);
    }

    /// Report progress with custom description
    pub fn report_stage_with_description(&mut self, stage: ProcessingStage, description: String) {
        self.current_stage = Some(stage.clone());
        let update = ProgressUpdate::with_description(stage, description, self.start_time);
        self.reporter.report_progress(update);
    }

    pub fn report_completion(&self, timings: ProcessingTimings) {
        self.reporter.report_completion(timings);
    }

    /// Report an error against the most recent stage
    pub fn report_error(&self, error: &str) {
        let stage = self
            .current_stage
            .clone()
            .unwrap_or(ProcessingStage::ImageLoading);
        self.reporter.report_error(stage, error);
    }

    /// Report batch totals with a percentage derived from completed items
    pub fn report_batch(&self, stats: BatchProcessingStats) {
        let mut total_progress =
            ProgressUpdate::new(ProcessingStage::BatchItemProcessing, self.start_time);
        if stats.items_total > 0 {
            total_progress.progress = ((stats.items_completed * 100) / stats.items_total) as u8;
        }
        self.reporter.report_batch_progress(BatchProgressUpdate {
            total_progress,
            stats,
        });
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    #[must_use]
    pub fn current_stage(&self) -> Option<&ProcessingStage> {
        self.current_stage.as_ref()
    }
}

/// Create a progress reporter based on CLI flags
#[must_use]
pub fn create_cli_progress_reporter(enable_progress: bool, verbose: bool) -> Box<dyn ProgressReporter> {
    if enable_progress {
        Box::new(EnhancedProgressReporter::new(verbose))
    } else {
        Box::new(ConsoleProgressReporter::new(verbose))
    }
}
