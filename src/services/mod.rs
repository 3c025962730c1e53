//! Service layer
//!
//! Infrastructure around the keying core: image codecs, output formats and
//! progress reporting.

pub mod format;
pub mod io;
pub mod progress;

pub use format::OutputFormatHandler;
pub use io::ImageIOService;
pub use progress::{
    create_cli_progress_reporter, BatchProcessingStats, BatchProgressUpdate,
    ConsoleProgressReporter, EnhancedProgressReporter, NoOpProgressReporter, ProcessingStage,
    ProgressReporter, ProgressTracker, ProgressUpdate,
};
