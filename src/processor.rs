//! Background keying processor
//!
//! `BackgroundKeyer` ties the classifier, the flood fill and the replacement
//! pass together for one image at a time. It holds configuration only; no
//! state survives from one image to the next.

use crate::{
    classifier::{BackgroundClassifier, NearWhiteClassifier},
    config::KeyingConfig,
    error::Result,
    flood_fill::find_border_background,
    replacement::apply_key_color,
    services::{ImageIOService, ProcessingStage, ProgressTracker},
    types::{KeyingResult, KeyingStats, ProcessingTimings},
};
use image::{DynamicImage, Rgba, RgbaImage};
use instant::Instant;
use log::debug;
use std::path::Path;
use tracing::{debug as trace_debug, instrument, span, Level};

/// Flood fill plus replacement on one buffer, without timings or progress
pub(crate) fn key_in_place<C>(image: &mut RgbaImage, classifier: &C, key_color: Rgba<u8>) -> KeyingStats
where
    C: BackgroundClassifier + ?Sized,
{
    let (width, height) = image.dimensions();

    let outcome = {
        let _span = span!(Level::DEBUG, "flood_fill", width = width, height = height).entered();
        find_border_background(image, classifier)
    };
    let replaced_pixels = apply_key_color(image, &outcome.background, key_color);

    KeyingStats {
        width,
        height,
        seeds_enqueued: outcome.stats.seeds_enqueued,
        visited_pixels: outcome.stats.visited,
        background_pixels: outcome.stats.background,
        replaced_pixels,
    }
}

/// Keys border-connected background of images to a chroma-key color
pub struct BackgroundKeyer {
    config: KeyingConfig,
    classifier: NearWhiteClassifier,
    key_color: Rgba<u8>,
    progress_tracker: Option<ProgressTracker>,
}

impl BackgroundKeyer {
    /// Create a keyer from a configuration
    ///
    /// # Errors
    ///
    /// Returns `KeyingError::InvalidConfig` if the configuration does not
    /// validate (see [`KeyingConfig::validate`]).
    pub fn new(config: KeyingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: config.classifier(),
            key_color: config.key_color(),
            config,
            progress_tracker: None,
        })
    }

    /// Attach a progress tracker
    #[must_use]
    pub fn with_progress_tracker(mut self, tracker: ProgressTracker) -> Self {
        self.progress_tracker = Some(tracker);
        self
    }

    #[must_use]
    pub fn config(&self) -> &KeyingConfig {
        &self.config
    }

    fn report_stage(&mut self, stage: ProcessingStage) {
        if let Some(ref mut tracker) = self.progress_tracker {
            tracker.report_stage(stage);
        }
    }

    /// Key one pixel buffer in place.
    ///
    /// Runs the border-seeded flood fill and overwrites the background it
    /// finds with the key color. Total: degenerate buffers are a no-op.
    /// Running it again on its own output changes nothing.
    #[must_use = "the returned stats are the only record of what was keyed"]
    pub fn key_buffer(&self, image: &mut RgbaImage) -> KeyingStats {
        key_in_place(image, &self.classifier, self.key_color)
    }

    /// Key an owned RGBA buffer, recording timings and reporting progress
    #[instrument(skip(self, image), fields(dimensions = %format!("{}x{}", image.width(), image.height())))]
    pub fn key_image(&mut self, mut image: RgbaImage) -> KeyingResult {
        let total_start = Instant::now();
        let mut timings = ProcessingTimings::new();

        self.report_stage(ProcessingStage::FloodFill);
        let fill_start = Instant::now();
        let (width, height) = image.dimensions();
        let outcome = {
            let _span = span!(Level::DEBUG, "flood_fill", width = width, height = height).entered();
            find_border_background(&image, &self.classifier)
        };
        timings.flood_fill_ms = fill_start.elapsed().as_millis() as u64;

        trace_debug!(
            seeds = outcome.stats.seeds_enqueued,
            visited = outcome.stats.visited,
            background = outcome.stats.background,
            "Flood fill finished"
        );

        self.report_stage(ProcessingStage::Replacement);
        let replace_start = Instant::now();
        let replaced_pixels = apply_key_color(&mut image, &outcome.background, self.key_color);
        timings.replacement_ms = replace_start.elapsed().as_millis() as u64;
        timings.total_ms = total_start.elapsed().as_millis() as u64;

        let stats = KeyingStats {
            width,
            height,
            seeds_enqueued: outcome.stats.seeds_enqueued,
            visited_pixels: outcome.stats.visited,
            background_pixels: outcome.stats.background,
            replaced_pixels,
        };

        if self.config.debug {
            debug!(
                "Keyed {}x{}: {} of {} pixels background ({:.1}%)",
                width,
                height,
                stats.background_pixels,
                stats.total_pixels(),
                stats.background_ratio() * 100.0
            );
        }

        KeyingResult {
            image,
            background: outcome.background,
            stats,
            timings,
            input_path: None,
        }
    }

    /// Key a decoded image; any color model is normalised to RGBA8 first
    pub fn process_image(&mut self, image: &DynamicImage) -> KeyingResult {
        self.key_image(image.to_rgba8())
    }

    /// Decode and key an image file
    ///
    /// # Errors
    ///
    /// Returns `KeyingError` if the file cannot be read or decoded; the core
    /// is never run in that case.
    pub fn process_file<P: AsRef<Path>>(&mut self, input_path: P) -> Result<KeyingResult> {
        let input_path_ref = input_path.as_ref();

        self.report_stage(ProcessingStage::ImageLoading);
        let decode_start = Instant::now();
        let image = match ImageIOService::load_rgba(input_path_ref) {
            Ok(image) => image,
            Err(e) => {
                if let Some(ref tracker) = self.progress_tracker {
                    tracker.report_error(&e.to_string());
                }
                return Err(e);
            },
        };
        let decode_ms = decode_start.elapsed().as_millis() as u64;

        let mut result = self.key_image(image);
        result.timings.image_decode_ms = decode_ms;
        result.timings.total_ms += decode_ms;
        result.input_path = Some(input_path_ref.display().to_string());

        debug!(
            "Keyed {} ({}x{}): {} background pixels",
            input_path_ref.display(),
            result.stats.width,
            result.stats.height,
            result.stats.background_pixels
        );
        Ok(result)
    }

    /// Decode and key an image held in memory
    ///
    /// # Errors
    ///
    /// Returns `KeyingError::Processing` if the bytes cannot be decoded.
    pub fn process_bytes(&mut self, image_bytes: &[u8]) -> Result<KeyingResult> {
        self.report_stage(ProcessingStage::ImageLoading);
        let decode_start = Instant::now();
        let image = ImageIOService::load_from_bytes(image_bytes)?.to_rgba8();
        let decode_ms = decode_start.elapsed().as_millis() as u64;

        let mut result = self.key_image(image);
        result.timings.image_decode_ms = decode_ms;
        result.timings.total_ms += decode_ms;
        Ok(result)
    }

    /// Read an image from an async stream and key it.
    ///
    /// All awaiting happens before keying starts; the keying itself is
    /// synchronous.
    pub async fn process_reader<R: tokio::io::AsyncRead + Unpin>(
        &mut self,
        reader: R,
    ) -> Result<KeyingResult> {
        self.report_stage(ProcessingStage::ImageLoading);
        let decode_start = Instant::now();
        let image = ImageIOService::load_from_reader(reader).await?.to_rgba8();
        let decode_ms = decode_start.elapsed().as_millis() as u64;

        let mut result = self.key_image(image);
        result.timings.image_decode_ms = decode_ms;
        result.timings.total_ms += decode_ms;
        Ok(result)
    }

    /// Key a file and write the result, returning the finished result
    ///
    /// # Errors
    ///
    /// Decode or encode failures. An encode failure does not undo the
    /// in-memory keying; the returned error is the only signal.
    pub fn process_file_to<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        input_path: P,
        output_path: Q,
        format: crate::config::OutputFormat,
    ) -> Result<KeyingResult> {
        let mut result = self.process_file(input_path)?;

        self.report_stage(ProcessingStage::FileSaving);
        if let Err(e) = result.save_timed(&output_path, format) {
            if let Some(ref tracker) = self.progress_tracker {
                tracker.report_error(&e.to_string());
            }
            return Err(e);
        }

        self.report_stage(ProcessingStage::Completed);
        if let Some(ref tracker) = self.progress_tracker {
            tracker.report_completion(result.timings.clone());
        }
        Ok(result)
    }
}
