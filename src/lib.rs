#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # bgkey
//!
//! Border-seeded chroma-key background removal.
//!
//! Flat, light backgrounds (white or near-white, or already transparent) are
//! found by flooding inwards from the image border and replaced with a
//! reserved key color, `(255, 0, 255, 255)` by default. Regions that match
//! the background rule but are fenced off by foreground pixels, such as the
//! white inside of a logo, are left alone.
//!
//! ## Features
//!
//! - **Connectivity aware**: only background reachable from the border through
//!   4-connected background pixels is replaced
//! - **Idempotent**: the key color never classifies as background, so keying a
//!   keyed image changes nothing
//! - **Lossless output**: PNG, TIFF, lossless WebP or raw RGBA8
//! - **Border diagnostics**: histogram of the colors on an image's border
//! - **CLI Integration**: batch driver behind the `cli` feature
//!
//! ## Quick Start
//!
//! ```rust
//! use bgkey::{key_background, KEY_COLOR};
//! use image::{Rgba, RgbaImage};
//!
//! let mut image = RgbaImage::from_pixel(5, 5, Rgba([255, 255, 255, 255]));
//! image.put_pixel(2, 2, Rgba([0, 0, 0, 255]));
//!
//! let stats = key_background(&mut image);
//! assert_eq!(stats.background_pixels, 24);
//! assert_eq!(*image.get_pixel(0, 0), KEY_COLOR);
//! assert_eq!(*image.get_pixel(2, 2), Rgba([0, 0, 0, 255]));
//! ```
//!
//! ### With configuration
//!
//! ```rust,no_run
//! use bgkey::{BackgroundKeyer, KeyingConfig, OutputFormat};
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = KeyingConfig::builder().min_channel(190).build()?;
//! let mut keyer = BackgroundKeyer::new(config)?;
//! let result = keyer.process_file_to("logo.png", "logo_keyed.png", OutputFormat::Png)?;
//! println!("{}", result.timing_summary());
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): command-line driver, tracing subscriber and progress bars
//! - `webp-support` (default): lossless WebP input and output
//! - `tracing-json`: JSON log output for the CLI
//! - `tracing-files`: log file output for the CLI

pub mod classifier;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod flood_fill;
pub mod processor;
pub mod replacement;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

use tokio::io::AsyncRead;

// Public API exports
pub use classifier::{BackgroundClassifier, NearWhiteClassifier};
pub use config::{ClassifierConfig, KeyingConfig, KeyingConfigBuilder, OutputFormat, OutputMode};
pub use diagnostics::{BorderHistogram, BorderReport, ColorCount};
pub use error::{KeyingError, Result};
pub use flood_fill::{border_seeds, find_border_background, FillStats, FloodFillOutcome};
pub use processor::BackgroundKeyer;
pub use replacement::apply_key_color;
pub use services::{
    ConsoleProgressReporter, ImageIOService, NoOpProgressReporter, OutputFormatHandler,
    ProcessingStage, ProgressReporter, ProgressTracker, ProgressUpdate,
};
pub use types::{
    Coordinate, CoordinateSet, KeyingResult, KeyingStats, ProcessingTimings, KEY_COLOR,
};

#[cfg(feature = "cli")]
pub use tracing_config::{
    events, init_cli_tracing, spans, TracingConfig, TracingFormat, TracingOutput,
};

/// Key an RGBA buffer in place with the default classifier and key color.
///
/// This is the whole transform: border-seeded flood fill followed by the
/// replacement pass. It never fails; empty buffers are left untouched.
#[must_use = "the returned stats are the only record of what was keyed"]
pub fn key_background(image: &mut image::RgbaImage) -> KeyingStats {
    processor::key_in_place(image, &NearWhiteClassifier::default(), KEY_COLOR)
}

/// Key an image provided as encoded bytes
///
/// # Examples
///
/// ```rust,no_run
/// use bgkey::{key_background_from_bytes, KeyingConfig, OutputFormat};
///
/// # fn example(upload_bytes: Vec<u8>) -> anyhow::Result<()> {
/// let result = key_background_from_bytes(&upload_bytes, &KeyingConfig::default())?;
/// let png_bytes = result.to_bytes(OutputFormat::Png)?;
/// # Ok(())
/// # }
/// ```
pub fn key_background_from_bytes(image_bytes: &[u8], config: &KeyingConfig) -> Result<KeyingResult> {
    BackgroundKeyer::new(config.clone())?.process_bytes(image_bytes)
}

/// Key an already decoded `DynamicImage`
pub fn key_background_from_image(
    image: &image::DynamicImage,
    config: &KeyingConfig,
) -> Result<KeyingResult> {
    Ok(BackgroundKeyer::new(config.clone())?.process_image(image))
}

/// Key an image read from an async stream
///
/// # Examples
///
/// ```rust,no_run
/// use bgkey::{key_background_from_reader, KeyingConfig, OutputFormat};
/// use tokio::fs::File;
///
/// # async fn example() -> anyhow::Result<()> {
/// let file = File::open("sprite.png").await?;
/// let result = key_background_from_reader(file, &KeyingConfig::default()).await?;
/// result.save("sprite_keyed.png", OutputFormat::Png)?;
/// # Ok(())
/// # }
/// ```
pub async fn key_background_from_reader<R: AsyncRead + Unpin>(
    reader: R,
    config: &KeyingConfig,
) -> Result<KeyingResult> {
    BackgroundKeyer::new(config.clone())?
        .process_reader(reader)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_key_background_default() {
        let mut image = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 0]));
        let stats = key_background(&mut image);
        assert_eq!(stats.replaced_pixels, 9);
        assert!(image.pixels().all(|p| *p == KEY_COLOR));
    }

    #[test]
    fn test_key_background_from_bytes_and_image() {
        let image = RgbaImage::from_pixel(4, 2, Rgba([230, 230, 230, 255]));
        let bytes = ImageIOService::encode_rgba(&image, OutputFormat::Png).unwrap();
        let config = KeyingConfig::default();

        let from_bytes = key_background_from_bytes(&bytes, &config).unwrap();
        let from_image =
            key_background_from_image(&image::DynamicImage::ImageRgba8(image), &config).unwrap();
        assert_eq!(from_bytes.image, from_image.image);
        assert_eq!(from_bytes.stats.background_pixels, 8);
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let config = KeyingConfig {
            key_color: [255, 255, 255, 255],
            ..KeyingConfig::default()
        };
        let image = image::DynamicImage::new_rgba8(1, 1);
        assert!(key_background_from_image(&image, &config).is_err());
    }

    #[tokio::test]
    async fn test_key_background_from_reader() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let bytes = ImageIOService::encode_rgba(&image, OutputFormat::Png).unwrap();

        let result = key_background_from_reader(std::io::Cursor::new(bytes), &KeyingConfig::default())
            .await
            .unwrap();
        assert!(result.image.pixels().all(|p| *p == KEY_COLOR));
    }
}
