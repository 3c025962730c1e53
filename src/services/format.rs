//! Output format handling service
//!
//! Maps between `OutputFormat`, file extensions and encoder formats.

use crate::{
    config::OutputFormat,
    error::{KeyingError, Result},
};
use image::ImageFormat;
use std::path::Path;

/// Service for handling output format lookups
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Get the file extension for a given output format (without the dot)
    ///
    /// # Examples
    /// ```rust
    /// use bgkey::{services::OutputFormatHandler, config::OutputFormat};
    ///
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Png), "png");
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Rgba8), "raw");
    /// ```
    #[must_use]
    pub fn get_extension(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Rgba8 => "raw",
        }
    }

    /// Encoder used for a format; `None` for raw pixel dumps
    #[must_use]
    pub fn image_format(format: OutputFormat) -> Option<ImageFormat> {
        match format {
            OutputFormat::Png => Some(ImageFormat::Png),
            OutputFormat::WebP => Some(ImageFormat::WebP),
            OutputFormat::Tiff => Some(ImageFormat::Tiff),
            OutputFormat::Rgba8 => None,
        }
    }

    /// Infer the output format from a path's extension.
    ///
    /// Used for in-place writes, where the file keeps its own container.
    /// Lossy containers are rejected: a re-encoded JPEG would smear the key
    /// color into its neighbours.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<OutputFormat> {
        let path_ref = path.as_ref();
        let extension = path_ref
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "png" => Ok(OutputFormat::Png),
            "tif" | "tiff" => Ok(OutputFormat::Tiff),
            "webp" => Ok(OutputFormat::WebP),
            "raw" | "rgba" => Ok(OutputFormat::Rgba8),
            "" => Err(KeyingError::unsupported_format(format!(
                "'{}' has no file extension",
                path_ref.display()
            ))),
            other => Err(KeyingError::unsupported_format(format!(
                "cannot write keyed output as '.{}' ({}); choose png, tiff or webp",
                other,
                path_ref.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_extension() {
        assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Png), "png");
        assert_eq!(
            OutputFormatHandler::get_extension(OutputFormat::WebP),
            "webp"
        );
        assert_eq!(
            OutputFormatHandler::get_extension(OutputFormat::Tiff),
            "tiff"
        );
        assert_eq!(
            OutputFormatHandler::get_extension(OutputFormat::Rgba8),
            "raw"
        );
    }

    #[test]
    fn test_image_format() {
        assert_eq!(
            OutputFormatHandler::image_format(OutputFormat::Png),
            Some(ImageFormat::Png)
        );
        assert_eq!(OutputFormatHandler::image_format(OutputFormat::Rgba8), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            OutputFormatHandler::from_path("a/b/logo.PNG").unwrap(),
            OutputFormat::Png
        );
        assert_eq!(
            OutputFormatHandler::from_path("scan.tif").unwrap(),
            OutputFormat::Tiff
        );
        assert_eq!(
            OutputFormatHandler::from_path("icon.webp").unwrap(),
            OutputFormat::WebP
        );
    }

    #[test]
    fn test_from_path_rejects_lossy_and_unknown() {
        let err = OutputFormatHandler::from_path("photo.jpg").unwrap_err();
        assert!(matches!(err, KeyingError::UnsupportedFormat(_)));
        assert!(err.to_string().contains(".jpg"));

        assert!(OutputFormatHandler::from_path("noext").is_err());
    }
}
