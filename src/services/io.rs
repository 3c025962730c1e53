//! Image I/O operations service
//!
//! Keeps decoding and encoding at the edges so the keying core only ever sees
//! in-memory RGBA buffers.

use crate::{
    config::OutputFormat,
    error::{KeyingError, Result},
    services::OutputFormatHandler,
};
use image::{DynamicImage, RgbaImage};
use std::path::Path;

/// Service for handling image file input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Load an image from a file path
    ///
    /// # Examples
    /// ```rust,no_run
    /// use bgkey::services::ImageIOService;
    ///
    /// let image = ImageIOService::load_image("sprite.png")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(KeyingError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                // Extension may lie about the container; retry on content
                log::debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based detection.",
                    path_ref.display(),
                    e
                );

                let data = std::fs::read(path_ref).map_err(|io_err| {
                    KeyingError::file_io_error("read image data", path_ref, &io_err)
                })?;

                image::load_from_memory(&data)
                    .map_err(|content_err| KeyingError::image_load_error(path_ref, &content_err))
            },
        }
    }

    /// Load an image from a file path and convert it to RGBA8
    pub fn load_rgba<P: AsRef<Path>>(path: P) -> Result<RgbaImage> {
        Ok(Self::load_image(path)?.to_rgba8())
    }

    /// Save an RGBA buffer to a file in the given lossless format.
    ///
    /// Parent directories are created as needed.
    pub fn save_rgba<P: AsRef<Path>>(image: &RgbaImage, path: P, format: OutputFormat) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    KeyingError::file_io_error("create output directory", parent, &e)
                })?;
            }
        }

        let Some(image_format) = OutputFormatHandler::image_format(format) else {
            return std::fs::write(path_ref, image.as_raw())
                .map_err(|e| KeyingError::file_io_error("write RGBA8 data", path_ref, &e));
        };

        image
            .save_with_format(path_ref, image_format)
            .map_err(|e| {
                KeyingError::processing_stage_error(
                    "image save",
                    &format!("Failed to save as {}: {}", format, e),
                    Some(&format!("format: {}, path: {}", format, path_ref.display())),
                )
            })
    }

    /// Encode an RGBA buffer into bytes in the given lossless format
    pub fn encode_rgba(image: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>> {
        let Some(image_format) = OutputFormatHandler::image_format(format) else {
            return Ok(image.as_raw().clone());
        };

        let mut buffer = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut buffer), image_format)
            .map_err(|e| KeyingError::processing(format!("Failed to encode {}: {}", format, e)))?;
        Ok(buffer)
    }

    /// Check if a file path has an extension the decoder accepts
    pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| {
                matches!(
                    ext.as_str(),
                    "png" | "jpg" | "jpeg" | "webp" | "tiff" | "tif" | "bmp" | "gif"
                )
            })
    }

    /// Load an image from bytes
    pub fn load_from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).map_err(|e| {
            KeyingError::processing(format!("Failed to decode image from bytes: {}", e))
        })
    }

    /// Load an image from an async reader
    ///
    /// # Examples
    /// ```rust,no_run
    /// use bgkey::services::ImageIOService;
    /// use tokio::fs::File;
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let file = File::open("sprite.png").await?;
    /// let image = ImageIOService::load_from_reader(file).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load_from_reader<R: tokio::io::AsyncRead + Unpin>(
        mut reader: R,
    ) -> Result<DynamicImage> {
        use tokio::io::AsyncReadExt;

        let mut buffer = Vec::new();
        AsyncReadExt::read_to_end(&mut reader, &mut buffer)
            .await
            .map_err(|e| KeyingError::processing(format!("Failed to read from stream: {}", e)))?;

        Self::load_from_bytes(&buffer)
    }

    /// Encode an RGBA buffer and write it to an async writer.
    ///
    /// Returns the number of bytes written.
    pub async fn save_to_writer<W: tokio::io::AsyncWrite + Unpin>(
        image: &RgbaImage,
        mut writer: W,
        format: OutputFormat,
    ) -> Result<u64> {
        use tokio::io::AsyncWriteExt;

        let bytes = Self::encode_rgba(image, format)?;

        AsyncWriteExt::write_all(&mut writer, &bytes)
            .await
            .map_err(|e| KeyingError::processing(format!("Failed to write to stream: {}", e)))?;
        AsyncWriteExt::flush(&mut writer)
            .await
            .map_err(|e| KeyingError::processing(format!("Failed to flush stream: {}", e)))?;

        Ok(bytes.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KEY_COLOR;
    use image::Rgba;
    use tempfile::tempdir;

    fn keyed_sample() -> RgbaImage {
        let mut image = RgbaImage::from_pixel(4, 3, KEY_COLOR);
        image.put_pixel(1, 1, Rgba([12, 34, 56, 255]));
        image.put_pixel(2, 1, Rgba([250, 250, 250, 255]));
        image
    }

    #[test]
    fn test_is_supported_format() {
        assert!(ImageIOService::is_supported_format("test.png"));
        assert!(ImageIOService::is_supported_format("test.JPG"));
        assert!(ImageIOService::is_supported_format("test.jpeg"));
        assert!(ImageIOService::is_supported_format("test.webp"));
        assert!(ImageIOService::is_supported_format("test.tif"));
        assert!(ImageIOService::is_supported_format("test.bmp"));
        assert!(ImageIOService::is_supported_format("test.gif"));
        assert!(ImageIOService::is_supported_format("/path/file.name.with.dots.PnG"));

        assert!(!ImageIOService::is_supported_format("test.txt"));
        assert!(!ImageIOService::is_supported_format("test"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let err = ImageIOService::load_image("nonexistent.png").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_load_corrupt_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let err = ImageIOService::load_rgba(&path).unwrap_err();
        assert!(matches!(err, KeyingError::Image(_)));
        assert!(err.to_string().contains("broken.png"));
    }

    #[test]
    fn test_load_with_wrong_extension_uses_content() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("actually_png.tiff");
        let bytes = ImageIOService::encode_rgba(&keyed_sample(), OutputFormat::Png).unwrap();
        std::fs::write(&path, bytes).unwrap();

        let loaded = ImageIOService::load_rgba(&path).unwrap();
        assert_eq!(loaded, keyed_sample());
    }

    #[test]
    fn test_png_roundtrip_preserves_key_color_exactly() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("keyed.png");

        ImageIOService::save_rgba(&keyed_sample(), &path, OutputFormat::Png).unwrap();
        let loaded = ImageIOService::load_rgba(&path).unwrap();

        assert_eq!(loaded, keyed_sample());
        assert_eq!(*loaded.get_pixel(0, 0), KEY_COLOR);
    }

    #[test]
    fn test_tiff_roundtrip_is_lossless() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("keyed.tiff");

        ImageIOService::save_rgba(&keyed_sample(), &path, OutputFormat::Tiff).unwrap();
        assert_eq!(ImageIOService::load_rgba(&path).unwrap(), keyed_sample());
    }

    #[cfg(feature = "webp-support")]
    #[test]
    fn test_webp_roundtrip_is_lossless() {
        let bytes = ImageIOService::encode_rgba(&keyed_sample(), OutputFormat::WebP).unwrap();
        let loaded = ImageIOService::load_from_bytes(&bytes).unwrap().to_rgba8();
        assert_eq!(loaded, keyed_sample());
    }

    #[test]
    fn test_save_rgba8_raw() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("keyed.raw");

        ImageIOService::save_rgba(&keyed_sample(), &path, OutputFormat::Rgba8).unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), 4 * 3 * 4);
        assert_eq!(&data[..4], &KEY_COLOR.0);
    }

    #[test]
    fn test_load_from_bytes_invalid() {
        assert!(ImageIOService::load_from_bytes(b"This is not an image").is_err());
        assert!(ImageIOService::load_from_bytes(&[]).is_err());
    }

    #[tokio::test]
    async fn test_reader_and_writer() {
        let mut written = Vec::new();
        let count = ImageIOService::save_to_writer(&keyed_sample(), &mut written, OutputFormat::Png)
            .await
            .unwrap();
        assert_eq!(count as usize, written.len());

        let loaded = ImageIOService::load_from_reader(std::io::Cursor::new(written))
            .await
            .unwrap();
        assert_eq!(loaded.to_rgba8(), keyed_sample());
    }
}
