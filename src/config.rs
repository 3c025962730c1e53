//! Configuration types for background keying operations

use crate::{
    classifier::{BackgroundClassifier, NearWhiteClassifier},
    error::{KeyingError, Result},
    types::KEY_COLOR,
};
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thresholds of the near-white background classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Every color channel must be strictly above this value
    pub min_channel: u8,
    /// `max(r, g, b) - min(r, g, b)` must be strictly below this value
    pub max_spread: u8,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_channel: NearWhiteClassifier::DEFAULT_MIN_CHANNEL,
            max_spread: NearWhiteClassifier::DEFAULT_MAX_SPREAD,
        }
    }
}

/// Output image format options.
///
/// Only lossless encodings are offered so the key color is written exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PNG with alpha channel
    #[default]
    Png,
    /// TIFF with alpha channel and lossless compression
    Tiff,
    /// Lossless WebP with alpha channel
    WebP,
    /// Raw RGBA8 pixel data (4 bytes per pixel)
    Rgba8,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "PNG"),
            Self::Tiff => write!(f, "TIFF"),
            Self::WebP => write!(f, "WebP"),
            Self::Rgba8 => write!(f, "RGBA8"),
        }
    }
}

/// Where keyed images are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Write `<stem>_keyed.<ext>` next to the input or into an output directory
    #[default]
    Suffix,
    /// Overwrite each input file
    InPlace,
}

/// Configuration for background keying operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyingConfig {
    /// Background classifier thresholds
    pub classifier: ClassifierConfig,

    /// RGBA color written over removed background
    pub key_color: [u8; 4],

    /// Output format
    pub output_format: OutputFormat,

    /// Output placement
    pub output_mode: OutputMode,

    /// Enable debug mode (additional logging)
    pub debug: bool,
}

impl Default for KeyingConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            key_color: KEY_COLOR.0,
            output_format: OutputFormat::default(),
            output_mode: OutputMode::default(),
            debug: false,
        }
    }
}

impl KeyingConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> KeyingConfigBuilder {
        KeyingConfigBuilder::new()
    }

    /// Key color as a pixel value
    #[must_use]
    pub fn key_color(&self) -> Rgba<u8> {
        Rgba(self.key_color)
    }

    /// Classifier described by this configuration
    #[must_use]
    pub fn classifier(&self) -> NearWhiteClassifier {
        NearWhiteClassifier::from_config(&self.classifier)
    }

    /// Validate the configuration.
    ///
    /// The key color must be rejected by the classifier; otherwise keying an
    /// already keyed image would spread into its foreground.
    pub fn validate(&self) -> Result<()> {
        if self.classifier.max_spread == 0 {
            return Err(KeyingError::config_value_error(
                "max_spread",
                self.classifier.max_spread,
                "1-255",
                Some(NearWhiteClassifier::DEFAULT_MAX_SPREAD),
            ));
        }

        if self.classifier().is_background(&self.key_color()) {
            return Err(KeyingError::invalid_config(format!(
                "key color {:?} is itself classified as background; re-keying would not be idempotent",
                self.key_color
            )));
        }

        Ok(())
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = std::fs::read_to_string(path_ref)
            .map_err(|e| KeyingError::file_io_error("read config file", path_ref, &e))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            KeyingError::serialization(format!(
                "Failed to parse config '{}': {}",
                path_ref.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for `KeyingConfig`
#[derive(Debug, Default)]
pub struct KeyingConfigBuilder {
    config: KeyingConfig,
}

impl KeyingConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    #[must_use]
    pub fn from_config(config: KeyingConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn min_channel(mut self, min_channel: u8) -> Self {
        self.config.classifier.min_channel = min_channel;
        self
    }

    #[must_use]
    pub fn max_spread(mut self, max_spread: u8) -> Self {
        self.config.classifier.max_spread = max_spread;
        self
    }

    #[must_use]
    pub fn key_color(mut self, key_color: [u8; 4]) -> Self {
        self.config.key_color = key_color;
        self
    }

    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    #[must_use]
    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.config.output_mode = mode;
        self
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `KeyingError::InvalidConfig` for a zero spread threshold or a
    /// key color the classifier would accept as background.
    pub fn build(self) -> Result<KeyingConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
