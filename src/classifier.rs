//! Background classification predicate
//!
//! Decides, one pixel at a time, whether a pixel may be removed as background.
//! Reachability from the border is decided separately by [`crate::flood_fill`].

use crate::config::ClassifierConfig;
use image::Rgba;

/// Pure pixel predicate used by the flood fill
pub trait BackgroundClassifier {
    /// Return `true` if `pixel` should be treated as removable background
    fn is_background(&self, pixel: &Rgba<u8>) -> bool;
}

impl<F> BackgroundClassifier for F
where
    F: Fn(&Rgba<u8>) -> bool,
{
    fn is_background(&self, pixel: &Rgba<u8>) -> bool {
        self(pixel)
    }
}

/// Near-white, low-saturation classifier.
///
/// Rules, evaluated in this order:
/// 1. any pixel that is not fully opaque (`alpha < 255`) is background;
/// 2. an opaque pixel is background iff every color channel is strictly above
///    `min_channel` and `max(r, g, b) - min(r, g, b)` is strictly below
///    `max_spread`;
/// 3. everything else is foreground.
///
/// A key color with a zero channel (such as magenta) always fails rule 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearWhiteClassifier {
    pub min_channel: u8,
    pub max_spread: u8,
}

impl NearWhiteClassifier {
    pub const DEFAULT_MIN_CHANNEL: u8 = 200;
    pub const DEFAULT_MAX_SPREAD: u8 = 30;

    #[must_use]
    pub fn new(min_channel: u8, max_spread: u8) -> Self {
        Self {
            min_channel,
            max_spread,
        }
    }

    #[must_use]
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.min_channel, config.max_spread)
    }
}

impl Default for NearWhiteClassifier {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_CHANNEL, Self::DEFAULT_MAX_SPREAD)
    }
}

impl BackgroundClassifier for NearWhiteClassifier {
    #[inline]
    fn is_background(&self, pixel: &Rgba<u8>) -> bool {
        let [r, g, b, a] = pixel.0;

        // Pre-existing transparency is always background
        if a < u8::MAX {
            return true;
        }

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        r > self.min_channel && g > self.min_channel && b > self.min_channel && max - min < self.max_spread
    }
}
