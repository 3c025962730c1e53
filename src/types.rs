//! Core types for background keying operations

use crate::{config::OutputFormat, error::Result, services::ImageIOService};
use image::{Rgba, RgbaImage};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pixel coordinate `(x, y)` inside a pixel buffer
pub type Coordinate = (u32, u32);

/// Reserved chroma-key color written over removed background
pub const KEY_COLOR: Rgba<u8> = Rgba([255, 0, 255, 255]);

/// Set of coordinates over a fixed `width` x `height` extent.
///
/// Backed by a dense bitmap, so membership checks and inserts are O(1) and
/// iteration is in row-major order. Coordinates outside the extent are never
/// members: `insert` rejects them and `contains` reports `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateSet {
    width: u32,
    height: u32,
    members: Vec<bool>,
    len: usize,
}

impl CoordinateSet {
    /// Create an empty set covering a `width` x `height` grid
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            members: vec![false; width as usize * height as usize],
            len: 0,
        }
    }

    /// Width of the covered grid
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the covered grid
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, (x, y): Coordinate) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Add a coordinate; returns `true` if it was not already present
    pub fn insert(&mut self, coordinate: Coordinate) -> bool {
        let Some(idx) = self.index(coordinate) else {
            return false;
        };
        match self.members.get_mut(idx) {
            Some(slot) if !*slot => {
                *slot = true;
                self.len += 1;
                true
            },
            _ => false,
        }
    }

    #[must_use]
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        self.index(coordinate)
            .and_then(|idx| self.members.get(idx))
            .copied()
            .unwrap_or(false)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate members in row-major order
    pub fn iter(&self) -> impl Iterator<Item = Coordinate> + '_ {
        let width = self.width.max(1) as usize;
        self.members
            .iter()
            .enumerate()
            .filter(|(_, member)| **member)
            .map(move |(idx, _)| ((idx % width) as u32, (idx / width) as u32))
    }
}

/// Counters collected while keying one image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyingStats {
    pub width: u32,
    pub height: u32,
    /// Border seeds pushed onto the queue, duplicates included
    pub seeds_enqueued: usize,
    /// Distinct pixels dequeued and classified
    pub visited_pixels: usize,
    /// Pixels classified as border-connected background
    pub background_pixels: usize,
    /// Pixels overwritten with the key color
    pub replaced_pixels: usize,
}

impl KeyingStats {
    #[must_use]
    pub fn total_pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Fraction of the image replaced by the key color (0.0 for empty images)
    #[must_use]
    pub fn background_ratio(&self) -> f64 {
        let total = self.total_pixels();
        if total == 0 {
            0.0
        } else {
            self.background_pixels as f64 / total as f64
        }
    }
}

/// Detailed timing breakdown for keying one image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingTimings {
    /// Image loading and decoding from file
    pub image_decode_ms: u64,

    /// Border-seeded flood fill, classification included
    pub flood_fill_ms: u64,

    /// Writing the key color
    pub replacement_ms: u64,

    /// Final image encoding (if saving to file)
    pub image_encode_ms: Option<u64>,

    /// Total end-to-end processing time
    pub total_ms: u64,
}

impl ProcessingTimings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn measured_ms(&self) -> u64 {
        self.image_decode_ms
            + self.flood_fill_ms
            + self.replacement_ms
            + self.image_encode_ms.unwrap_or(0)
    }

    /// Get breakdown percentages
    #[must_use]
    pub fn breakdown_percentages(&self) -> TimingBreakdown {
        if self.total_ms == 0 {
            return TimingBreakdown::default();
        }

        let total = self.total_ms as f64;
        TimingBreakdown {
            decode_pct: (self.image_decode_ms as f64 / total) * 100.0,
            flood_fill_pct: (self.flood_fill_ms as f64 / total) * 100.0,
            replacement_pct: (self.replacement_ms as f64 / total) * 100.0,
            encode_pct: (self.image_encode_ms.unwrap_or(0) as f64 / total) * 100.0,
            other_pct: (self.other_overhead_ms() as f64 / total) * 100.0,
        }
    }

    /// Get the "other" overhead time (unaccounted time)
    #[must_use]
    pub fn other_overhead_ms(&self) -> u64 {
        self.total_ms.saturating_sub(self.measured_ms())
    }
}

/// Percentage breakdown of timing phases
#[derive(Debug, Clone, Default)]
pub struct TimingBreakdown {
    pub decode_pct: f64,
    pub flood_fill_pct: f64,
    pub replacement_pct: f64,
    pub encode_pct: f64,
    pub other_pct: f64,
}

/// Result of keying one image
#[derive(Debug, Clone)]
pub struct KeyingResult {
    /// The keyed image; background replaced by the key color
    pub image: RgbaImage,

    /// Coordinates that were classified as border-connected background
    pub background: CoordinateSet,

    pub stats: KeyingStats,

    pub timings: ProcessingTimings,

    /// Original input path (for logging purposes)
    pub input_path: Option<String>,
}

impl KeyingResult {
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    #[must_use]
    pub fn timings(&self) -> &ProcessingTimings {
        &self.timings
    }

    /// True when no pixel was replaced (e.g. an already keyed image)
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.stats.replaced_pixels == 0
    }

    /// Save in the specified lossless format
    pub fn save<P: AsRef<Path>>(&self, path: P, format: OutputFormat) -> Result<()> {
        ImageIOService::save_rgba(&self.image, path, format)
    }

    /// Save and record encoding time in the result's timings
    pub fn save_timed<P: AsRef<Path>>(&mut self, path: P, format: OutputFormat) -> Result<()> {
        let encode_start = instant::Instant::now();
        self.save(&path, format)?;
        let encode_ms = encode_start.elapsed().as_millis() as u64;

        self.timings.image_encode_ms = Some(encode_ms);
        self.timings.total_ms += encode_ms;

        info!(
            "Keyed: {} -> {} ({} background pixels) in {:.2}s",
            self.input_path.as_deref().unwrap_or("input"),
            path.as_ref().display(),
            self.stats.background_pixels,
            self.timings.total_ms as f64 / 1000.0
        );
        Ok(())
    }

    /// Encode the keyed image into bytes
    pub fn to_bytes(&self, format: OutputFormat) -> Result<Vec<u8>> {
        ImageIOService::encode_rgba(&self.image, format)
    }

    /// Get timing summary for display
    #[must_use]
    pub fn timing_summary(&self) -> String {
        let t = &self.timings;
        let breakdown = t.breakdown_percentages();

        let mut summary = format!(
            "Total: {}ms | Decode: {}ms ({:.1}%) | Flood fill: {}ms ({:.1}%) | Replace: {}ms ({:.1}%)",
            t.total_ms,
            t.image_decode_ms,
            breakdown.decode_pct,
            t.flood_fill_ms,
            breakdown.flood_fill_pct,
            t.replacement_ms,
            breakdown.replacement_pct
        );

        if let Some(encode_ms) = t.image_encode_ms {
            summary.push_str(&format!(
                " | Encode: {}ms ({:.1}%)",
                encode_ms, breakdown.encode_pct
            ));
        }

        summary
    }
}
