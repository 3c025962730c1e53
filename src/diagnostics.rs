//! Border color diagnostics
//!
//! Counts the colors found on an image's border so a human can check what
//! the keyer will treat as its seed colors. Nothing here feeds back into the
//! keying decision.

use crate::{
    classifier::BackgroundClassifier,
    flood_fill::border_seeds,
    types::CoordinateSet,
};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Color frequencies over the distinct border pixels of one image
#[derive(Debug, Clone, Default)]
pub struct BorderHistogram {
    counts: HashMap<[u8; 4], usize>,
    total: usize,
}

impl BorderHistogram {
    /// Count border colors, visiting each border coordinate once
    #[must_use]
    pub fn from_image(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let mut seen = CoordinateSet::new(width, height);
        let mut histogram = Self::default();

        for (x, y) in border_seeds(width, height) {
            if !seen.insert((x, y)) {
                continue;
            }
            if let Some(pixel) = image.get_pixel_checked(x, y) {
                *histogram.counts.entry(pixel.0).or_insert(0) += 1;
                histogram.total += 1;
            }
        }

        histogram
    }

    /// Number of border pixels counted
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of distinct border colors
    #[must_use]
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn count(&self, color: Rgba<u8>) -> usize {
        self.counts.get(&color.0).copied().unwrap_or(0)
    }

    /// The `n` most frequent colors, most frequent first.
    ///
    /// Equal counts are ordered by channel values ascending so the output is
    /// stable between runs.
    #[must_use]
    pub fn most_common(&self, n: usize) -> Vec<(Rgba<u8>, usize)> {
        let mut entries: Vec<_> = self.counts.iter().map(|(c, n)| (*c, *n)).collect();
        entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
            .into_iter()
            .take(n)
            .map(|(color, count)| (Rgba(color), count))
            .collect()
    }

    /// Fraction of border pixels the classifier accepts (0.0 when empty)
    #[must_use]
    pub fn background_share<C: BackgroundClassifier + ?Sized>(&self, classifier: &C) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let accepted: usize = self
            .counts
            .iter()
            .filter(|(color, _)| classifier.is_background(&Rgba(**color)))
            .map(|(_, count)| count)
            .sum();
        accepted as f64 / self.total as f64
    }
}

/// One line of a border report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorCount {
    pub rgba: [u8; 4],
    pub count: usize,
}

/// Serializable summary of an image's border colors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderReport {
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub border_pixels: usize,
    pub distinct_colors: usize,
    pub top_colors: Vec<ColorCount>,
    /// Fraction of border pixels classified as background
    pub background_share: f64,
}

impl BorderReport {
    #[must_use]
    pub fn new<C: BackgroundClassifier + ?Sized>(
        path: impl Into<String>,
        image: &RgbaImage,
        top: usize,
        classifier: &C,
    ) -> Self {
        let histogram = BorderHistogram::from_image(image);
        Self {
            path: path.into(),
            width: image.width(),
            height: image.height(),
            border_pixels: histogram.total(),
            distinct_colors: histogram.distinct(),
            top_colors: histogram
                .most_common(top)
                .into_iter()
                .map(|(color, count)| ColorCount {
                    rgba: color.0,
                    count,
                })
                .collect(),
            background_share: histogram.background_share(classifier),
        }
    }

    /// Human-readable multi-line rendering
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = format!(
            "File: {} ({}x{})\nBorder pixels: {} ({} distinct colors, {:.1}% background)\n",
            self.path,
            self.width,
            self.height,
            self.border_pixels,
            self.distinct_colors,
            self.background_share * 100.0
        );
        for entry in &self.top_colors {
            let [r, g, b, a] = entry.rgba;
            text.push_str(&format!("  ({:3}, {:3}, {:3}, {:3})  x{}\n", r, g, b, a, entry.count));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::NearWhiteClassifier;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn test_counts_each_border_pixel_once() {
        let image = RgbaImage::from_pixel(4, 3, WHITE);
        let histogram = BorderHistogram::from_image(&image);
        // 4x3 has 10 distinct border pixels although 14 seeds are enumerated
        assert_eq!(histogram.total(), 10);
        assert_eq!(histogram.count(WHITE), 10);
        assert_eq!(histogram.distinct(), 1);
    }

    #[test]
    fn test_interior_is_ignored() {
        let mut image = RgbaImage::from_pixel(3, 3, WHITE);
        image.put_pixel(1, 1, BLACK);
        let histogram = BorderHistogram::from_image(&image);
        assert_eq!(histogram.count(BLACK), 0);
        assert_eq!(histogram.total(), 8);
    }

    #[test]
    fn test_most_common_ordering() {
        let mut image = RgbaImage::from_pixel(4, 4, WHITE);
        let red = Rgba([255, 0, 0, 255]);
        let blue = Rgba([0, 0, 255, 255]);
        image.put_pixel(0, 0, red);
        image.put_pixel(3, 3, red);
        image.put_pixel(3, 0, blue);
        image.put_pixel(0, 3, BLACK);

        let top = BorderHistogram::from_image(&image).most_common(5);
        assert_eq!(
            top,
            vec![(WHITE, 8), (red, 2), (BLACK, 1), (blue, 1)]
        );

        let top_two = BorderHistogram::from_image(&image).most_common(2);
        assert_eq!(top_two.len(), 2);
    }

    #[test]
    fn test_background_share() {
        let mut image = RgbaImage::from_pixel(3, 3, WHITE);
        image.put_pixel(0, 0, BLACK);
        image.put_pixel(2, 2, BLACK);
        let histogram = BorderHistogram::from_image(&image);
        let share = histogram.background_share(&NearWhiteClassifier::default());
        assert!((share - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_empty_image() {
        let histogram = BorderHistogram::from_image(&RgbaImage::new(0, 0));
        assert_eq!(histogram.total(), 0);
        assert!(histogram.most_common(3).is_empty());
        assert!(histogram
            .background_share(&NearWhiteClassifier::default())
            .abs()
            < f64::EPSILON);
    }

    #[test]
    fn test_report_json_and_text() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0]));
        let report = BorderReport::new("logo_1.png", &image, 5, &NearWhiteClassifier::default());
        assert_eq!(report.border_pixels, 4);
        assert_eq!(report.top_colors, vec![ColorCount { rgba: [0, 0, 0, 0], count: 4 }]);
        assert!((report.background_share - 1.0).abs() < 1e-9);

        let json = serde_json::to_string(&report).unwrap();
        let parsed: BorderReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);

        let text = report.to_text();
        assert!(text.contains("logo_1.png"));
        assert!(text.contains("x4"));
    }
}
