//! Border-seeded connectivity flood fill
//!
//! Computes the set of pixels reachable from the image border through
//! background-classified pixels, using 4-connectivity. Background-colored
//! islands that are fenced off by foreground pixels are never visited.

use crate::{
    classifier::BackgroundClassifier,
    types::{Coordinate, CoordinateSet},
};
use image::RgbaImage;
use std::collections::VecDeque;

/// Offsets of the 4-connected neighbours: left, right, up, down
const NEIGHBOURS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Counters gathered during one fill
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillStats {
    /// Border seeds pushed onto the queue, duplicates included
    pub seeds_enqueued: usize,
    /// Distinct coordinates dequeued and classified
    pub visited: usize,
    /// Coordinates added to the background set
    pub background: usize,
}

/// Output of [`find_border_background`]
#[derive(Debug, Clone)]
pub struct FloodFillOutcome {
    /// Coordinates confirmed as border-connected background
    pub background: CoordinateSet,
    /// Every coordinate that was dequeued and classified
    pub visited: CoordinateSet,
    pub stats: FillStats,
}

/// Enumerate the border seeds of a `width` x `height` grid.
///
/// Yields `(x, 0)` and `(x, height - 1)` for every column, then `(0, y)` and
/// `(width - 1, y)` for every row. Corners come out twice, and a single row or
/// column yields each of its pixels twice. Consumers deduplicate through the
/// visited set. An empty grid yields nothing.
pub fn border_seeds(width: u32, height: u32) -> impl Iterator<Item = Coordinate> {
    let (last_x, last_y) = (width.saturating_sub(1), height.saturating_sub(1));
    let non_empty = width > 0 && height > 0;
    let columns = if non_empty { 0..width } else { 0..0 };
    let rows = if non_empty { 0..height } else { 0..0 };

    columns
        .flat_map(move |x| [(x, 0), (x, last_y)])
        .chain(rows.flat_map(move |y| [(0, y), (last_x, y)]))
}

/// Find every background pixel connected to the border.
///
/// Breadth-first over a FIFO queue. Each coordinate is classified at most
/// once; only pixels the classifier accepts are expanded, so the fill stops at
/// the first foreground pixel on every path. Runs in O(width x height) time
/// and space. Zero-sized images produce an empty outcome.
pub fn find_border_background<C>(image: &RgbaImage, classifier: &C) -> FloodFillOutcome
where
    C: BackgroundClassifier + ?Sized,
{
    let (width, height) = image.dimensions();
    let mut visited = CoordinateSet::new(width, height);
    let mut background = CoordinateSet::new(width, height);
    let mut stats = FillStats::default();

    let mut queue: VecDeque<Coordinate> = border_seeds(width, height).collect();
    stats.seeds_enqueued = queue.len();

    while let Some((x, y)) = queue.pop_front() {
        if !visited.insert((x, y)) {
            continue;
        }

        let Some(pixel) = image.get_pixel_checked(x, y) else {
            continue;
        };
        if !classifier.is_background(pixel) {
            continue;
        }
        background.insert((x, y));

        for (dx, dy) in NEIGHBOURS {
            let nx = i64::from(x) + dx;
            let ny = i64::from(y) + dy;
            if nx < 0 || ny < 0 || nx >= i64::from(width) || ny >= i64::from(height) {
                continue;
            }
            let neighbour = (nx as u32, ny as u32);
            if !visited.contains(neighbour) {
                queue.push_back(neighbour);
            }
        }
    }

    stats.visited = visited.len();
    stats.background = background.len();

    FloodFillOutcome {
        background,
        visited,
        stats,
    }
}
