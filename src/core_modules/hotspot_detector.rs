// THEORY:
// The `HotspotDetector` is the spatial grouping stage of the engine. It turns the
// normalized density map into a short list of `Hotspot`s: the places where the crowd
// is packed tightest.
//
// Algorithm steps:
// 1.  **Thresholding**: A cell is "hot" when its normalized density is strictly above
//     `threshold_ratio * peak`. An all-zero map therefore has no hot cells.
// 2.  **Region Growing**: Hot cells are grouped into maximal connected regions using
//     4-neighbor (up/down/left/right) adjacency. Growth is an iterative flood fill with
//     an explicit stack, so a region spanning the whole map cannot overflow the call
//     stack.
// 3.  **Noise Floor**: Regions of `MIN_HOTSPOT_AREA` cells or fewer are discarded as
//     model noise.
// 4.  **Data Aggregation**: Each surviving region is summarized into a centroid, a mean
//     normalized intensity and an area.
// 5.  **Stateless Utility**: `find_hotspots` looks at one map and remembers nothing.
//     Regions come out in raster order of their first cell; consumers should still treat
//     the list as an unordered set.

use crate::core_modules::density_map::NormalizedMap;
use crate::core_modules::hotspot::{Hotspot, Point};

pub mod hotspot_detector {
    use super::*;
    use tracing::{debug, trace};

    /// Regions with this many cells or fewer are treated as noise.
    pub const MIN_HOTSPOT_AREA: usize = 10;

    const NEIGHBORS: [(isize, isize); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

    /// Identifies every connected high-density region of `map`.
    pub fn find_hotspots(map: &NormalizedMap, threshold_ratio: f64) -> Vec<Hotspot> {
        let width = map.width();
        let height = map.height();
        let values = map.as_slice();

        // --- 1. Thresholding ---
        let threshold = threshold_ratio * map.max();
        let hot: Vec<bool> = values.iter().map(|&v| v > threshold).collect();

        // --- 2. Region Growing ---
        let mut visited = vec![false; values.len()];
        let mut hotspots = Vec::new();
        let mut discarded = 0usize;

        for start in 0..values.len() {
            if !hot[start] || visited[start] {
                continue;
            }

            let region = grow_region(start, &hot, &mut visited, width, height);

            // --- 3. Noise Floor ---
            if region.len() <= MIN_HOTSPOT_AREA {
                discarded += 1;
                continue;
            }

            // --- 4. Data Aggregation ---
            let hotspot = summarize_region(&region, values, width);
            trace!(
                x = hotspot.center.x,
                y = hotspot.center.y,
                area = hotspot.area,
                intensity = hotspot.intensity,
                "hotspot"
            );
            hotspots.push(hotspot);
        }

        debug!(
            threshold,
            hotspots = hotspots.len(),
            discarded,
            "hotspot detection complete"
        );
        hotspots
    }

    /// Flood fill from `start`, returning the flat indices of the whole region.
    fn grow_region(
        start: usize,
        hot: &[bool],
        visited: &mut [bool],
        width: usize,
        height: usize,
    ) -> Vec<usize> {
        let mut region = Vec::new();
        let mut stack = vec![start];
        visited[start] = true;

        while let Some(current) = stack.pop() {
            region.push(current);
            let (x, y) = ((current % width) as isize, (current / width) as isize);

            for (dx, dy) in NEIGHBORS {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                    continue;
                }
                let idx = ny as usize * width + nx as usize;
                if hot[idx] && !visited[idx] {
                    visited[idx] = true;
                    stack.push(idx);
                }
            }
        }

        region
    }

    fn summarize_region(region: &[usize], values: &[f64], width: usize) -> Hotspot {
        let area = region.len();
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut sum_v = 0.0;
        for &idx in region {
            sum_x += (idx % width) as f64;
            sum_y += (idx / width) as f64;
            sum_v += values[idx];
        }
        let n = area as f64;

        // Mean coordinates are truncated, never rounded up.
        Hotspot {
            center: Point::new((sum_x / n) as usize, (sum_y / n) as usize),
            intensity: sum_v / n,
            area,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::hotspot_detector::*;
    use crate::core_modules::density_map::{DensityMap, normalize};

    fn map_with_blocks(size: usize, blocks: &[(usize, usize, usize, f64)]) -> DensityMap {
        let mut data = vec![0.0; size * size];
        for &(x0, y0, side, value) in blocks {
            for y in y0..y0 + side {
                for x in x0..x0 + side {
                    data[y * size + x] = value;
                }
            }
        }
        DensityMap::new(size, size, data).expect("valid map")
    }

    #[test]
    fn zero_map_has_no_hotspots() {
        let map = DensityMap::zeros(50, 50).expect("valid map");
        assert!(find_hotspots(&normalize(&map), 0.25).is_empty());
    }

    #[test]
    fn single_block_yields_one_hotspot() {
        let map = map_with_blocks(50, &[(20, 20, 5, 1.0)]);
        let hotspots = find_hotspots(&normalize(&map), 0.25);
        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0].center.x, 22);
        assert_eq!(hotspots[0].center.y, 22);
        assert_eq!(hotspots[0].area, 25);
        assert!((hotspots[0].intensity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn small_regions_fall_below_noise_floor() {
        // 10 cells exactly is still noise; 12 cells survives
        let mut data = vec![0.0; 20 * 20];
        for x in 0..10 {
            data[x] = 1.0;
        }
        for x in 0..6 {
            data[10 * 20 + x] = 1.0;
            data[11 * 20 + x] = 1.0;
        }
        let map = DensityMap::new(20, 20, data).expect("valid map");
        let hotspots = find_hotspots(&normalize(&map), 0.25);
        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0].area, 12);
    }

    #[test]
    fn diagonal_contact_does_not_join_regions() {
        // two 4x4 squares touching only at a corner
        let map = map_with_blocks(12, &[(0, 0, 4, 1.0), (4, 4, 4, 1.0)]);
        let hotspots = find_hotspots(&normalize(&map), 0.25);
        assert_eq!(hotspots.len(), 2);
        assert!(hotspots.iter().all(|h| h.area == 16));
    }

    #[test]
    fn center_truncates_mean_coordinate() {
        // columns 10..=13, rows 0..=2: mean x = 11.5, mean y = 1.0
        let mut data = vec![0.0; 20 * 5];
        for y in 0..3 {
            for x in 10..14 {
                data[y * 20 + x] = 0.9;
            }
        }
        let map = DensityMap::new(20, 5, data).expect("valid map");
        let hotspots = find_hotspots(&normalize(&map), 0.25);
        assert_eq!(hotspots.len(), 1);
        assert_eq!((hotspots[0].center.x, hotspots[0].center.y), (11, 1));
    }

    #[test]
    fn intensity_is_mean_of_normalized_region() {
        let map = map_with_blocks(30, &[(2, 2, 4, 2.0), (20, 20, 4, 1.0)]);
        let mut hotspots = find_hotspots(&normalize(&map), 0.25);
        hotspots.sort_by_key(|h| h.center.x);
        assert!((hotspots[0].intensity - 1.0).abs() < 1e-12);
        assert!((hotspots[1].intensity - 0.5).abs() < 1e-12);
    }

    #[test]
    fn threshold_is_strict() {
        let map = map_with_blocks(30, &[(0, 0, 4, 1.0), (10, 10, 4, 0.25)]);
        let hotspots = find_hotspots(&normalize(&map), 0.25);
        assert_eq!(hotspots.len(), 1);
    }

    #[test]
    fn raising_threshold_never_adds_area() {
        // a smooth mound: density falls off with distance from (15, 15)
        let size = 31;
        let data: Vec<f64> = (0..size * size)
            .map(|i| {
                let (x, y) = ((i % size) as f64, (i / size) as f64);
                let d2 = (x - 15.0).powi(2) + (y - 15.0).powi(2);
                (-d2 / 50.0).exp()
            })
            .collect();
        let map = normalize(&DensityMap::new(size, size, data).expect("valid map"));

        let mut last_count = usize::MAX;
        let mut last_area = usize::MAX;
        for ratio in [0.1, 0.25, 0.5, 0.75, 0.9] {
            let hotspots = find_hotspots(&map, ratio);
            let area: usize = hotspots.iter().map(|h| h.area).sum();
            assert!(hotspots.len() <= last_count);
            assert!(area <= last_area);
            last_count = hotspots.len();
            last_area = area;
        }
    }
}
