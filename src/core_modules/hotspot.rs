// THEORY:
// A `Hotspot` is one spatially coherent, high-density region of the crowd: a set of
// orthogonally connected cells whose normalized density exceeds a fraction of the peak.
//
// Key architectural principles:
// 1.  **Summary, not Mask**: The detector throws away the individual cell list and keeps
//     only what consumers need: a centroid, a mean intensity and an area.
// 2.  **Map Pixel Space**: Coordinates are in the density map's own grid, which may be
//     smaller than the source image. No resampling happens here.
// 3.  **Stateless Data Container**: A hotspot describes a single analysis call. It has no
//     identity across calls and no memory of earlier maps.

use serde::{Deserialize, Serialize};

/// A cell coordinate on the density grid. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        dx.hypot(dy)
    }
}

impl From<(usize, usize)> for Point {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (usize, usize) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// A connected high-density region of the normalized map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// Centroid of the region, each mean coordinate truncated to an integer.
    pub center: Point,
    /// Mean normalized density over the region's cells.
    pub intensity: f64,
    /// Number of cells in the region.
    pub area: usize,
}

/// Mean pairwise Euclidean distance between hotspot centers, 0 for fewer than two.
pub fn mean_pairwise_distance(hotspots: &[Hotspot]) -> f64 {
    if hotspots.len() < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, a) in hotspots.iter().enumerate() {
        for b in &hotspots[i + 1..] {
            total += a.center.distance(&b.center);
            pairs += 1;
        }
    }
    total / pairs as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: usize, y: usize) -> Hotspot {
        Hotspot {
            center: Point::new(x, y),
            intensity: 1.0,
            area: 25,
        }
    }

    #[test]
    fn serializes_center_as_pair() {
        let json = serde_json::to_value(at(3, 7)).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"center": [3, 7], "intensity": 1.0, "area": 25})
        );
    }

    #[test]
    fn pairwise_distance_averages_every_pair() {
        assert_eq!(mean_pairwise_distance(&[]), 0.0);
        assert_eq!(mean_pairwise_distance(&[at(1, 1)]), 0.0);

        // 3-4-5 triangle: distances 3, 4 and 5
        let spots = [at(0, 0), at(3, 0), at(0, 4)];
        assert!((mean_pairwise_distance(&spots) - 4.0).abs() < 1e-12);
    }
}
