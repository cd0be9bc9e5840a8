// THEORY:
// The `filters` module provides the two numeric primitives the flow and risk stages
// share: Gaussian smoothing and a discrete gradient. Both are plain O(H*W) passes over
// a row-major buffer.
//
// Gaussian smoothing is separable, so it runs as a horizontal 1-D pass followed by a
// vertical one. The kernel reaches four standard deviations on each side and borders
// are mirrored ("d c b a | a b c d"), which keeps a constant map exactly constant. The
// gradient uses central differences in the interior and one-sided differences on the
// outermost cells.

use crate::core_modules::density_map::DensityMap;

/// How many standard deviations the kernel extends on each side.
const KERNEL_TRUNCATE: f64 = 4.0;

/// Builds a normalized 1-D Gaussian kernel of length `2 * radius + 1`.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (KERNEL_TRUNCATE * sigma + 0.5).floor() as isize;
    if sigma <= 0.0 || radius == 0 {
        return vec![1.0];
    }
    let denom = 2.0 * sigma * sigma;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|i| (-((i * i) as f64) / denom).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Maps an out-of-range index back into `0..n` by half-sample mirroring.
fn reflect_index(i: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    let m = i.rem_euclid(period);
    if m < n { m as usize } else { (period - 1 - m) as usize }
}

fn convolve_axis(
    src: &[f64],
    width: usize,
    height: usize,
    kernel: &[f64],
    horizontal: bool,
) -> Vec<f64> {
    let radius = (kernel.len() / 2) as isize;
    let mut out = vec![0.0; src.len()];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let offset = k as isize - radius;
                let idx = if horizontal {
                    y * width + reflect_index(x as isize + offset, width)
                } else {
                    reflect_index(y as isize + offset, height) * width + x
                };
                acc += w * src[idx];
            }
            out[y * width + x] = acc;
        }
    }
    out
}

/// Isotropic Gaussian smoothing with standard deviation `sigma` (in cells).
pub fn gaussian_filter(map: &DensityMap, sigma: f64) -> DensityMap {
    let (width, height) = (map.width(), map.height());
    let kernel = gaussian_kernel(sigma);
    let rows = convolve_axis(map.as_slice(), width, height, &kernel, true);
    let smoothed = convolve_axis(&rows, width, height, &kernel, false);
    DensityMap::from_raw(width, height, smoothed)
}

/// Partial derivatives of a map along x (columns) and y (rows).
#[derive(Debug, Clone)]
pub struct GradientField {
    pub width: usize,
    pub height: usize,
    pub gx: Vec<f64>,
    pub gy: Vec<f64>,
}

/// First derivative of a 1-D sequence sampled with stride `stride`.
fn derivative(src: &[f64], start: usize, stride: usize, n: usize, out: &mut [f64]) {
    if n < 2 {
        return;
    }
    let at = |i: usize| src[start + i * stride];
    out[start] = at(1) - at(0);
    for i in 1..n - 1 {
        out[start + i * stride] = (at(i + 1) - at(i - 1)) / 2.0;
    }
    out[start + (n - 1) * stride] = at(n - 1) - at(n - 2);
}

/// Central-difference gradient. An axis of length 1 has a zero derivative.
pub fn gradient(map: &DensityMap) -> GradientField {
    let (width, height) = (map.width(), map.height());
    let src = map.as_slice();
    let mut gx = vec![0.0; src.len()];
    let mut gy = vec![0.0; src.len()];

    for y in 0..height {
        derivative(src, y * width, 1, width, &mut gx);
    }
    for x in 0..width {
        derivative(src, x, width, height, &mut gy);
    }

    GradientField {
        width,
        height,
        gx,
        gy,
    }
}

impl GradientField {
    pub fn magnitude(&self) -> Vec<f64> {
        self.gx
            .iter()
            .zip(&self.gy)
            .map(|(gx, gy)| gx.hypot(*gy))
            .collect()
    }

    /// Direction of steepest ascent per cell, in degrees within [-180, 180].
    pub fn direction_degrees(&self) -> Vec<f64> {
        self.gx
            .iter()
            .zip(&self.gy)
            .map(|(gx, gy)| gy.atan2(*gx).to_degrees())
            .collect()
    }

    pub fn max_magnitude(&self) -> f64 {
        self.magnitude().into_iter().fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(rows: Vec<Vec<f64>>) -> DensityMap {
        DensityMap::from_rows(rows).expect("valid map")
    }

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(3.0);
        assert_eq!(kernel.len(), 25);
        assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((kernel[0] - kernel[24]).abs() < 1e-15);
        assert!(kernel[12] > kernel[11]);
    }

    #[test]
    fn reflect_mirrors_around_edges() {
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
        // wider than the axis: bounces back and forth
        assert_eq!(reflect_index(9, 4), 1);
        assert_eq!(reflect_index(3, 1), 0);
    }

    #[test]
    fn smoothing_preserves_constant_and_mass() {
        let constant = DensityMap::filled(7, 5, 0.5).expect("valid map");
        let smoothed = gaussian_filter(&constant, 3.0);
        for v in smoothed.as_slice() {
            assert!((v - 0.5).abs() < 1e-12);
        }

        let mut data = vec![0.0; 41 * 41];
        data[20 * 41 + 20] = 1.0;
        let impulse = DensityMap::new(41, 41, data).expect("valid map");
        let blurred = gaussian_filter(&impulse, 2.0);
        assert!((blurred.sum() - 1.0).abs() < 1e-9);
        assert!(blurred.get(20, 20).unwrap_or(0.0) < 1.0);
        assert!(blurred.get(21, 20) == blurred.get(19, 20));
    }

    #[test]
    fn gradient_matches_central_differences() {
        let field = gradient(&map(vec![vec![0.0, 1.0, 4.0, 9.0]]));
        assert_eq!(field.gx, vec![1.0, 2.0, 4.0, 5.0]);
        assert_eq!(field.gy, vec![0.0; 4]);

        let field = gradient(&map(vec![vec![0.0], vec![2.0], vec![2.0]]));
        assert_eq!(field.gy, vec![2.0, 1.0, 0.0]);
        assert_eq!(field.gx, vec![0.0; 3]);
    }

    #[test]
    fn direction_points_uphill() {
        let field = gradient(&map(vec![vec![0.0, 0.0], vec![1.0, 1.0]]));
        for angle in field.direction_degrees() {
            assert!((angle - 90.0).abs() < 1e-12);
        }
        assert!((field.max_magnitude() - 1.0).abs() < 1e-12);
    }
}
