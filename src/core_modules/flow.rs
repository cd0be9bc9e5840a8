// THEORY:
// The `FlowEstimator` reads movement tendency from a single still density map. People
// drift down density gradients and pile up along them, so the smoothed gradient field
// is used as a proxy for flow:
//
// 1.  **Smoothing**: A Gaussian blur (sigma 3) removes pixel-level noise so the gradient
//     reflects crowd-scale structure.
// 2.  **Static Gate**: If even the steepest gradient is tiny, there is no usable signal
//     and the crowd is reported as static.
// 3.  **Dominant Direction**: Directions are accumulated into eight 45-degree bins, each
//     cell weighted by its gradient magnitude. The heaviest bin wins and its midpoint is
//     reported.
// 4.  **Character**: A steep gradient anywhere means directional flow. Otherwise the
//     circular spread of the meaningful directions separates turbulent from laminar.

use crate::core_modules::density_map::NormalizedMap;
use crate::core_modules::filters::{gaussian_filter, gradient};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const FLOW_SMOOTHING_SIGMA: f64 = 3.0;
/// Below this peak magnitude the field is indistinguishable from noise.
const STATIC_MAGNITUDE: f64 = 0.01;
const DIRECTIONAL_MAGNITUDE: f64 = 0.1;
const TURBULENT_SPREAD_DEGREES: f64 = 45.0;

const BIN_COUNT: usize = 8;
const BIN_WIDTH: f64 = 360.0 / BIN_COUNT as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowType {
    Static,
    Directional,
    Turbulent,
    Laminar,
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Static => "Static",
            Self::Directional => "Directional",
            Self::Turbulent => "Turbulent",
            Self::Laminar => "Laminar",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowResult {
    #[serde(rename = "type")]
    pub flow_type: FlowType,
    pub direction_degrees: f64,
    /// Mean gradient magnitude over every cell.
    pub magnitude: f64,
}

/// Histogram bin of an angle in [-180, 180]; bins are [lo, hi) except the last.
fn bin_index(angle: f64) -> usize {
    let idx = ((angle + 180.0) / BIN_WIDTH).floor();
    (idx.max(0.0) as usize).min(BIN_COUNT - 1)
}

fn bin_midpoint(idx: usize) -> f64 {
    -180.0 + (idx as f64 + 0.5) * BIN_WIDTH
}

/// Circular standard deviation in degrees, `None` for an empty set.
fn circular_std_degrees(angles: impl Iterator<Item = f64>) -> Option<f64> {
    let (mut sin_sum, mut cos_sum, mut n) = (0.0, 0.0, 0usize);
    for angle in angles {
        let rad = angle.to_radians();
        sin_sum += rad.sin();
        cos_sum += rad.cos();
        n += 1;
    }
    if n == 0 {
        return None;
    }
    let r = (sin_sum.hypot(cos_sum) / n as f64).min(1.0);
    if r <= 0.0 {
        return Some(f64::INFINITY);
    }
    Some((-2.0 * r.ln()).sqrt().to_degrees())
}

pub fn estimate_flow(map: &NormalizedMap) -> FlowResult {
    let smoothed = gaussian_filter(map, FLOW_SMOOTHING_SIGMA);
    let field = gradient(&smoothed);
    let magnitude = field.magnitude();
    let direction = field.direction_degrees();

    let max_magnitude = magnitude.iter().copied().fold(0.0, f64::max);
    let mean_magnitude = magnitude.iter().sum::<f64>() / magnitude.len() as f64;

    if max_magnitude < STATIC_MAGNITUDE {
        debug!(max_magnitude, "flow: static");
        return FlowResult {
            flow_type: FlowType::Static,
            direction_degrees: 0.0,
            magnitude: mean_magnitude,
        };
    }

    let mut histogram = [0.0f64; BIN_COUNT];
    for (angle, weight) in direction.iter().zip(&magnitude) {
        histogram[bin_index(*angle)] += weight;
    }
    // first maximum wins on ties
    let dominant = histogram
        .iter()
        .enumerate()
        .fold(0, |best, (i, w)| if *w > histogram[best] { i } else { best });

    let flow_type = if max_magnitude > DIRECTIONAL_MAGNITUDE {
        FlowType::Directional
    } else {
        let spread = circular_std_degrees(
            direction
                .iter()
                .zip(&magnitude)
                .filter(|(_, m)| **m > STATIC_MAGNITUDE)
                .map(|(a, _)| *a),
        );
        match spread {
            Some(s) if s > TURBULENT_SPREAD_DEGREES => FlowType::Turbulent,
            _ => FlowType::Laminar,
        }
    };

    let direction_degrees = bin_midpoint(dominant);
    debug!(%flow_type, direction_degrees, max_magnitude, mean_magnitude, "flow");
    FlowResult {
        flow_type,
        direction_degrees,
        magnitude: mean_magnitude,
    }
}
