// THEORY:
// The `DistributionAnalyzer` describes the crowd as a whole rather than its hotspots.
// Every cell contributes, weighted by its density: the center of mass says where the
// crowd is, the dispersion says how far it spreads around that point, and uniformity
// (an inverse coefficient of variation) says how evenly it covers the scene. A coarse
// pattern label is derived from those numbers.

use crate::core_modules::density_map::NormalizedMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use tracing::debug;

/// Guards the uniformity ratio against a zero mean.
pub const UNIFORMITY_EPSILON: f64 = 1e-5;
/// Dispersion below this fraction of the longer map side reads as a cluster.
const CLUSTERED_DISPERSION_RATIO: f64 = 0.15;
const UNIFORM_THRESHOLD: f64 = 0.7;

pub const NO_CROWD_LABEL: &str = "No crowd detected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SpatialPattern {
    Clustered,
    Uniform,
    Dispersed,
}

impl SpatialPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clustered => "Clustered",
            Self::Uniform => "Uniform",
            Self::Dispersed => "Dispersed",
        }
    }
}

impl fmt::Display for SpatialPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global spatial statistics of a map.
#[derive(Debug, Clone, PartialEq)]
pub enum DistributionResult {
    /// The map holds no density at all. Serializes as `{"pattern": "No crowd detected"}`.
    NoCrowd,
    Measured {
        center_of_mass: (f64, f64),
        dispersion: f64,
        uniformity: f64,
        pattern: SpatialPattern,
    },
}

impl DistributionResult {
    pub fn pattern_label(&self) -> &'static str {
        match self {
            Self::NoCrowd => NO_CROWD_LABEL,
            Self::Measured { pattern, .. } => pattern.as_str(),
        }
    }
}

impl Serialize for DistributionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::NoCrowd => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("pattern", NO_CROWD_LABEL)?;
                map.end()
            }
            Self::Measured {
                center_of_mass,
                dispersion,
                uniformity,
                pattern,
            } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("center_of_mass", center_of_mass)?;
                map.serialize_entry("dispersion", dispersion)?;
                map.serialize_entry("uniformity", uniformity)?;
                map.serialize_entry("pattern", pattern)?;
                map.end()
            }
        }
    }
}

pub fn analyze_distribution(map: &NormalizedMap) -> DistributionResult {
    let total = map.sum();
    if total == 0.0 {
        debug!("distribution: empty map");
        return DistributionResult::NoCrowd;
    }

    let (mut wx, mut wy) = (0.0, 0.0);
    for (x, y, v) in map.iter_cells() {
        wx += x as f64 * v;
        wy += y as f64 * v;
    }
    let (cm_x, cm_y) = (wx / total, wy / total);

    let dispersion = map
        .iter_cells()
        .map(|(x, y, v)| v * (x as f64 - cm_x).hypot(y as f64 - cm_y))
        .sum::<f64>()
        / total;

    // Negative when the spread exceeds the mean.
    let uniformity = 1.0 - map.std() / (map.mean() + UNIFORMITY_EPSILON);

    let longest_side = map.width().max(map.height()) as f64;
    let pattern = if dispersion < CLUSTERED_DISPERSION_RATIO * longest_side {
        SpatialPattern::Clustered
    } else if uniformity > UNIFORM_THRESHOLD {
        SpatialPattern::Uniform
    } else {
        SpatialPattern::Dispersed
    };

    debug!(cm_x, cm_y, dispersion, uniformity, %pattern, "distribution");
    DistributionResult::Measured {
        center_of_mass: (cm_x, cm_y),
        dispersion,
        uniformity,
        pattern,
    }
}
