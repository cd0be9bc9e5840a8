// THEORY:
// The `CrowdClassifier` assigns the scene one behavioral label. It is a literal decision
// table over three signals: how saturated the peak is, how dense the map is on average,
// and how far apart the hotspots sit. The first matching row wins.

use crate::core_modules::density_map::DensityMap;
use crate::core_modules::hotspot::{Hotspot, mean_pairwise_distance};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const SATURATED_PEAK: f64 = 0.8;
const MODERATE_PEAK: f64 = 0.3;
const SPARSE_AVERAGE: f64 = 0.2;
/// Hotspots closer than this (in map cells) on average count as one gathering area.
const GATHERING_DISTANCE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrowdType {
    Empty,
    #[serde(rename = "Dense Gathering")]
    DenseGathering,
    #[serde(rename = "Multiple Gatherings")]
    MultipleGatherings,
    #[serde(rename = "Distributed Groups")]
    DistributedGroups,
    #[serde(rename = "Queue Formation")]
    QueueFormation,
    #[serde(rename = "Uniform Crowd")]
    UniformCrowd,
    #[serde(rename = "Sparse Population")]
    SparsePopulation,
}

impl CrowdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::DenseGathering => "Dense Gathering",
            Self::MultipleGatherings => "Multiple Gatherings",
            Self::DistributedGroups => "Distributed Groups",
            Self::QueueFormation => "Queue Formation",
            Self::UniformCrowd => "Uniform Crowd",
            Self::SparsePopulation => "Sparse Population",
        }
    }
}

impl fmt::Display for CrowdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labels the scene. `map` is normally the normalized map; a map scaled below a peak
/// of 1.0 reaches the moderate and sparse rows of the table.
pub fn classify_crowd(map: &DensityMap, hotspots: &[Hotspot]) -> CrowdType {
    if hotspots.is_empty() {
        return CrowdType::Empty;
    }

    let max_density = map.max();
    let avg_density = map.mean();
    let avg_distance = mean_pairwise_distance(hotspots);

    let crowd_type = if max_density > SATURATED_PEAK {
        if hotspots.len() == 1 {
            CrowdType::DenseGathering
        } else if avg_distance < GATHERING_DISTANCE {
            CrowdType::MultipleGatherings
        } else {
            CrowdType::DistributedGroups
        }
    } else if max_density > MODERATE_PEAK {
        if avg_density < SPARSE_AVERAGE {
            CrowdType::QueueFormation
        } else {
            CrowdType::UniformCrowd
        }
    } else {
        CrowdType::SparsePopulation
    };

    debug!(max_density, avg_density, avg_distance, %crowd_type, "crowd classified");
    crowd_type
}
