// THEORY:
// The `RiskAssessor` condenses the scene into one bounded safety score. Three factors
// feed it, each saturating at 1.0:
// - density: the most intense hotspot,
// - gradient: the steepest change in (lightly smoothed) density, where crushes start,
// - multiplicity: how many hotspots the scene has.
// The weighted sum of the factors lies in [0, 1] and maps onto four levels.

use crate::core_modules::density_map::DensityMap;
use crate::core_modules::filters::{gaussian_filter, gradient};
use crate::core_modules::hotspot::Hotspot;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const RISK_SMOOTHING_SIGMA: f64 = 2.0;

const DENSITY_GAIN: f64 = 10.0;
const GRADIENT_GAIN: f64 = 20.0;
const HOTSPOT_SATURATION: f64 = 5.0;

const DENSITY_WEIGHT: f64 = 0.5;
const GRADIENT_WEIGHT: f64 = 0.3;
const HOTSPOT_WEIGHT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 0.3 {
            Self::Low
        } else if score < 0.6 {
            Self::Moderate
        } else if score < 0.8 {
            Self::High
        } else {
            Self::Critical
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::Critical => "Critical",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: f64,
}

impl RiskAssessment {
    pub fn low() -> Self {
        Self {
            level: RiskLevel::Low,
            score: 0.0,
        }
    }
}

pub fn assess_risk(map: &DensityMap, hotspots: &[Hotspot]) -> RiskAssessment {
    if hotspots.is_empty() {
        return RiskAssessment::low();
    }

    // Peak comes from hotspot intensities, not from the map itself.
    let max_density = hotspots
        .iter()
        .map(|h| h.intensity)
        .fold(0.0, f64::max);
    let max_gradient = gradient(&gaussian_filter(map, RISK_SMOOTHING_SIGMA)).max_magnitude();

    let density_factor = (max_density * DENSITY_GAIN).min(1.0);
    let gradient_factor = (max_gradient * GRADIENT_GAIN).min(1.0);
    let hotspot_factor = (hotspots.len() as f64 / HOTSPOT_SATURATION).min(1.0);

    let score = (DENSITY_WEIGHT * density_factor
        + GRADIENT_WEIGHT * gradient_factor
        + HOTSPOT_WEIGHT * hotspot_factor)
        .clamp(0.0, 1.0);
    let level = RiskLevel::from_score(score);

    debug!(
        density_factor,
        gradient_factor,
        hotspot_factor,
        score,
        %level,
        "risk assessed"
    );
    RiskAssessment { level, score }
}
