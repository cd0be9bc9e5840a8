// THEORY:
// The `pipeline` module is the top-level API of the analytics engine. It takes one raw
// density map and returns one `AnalysisResult`, hiding the individual stages behind a
// single call.
//
// Stage order:
// 1.  Normalize the raw map once. Every stage shares this scale-free view.
// 2.  Detect hotspots on the normalized map.
// 3.  Analyze distribution and estimate flow. Both depend only on the normalized map.
// 4.  Classify the crowd and assess risk. Both also need the hotspot list.
// 5.  Surface the raw (unnormalized) sum as the count.
//
// The analyzer holds nothing but its immutable configuration, so one instance can be
// shared freely across threads and calls never influence each other.

use crate::config::AnalyzerConfig;
use crate::core_modules::crowd_classifier::classify_crowd;
use crate::core_modules::density_map::{DensityMap, normalize};
use crate::core_modules::distribution::analyze_distribution;
use crate::core_modules::flow::estimate_flow;
use crate::core_modules::hotspot_detector::hotspot_detector;
use crate::core_modules::risk::assess_risk;
use crate::error::Result;
use serde::Serialize;
use tracing::{debug, instrument};

// Re-export key data structures for the public API.
pub use crate::core_modules::crowd_classifier::CrowdType;
pub use crate::core_modules::distribution::{DistributionResult, SpatialPattern};
pub use crate::core_modules::flow::{FlowResult, FlowType};
pub use crate::core_modules::hotspot::{Hotspot, Point};
pub use crate::core_modules::risk::{RiskAssessment, RiskLevel};

/// The complete report for one density map. Field names are the wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// Sum of the raw map, in the model's own units.
    pub count: f64,
    pub hotspots: Vec<Hotspot>,
    pub distribution: DistributionResult,
    pub flow_pattern: FlowResult,
    pub crowd_type: CrowdType,
    pub risk_level: RiskAssessment,
}

impl AnalysisResult {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// The stateless crowd analytics engine.
#[derive(Debug, Clone, Default)]
pub struct CrowdAnalyzer {
    config: AnalyzerConfig,
}

impl CrowdAnalyzer {
    /// Builds an analyzer, refusing an out-of-range configuration.
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Runs every stage against `map`. Infallible: `DensityMap` is validated on construction.
    #[instrument(level = "debug", skip_all, fields(width = map.width(), height = map.height()))]
    pub fn analyze(&self, map: &DensityMap) -> AnalysisResult {
        let normalized = normalize(map);

        let hotspots =
            hotspot_detector::find_hotspots(&normalized, self.config.hotspot_threshold_ratio);
        let distribution = analyze_distribution(&normalized);
        let flow_pattern = estimate_flow(&normalized);
        let crowd_type = classify_crowd(&normalized, &hotspots);
        let risk_level = assess_risk(&normalized, &hotspots);

        let result = AnalysisResult {
            count: map.sum(),
            hotspots,
            distribution,
            flow_pattern,
            crowd_type,
            risk_level,
        };
        debug!(
            count = result.count,
            hotspots = result.hotspots.len(),
            crowd_type = %result.crowd_type,
            risk = %result.risk_level.level,
            "analysis complete"
        );
        result
    }

    /// Validates a grid of rows and analyzes it.
    pub fn analyze_rows(&self, rows: Vec<Vec<f64>>) -> Result<AnalysisResult> {
        let map = DensityMap::from_rows(rows)?;
        Ok(self.analyze(&map))
    }
}
