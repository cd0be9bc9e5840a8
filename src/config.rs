// THEORY:
// The `config` module holds the engine's only tunable: the fraction of the normalized
// peak a cell must exceed to count towards a hotspot. A config is validated once when an
// analyzer is built and never changes afterwards, so analyzers can be shared freely.
// It can come from code, from serde (missing fields take their defaults) or from the
// environment.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable that overrides the hotspot threshold ratio.
pub const THRESHOLD_ENV_VAR: &str = "CROWD_HOTSPOT_THRESHOLD";

/// Configuration for the `CrowdAnalyzer`. Fixed at construction, read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Fraction of the normalized peak a cell must exceed to belong to a hotspot.
    #[serde(default = "default_hotspot_threshold_ratio")]
    pub hotspot_threshold_ratio: f64,
}

fn default_hotspot_threshold_ratio() -> f64 {
    0.25
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            hotspot_threshold_ratio: default_hotspot_threshold_ratio(),
        }
    }
}

impl AnalyzerConfig {
    pub fn new(hotspot_threshold_ratio: f64) -> Result<Self> {
        let config = Self {
            hotspot_threshold_ratio,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads `CROWD_HOTSPOT_THRESHOLD`, falling back to the default when unset.
    pub fn from_env() -> Result<Self> {
        match env::var(THRESHOLD_ENV_VAR) {
            Ok(raw) => {
                let ratio = raw.trim().parse::<f64>().map_err(|e| {
                    AnalysisError::invalid_config(format!("{THRESHOLD_ENV_VAR}={raw:?}: {e}"))
                })?;
                Self::new(ratio)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let ratio = self.hotspot_threshold_ratio;
        if !ratio.is_finite() || !(0.0..=1.0).contains(&ratio) {
            return Err(AnalysisError::invalid_config(format!(
                "hotspot_threshold_ratio must be within [0, 1], got {ratio}"
            )));
        }
        Ok(())
    }
}
