// THEORY:
// The `parallel_pipeline` runs the same stages as `pipeline`, but spreads them over
// tokio's blocking worker threads. The stage graph has two levels:
//
//   normalize ─┬─ hotspots ─────┬─ crowd type
//              ├─ distribution  └─ risk
//              └─ flow
//
// Hotspot detection, distribution analysis and flow estimation only read the shared
// normalized map, so they run together. Crowd classification and risk assessment wait
// for the hotspot list and then run together. Shared inputs are handed out behind
// `Arc`s and never mutated, so no locking is needed. The output is identical to the
// sequential `CrowdAnalyzer`.

use crate::config::AnalyzerConfig;
use crate::core_modules::crowd_classifier::classify_crowd;
use crate::core_modules::density_map::{DensityMap, normalize};
use crate::core_modules::distribution::analyze_distribution;
use crate::core_modules::flow::estimate_flow;
use crate::core_modules::hotspot_detector::hotspot_detector;
use crate::core_modules::risk::assess_risk;
use crate::error::{AnalysisError, Result};
use crate::pipeline::{AnalysisResult, CrowdAnalyzer};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Runs a CPU-bound closure on tokio's blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AnalysisError::Worker(e.to_string()))
}

pub struct ParallelAnalyzer {
    config: AnalyzerConfig,
    /// How many maps `analyze_batch` keeps in flight at once.
    max_in_flight: usize,
}

impl ParallelAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            max_in_flight: num_cpus::get().max(1),
        })
    }

    /// Overrides the batch concurrency (defaults to the number of CPUs).
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    #[instrument(level = "debug", skip_all, fields(width = map.width(), height = map.height()))]
    pub async fn analyze(&self, map: DensityMap) -> Result<AnalysisResult> {
        let ratio = self.config.hotspot_threshold_ratio;
        let count = map.sum();
        let normalized = Arc::new(run_blocking(move || normalize(&map)).await?);

        // Stage 1: everything that only needs the normalized map.
        let (hotspots, distribution, flow_pattern) = futures::try_join!(
            run_blocking({
                let normalized = Arc::clone(&normalized);
                move || hotspot_detector::find_hotspots(&normalized, ratio)
            }),
            run_blocking({
                let normalized = Arc::clone(&normalized);
                move || analyze_distribution(&normalized)
            }),
            run_blocking({
                let normalized = Arc::clone(&normalized);
                move || estimate_flow(&normalized)
            }),
        )?;

        // Stage 2: consumers of the hotspot list.
        let hotspots = Arc::new(hotspots);
        let (crowd_type, risk_level) = futures::try_join!(
            run_blocking({
                let normalized = Arc::clone(&normalized);
                let hotspots = Arc::clone(&hotspots);
                move || classify_crowd(&normalized, &hotspots)
            }),
            run_blocking({
                let normalized = Arc::clone(&normalized);
                let hotspots = Arc::clone(&hotspots);
                move || assess_risk(&normalized, &hotspots)
            }),
        )?;

        let hotspots = Arc::try_unwrap(hotspots).unwrap_or_else(|shared| (*shared).clone());
        Ok(AnalysisResult {
            count,
            hotspots,
            distribution,
            flow_pattern,
            crowd_type,
            risk_level,
        })
    }

    /// Analyzes independent maps concurrently. Results keep the input order; the first
    /// worker failure aborts the batch.
    pub async fn analyze_batch(&self, maps: Vec<DensityMap>) -> Result<Vec<AnalysisResult>> {
        let total = maps.len();
        let analyzer = CrowdAnalyzer::new(self.config)?;
        let results: Vec<AnalysisResult> = stream::iter(maps)
            .map(|map| {
                let analyzer = analyzer.clone();
                run_blocking(move || analyzer.analyze(&map))
            })
            .buffered(self.max_in_flight)
            .try_collect()
            .await?;
        debug!(total, max_in_flight = self.max_in_flight, "batch complete");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(seed: usize) -> DensityMap {
        let size = 64;
        let (cx, cy) = ((10 + seed * 7) % size, (40 + seed * 13) % size);
        let data = (0..size * size)
            .map(|i| {
                let (x, y) = ((i % size) as f64, (i / size) as f64);
                let d2 = (x - cx as f64).powi(2) + (y - cy as f64).powi(2);
                2.0 * (-d2 / 30.0).exp() + 0.01 * ((i * (seed + 1)) % 7) as f64
            })
            .collect();
        DensityMap::new(size, size, data).expect("valid map")
    }

    #[tokio::test]
    async fn matches_sequential_analyzer() {
        let config = AnalyzerConfig::default();
        let sequential = CrowdAnalyzer::new(config).expect("analyzer");
        let parallel = ParallelAnalyzer::new(config).expect("analyzer");

        for seed in 0..4 {
            let map = scene(seed);
            let expected = sequential.analyze(&map);
            let actual = parallel.analyze(map).await.expect("analysis");
            assert_eq!(actual, expected);
        }
    }

    #[tokio::test]
    async fn empty_map_in_parallel() {
        let parallel = ParallelAnalyzer::new(AnalyzerConfig::default()).expect("analyzer");
        let result = parallel
            .analyze(DensityMap::zeros(50, 50).expect("valid map"))
            .await
            .expect("analysis");
        assert!(result.hotspots.is_empty());
        assert_eq!(result.crowd_type.as_str(), "Empty");
        assert_eq!(result.risk_level.score, 0.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn batch_preserves_input_order() {
        let parallel = ParallelAnalyzer::new(AnalyzerConfig::default())
            .expect("analyzer")
            .with_max_in_flight(3);
        let maps: Vec<DensityMap> = (0..6).map(scene).collect();
        let expected: Vec<f64> = maps.iter().map(DensityMap::sum).collect();

        let results = parallel.analyze_batch(maps).await.expect("batch");
        let counts: Vec<f64> = results.iter().map(|r| r.count).collect();
        assert_eq!(counts, expected);
    }

    #[tokio::test]
    async fn worker_panic_surfaces_as_error() {
        let err = run_blocking(|| -> usize { panic!("stage exploded") })
            .await
            .expect_err("panicking worker");
        assert!(matches!(err, AnalysisError::Worker(_)));
    }

    #[test]
    fn batch_width_is_at_least_one() {
        let parallel = ParallelAnalyzer::new(AnalyzerConfig::default())
            .expect("analyzer")
            .with_max_in_flight(0);
        assert_eq!(parallel.max_in_flight(), 1);
    }
}
