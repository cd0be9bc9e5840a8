// THEORY:
// This file is the main entry point for the `crowd_insight` library crate. It turns the
// density map produced by a crowd-counting model into structured crowd intelligence:
// where the crowd clusters, how it is spread, which way it is flowing, what kind of
// crowd it is and how risky the situation looks.
//
// The public surface is the `CrowdAnalyzer` (sequential) and `ParallelAnalyzer` (tokio)
// together with their input (`DensityMap`), configuration (`AnalyzerConfig`) and output
// (`AnalysisResult`). The individual analytic stages live in `core_modules` and are
// public for callers that only need one facet.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::AnalyzerConfig;
pub use core_modules::density_map::{DensityMap, NormalizedMap, normalize};
pub use error::AnalysisError;
pub use parallel_pipeline::ParallelAnalyzer;
pub use pipeline::{AnalysisResult, CrowdAnalyzer};
