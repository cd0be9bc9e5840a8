// Example runner for the `crowd_insight` library.
//
// Reads a density map (a JSON array of rows) from the given file, or from stdin when no
// path is given, analyzes it and prints the report as JSON on stdout. Logs go to stderr.
//
//   RUST_LOG=crowd_insight=debug crowd_insight density.json
//   CROWD_HOTSPOT_THRESHOLD=0.4 crowd_insight < density.json

use anyhow::{Context, Result};
use crowd_insight::{AnalyzerConfig, CrowdAnalyzer};
use std::env;
use std::fs;
use std::io::{self, Read};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match env::var("LOG_FORMAT")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "json" => registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init(),
        "compact" => registry
            .with(fmt::layer().compact().with_writer(io::stderr))
            .init(),
        _ => registry.with(fmt::layer().with_writer(io::stderr)).init(),
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading {path}")),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading density map from stdin")?;
            Ok(buf)
        }
    }
}

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("Usage: crowd_insight [density_map.json]");
        return Ok(());
    }

    let config = AnalyzerConfig::from_env().context("loading analyzer config")?;
    let analyzer = CrowdAnalyzer::new(config)?;

    let raw = read_input(args.get(1).map(String::as_str))?;
    let rows: Vec<Vec<f64>> =
        serde_json::from_str(&raw).context("density map must be a JSON array of rows")?;

    let result = analyzer.analyze_rows(rows).context("analyzing density map")?;
    tracing::info!(
        count = result.count,
        hotspots = result.hotspots.len(),
        crowd_type = %result.crowd_type,
        risk = %result.risk_level.level,
        "analysis finished"
    );
    println!("{}", result.to_json_pretty()?);
    Ok(())
}
