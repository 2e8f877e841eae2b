use anyhow::{Context, Result};
use sitelens::score::read_datasets;
use sitelens::{read_geojson, ScoringEngine};
use tracing::info;

pub fn run(config: &sitelens::Config, args: &crate::cli::ScoreArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or("./score.json".into());

    info!("[score] reading developable area from {}", args.area.display());
    let area = read_geojson(&args.area)?;

    info!("[score] loading datasets from {}", args.data.display());
    let raw = read_datasets(&args.data)?;

    let composite = ScoringEngine::new(&config.scoring).score_area(&area, &raw);

    info!("[score] total {}/{} ({:.1}%), writing to {}", composite.total, composite.max, composite.percentage, out_path.display());
    let json = serde_json::to_string_pretty(&composite).context("Failed to serialize score")?;
    std::fs::write(&out_path, json).with_context(|| format!("Failed to write {}", out_path.display()))?;

    Ok(())
}
