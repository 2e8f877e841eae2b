use anyhow::{Context, Result};
use sitelens::acquire::MemorySource;
use sitelens::{read_geojson, write_geojson, DevelopableAreaBuilder, RunContext};
use tracing::info;

pub async fn run(config: &sitelens::Config, args: &crate::cli::DevelopArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or("./developable.geojson".into());

    info!("[develop] reading boundary from {}", args.boundary.display());
    let boundary = read_geojson(&args.boundary)?;

    info!("[develop] loading layers from {}", args.layers.display());
    let source = MemorySource::from_dir(&args.layers)
        .with_context(|| format!("Failed to load layers from {}", args.layers.display()))?;

    let builder = DevelopableAreaBuilder::new(source, config);
    let mut ctx = RunContext::new();
    let output = builder.build(&boundary, &mut ctx).await;

    info!(
        parts = output.parts.len(),
        area_m2 = output.total_area(),
        estimated = output.is_estimated(),
        fallback = output.has_fallback(),
        "[develop] writing parts to {}",
        out_path.display(),
    );
    write_geojson(&out_path, &output.parts)?;

    Ok(())
}
