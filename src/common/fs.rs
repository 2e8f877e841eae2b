use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::common::io::read_geojson;
use crate::types::FeatureCollection;

/// Error unless the directory already exists.
pub fn require_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Directory does not exist: {}", path.display());
    }
    if !path.is_dir() {
        anyhow::bail!("Path exists but is not a directory: {}", path.display());
    }
    Ok(())
}

/// Read every `*.geojson` / `*.json` file directly inside `dir`, keyed by file stem.
/// Files that fail to parse are logged and skipped.
pub fn read_geojson_dir(dir: &Path) -> Result<BTreeMap<String, FeatureCollection>> {
    require_dir_exists(dir)?;

    let mut collections = BTreeMap::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();
        let is_geojson = path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("geojson") || ext.eq_ignore_ascii_case("json"));
        if !entry.file_type().is_file() || !is_geojson { continue }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
        match read_geojson(path) {
            Ok(collection) => {
                tracing::debug!(file = %path.display(), features = collection.len(), "[load] read layer file");
                collections.insert(stem.to_ascii_lowercase(), collection);
            }
            Err(err) => tracing::warn!(file = %path.display(), "[load] skipping unreadable file: {err:#}"),
        }
    }
    Ok(collections)
}
