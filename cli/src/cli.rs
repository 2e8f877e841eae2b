use std::path::PathBuf;

/// Developable-area and site-suitability CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "sitelens", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// JSON configuration file; defaults apply to omitted settings
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Subtract constraint layers from a site boundary
    Develop(DevelopArgs),

    /// Score a developable area against site datasets
    Score(ScoreArgs),
}

#[derive(clap::Args, Debug)]
pub struct DevelopArgs {
    /// Site boundary (GeoJSON Feature or FeatureCollection, lon/lat)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub boundary: PathBuf,

    /// Directory of layer files named after layers, e.g. biodiversity.geojson
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub layers: PathBuf,

    /// Output parts file, defaults to "./developable.geojson"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ScoreArgs {
    /// Developable area (GeoJSON, lon/lat)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub area: PathBuf,

    /// Directory of dataset files named after datasets, e.g. flood.geojson
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub data: PathBuf,

    /// Output score file, defaults to "./score.json"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}
