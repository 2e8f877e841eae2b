mod cli;
mod commands;

use std::path::Path;

use anyhow::Result;
use cli::{Cli, Commands};
use commands::{develop, score};
use sitelens::Config;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "sitelens=info,warn",
        1 => "sitelens=debug,info",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_path(path),
        None => Ok(Config::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Develop(args) => develop::run(&config, args).await,
        Commands::Score(args) => score::run(&config, args),
    }
}
