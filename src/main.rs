use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use geofactbot::{bot, config, log};

/// Location facts chat bot
#[derive(Parser, Debug)]
struct Args {
    /// Optional config file, overridden by GEOFACTBOT__* environment variables
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        ::log::LevelFilter::Debug
    } else {
        ::log::LevelFilter::Info
    };
    log::init(level);

    let conf = config::App::parse(args.config.as_deref()).context("Failed to load config")?;

    bot::run(conf).await.context("Unexpected error on bot")
}
