use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mosaic::cli::Cli;

fn main() -> anyhow::Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("mosaic=info,mosaic_render=info"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Cli::parse().run()
}
