//! Command-line interface.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mosaic_render::RenderMode;

use crate::app::App;
use crate::config::MosaicConfig;
use crate::server;

#[derive(Debug, Parser)]
#[command(name = "mosaic", version, about = "Compose and serve module pages")]
pub struct Cli {
    /// Configuration file (defaults to ./mosaic.yaml when present)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve module pages over HTTP
    Serve {
        /// Address to listen on, overriding the config file
        #[arg(long)]
        bind: Option<String>,

        /// Number of request-handling threads
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Render one module page to stdout
    Render {
        slug: String,

        /// Print only the module fragment, without the layout
        #[arg(long)]
        fragment: bool,
    },
    /// Build every active module and report failures
    Check,
}

impl Cli {
    pub fn run(self) -> Result<ExitCode> {
        let mut config = MosaicConfig::load(self.config.as_deref())?;

        match self.command {
            Command::Serve { bind, workers } => {
                if let Some(bind) = bind {
                    config.bind = bind;
                }
                if let Some(workers) = workers {
                    config.workers = workers;
                }
                let app = App::open(config)?;
                server::serve(&app)?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Render { slug, fragment } => {
                let app = App::open(config)?;
                let response = app
                    .page(&slug, RenderMode::from_fragment_flag(fragment))
                    .with_context(|| format!("Failed to render {slug}"))?;
                for failure in &response.page.failures {
                    eprintln!("warning: {} ({}) skipped: {}", failure.block, failure.file, failure.message);
                }
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", response.page.body)?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Check => {
                let app = App::load(config)?;
                let report = app.build_all();
                for id in &report.built {
                    println!("ok      {id}");
                }
                for id in &report.skipped {
                    println!("skipped {id}");
                }
                for (id, err) in &report.failed {
                    println!("FAILED  {id}: {err}");
                }
                Ok(if report.is_ok() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                })
            }
        }
    }
}
