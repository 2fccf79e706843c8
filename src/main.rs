// src/main.rs

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::{debug, info};

mod app;
mod config;
mod core;
mod logging;

use app::{App, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let log_path = logging::initialize_logging(cli.verbose)?;
    debug!(path = %log_path.display(), "Logging to file.");

    let settings = cli.settings()?;
    match App::new(cli, settings).run().await? {
        Some(path) => info!(path = %path.display(), "Done."),
        None => info!("Nothing was scanned."),
    }
    Ok(())
}
