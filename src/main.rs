use clap::Parser;
use wagerboard::cli::{Cli, Commands};
use wagerboard::config::AppConfig;
use wagerboard::error::Result;

mod main_modes;
mod main_runtime;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;

    match &cli.command {
        Some(Commands::Serve { port }) => {
            main_runtime::init_logging(&config.logging);
            main_modes::run_serve_mode(&config, *port).await?;
        }
        None => {
            main_runtime::init_logging(&config.logging);
            main_modes::run_serve_mode(&config, None).await?;
        }
        Some(Commands::Refresh) => {
            main_runtime::init_logging(&config.logging);
            main_modes::run_refresh_mode(&config).await?;
        }
        Some(Commands::Window { start, end, limit }) => {
            main_runtime::init_logging_simple();
            main_modes::run_window_mode(&config, *start, *end, *limit).await?;
        }
    }

    Ok(())
}
