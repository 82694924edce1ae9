use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wagerboard")]
#[command(version = "0.1.0")]
#[command(about = "Wager leaderboard aggregator with snapshot-based contest windows", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config directory (default.toml plus the WAGERBOARD_ENV overlay)
    #[arg(short, long, default_value = "config", env = "WAGERBOARD_CONFIG_DIR")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the API and run the refresh scheduler (default)
    Serve {
        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run a single refresh cycle and exit
    Refresh,
    /// Print gains inside a window from the snapshot log
    Window {
        /// Window start, epoch milliseconds
        #[arg(long)]
        start: i64,
        /// Window end, epoch milliseconds
        #[arg(long)]
        end: i64,
        /// Only print the top N rows
        #[arg(long)]
        limit: Option<usize>,
    },
}
