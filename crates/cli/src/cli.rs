use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Multi-signal draw candidate ranker.
///
/// Reads draw history from JSON files and prints results as JSON on stdout.
#[derive(Parser, Debug)]
#[command(name = "drawcast", version, about)]
pub struct CliArgs {
    /// Path to the engine configuration document.
    #[arg(long, global = true, env = "DRAWCAST_CONFIG", default_value = "config/drawcast.yml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rank candidates for the next draw.
    Predict {
        #[command(flatten)]
        source: HistoryArgs,

        /// Fixed seed for the stochastic signal
        #[arg(long)]
        seed: Option<u64>,

        /// Append the prediction to this JSON Lines file
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Report structural patterns found in the history.
    Detect {
        #[command(flatten)]
        source: HistoryArgs,
    },

    /// Replay recent draws and report per-strategy health.
    Backtest {
        #[command(flatten)]
        source: HistoryArgs,

        /// Number of most recent draws to replay (config value if unset)
        #[arg(long)]
        depth: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run the reweighting loop until interrupted.
    Run {
        #[command(flatten)]
        source: HistoryArgs,

        /// Recorded performance samples; backtests the history when unset
        #[arg(long)]
        outcomes: Option<PathBuf>,

        /// Append alerts to this JSON Lines file
        #[arg(long)]
        alerts_log: Option<PathBuf>,

        /// Run a single cycle, print its report and exit
        #[arg(long)]
        once: bool,

        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Domain id from the configuration
    #[arg(long)]
    pub domain: String,

    /// JSON array of recorded draws, any order
    #[arg(long)]
    pub history: PathBuf,
}
