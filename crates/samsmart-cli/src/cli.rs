//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use samsmart_core::Aggregation;
use samsmart_types::BinWidth;

#[derive(Debug, Parser)]
#[command(name = "samsmart")]
#[command(author, version, about = "Fetch and reconcile SamSmart PD box sensor data", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate the configuration, including the timeframe overlap check
    Check,

    /// Fetch every timeframe of a household and merge it into one table
    Fetch {
        /// Household id as configured under [households]
        #[arg(long)]
        household: String,

        #[command(flatten)]
        table: TableArgs,
    },

    /// Merge raw two-column CSV files (timestamp,<sensor>) into one table
    Merge {
        /// Raw CSV files, one sensor each
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        table: TableArgs,
    },
}

/// Reusable downsampling and output arguments
#[derive(Debug, Clone, Args)]
pub struct TableArgs {
    /// Downsample onto bins of this width (e.g. 10s, 3min, 1h, 1d)
    #[arg(short, long)]
    pub bin: Option<BinWidth>,

    /// Aggregation applied to every column when downsampling
    #[arg(short, long, default_value = "mean", requires = "bin")]
    pub agg: Aggregation,

    /// Write CSV to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
