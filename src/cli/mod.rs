use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "storelens",
    about = "Play Store Dataset Intelligence & Report System"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clean both datasets, evaluate every view, and compose the dashboard.
    Report {
        /// Apps dataset (defaults to "Play Store Data.csv")
        #[arg(long)]
        apps: Option<PathBuf>,
        /// Reviews dataset (defaults to "User Reviews.csv")
        #[arg(long)]
        reviews: Option<PathBuf>,
        /// Output directory for per-chart files and the dashboard
        #[arg(long)]
        out: Option<PathBuf>,
        /// Open the composed dashboard when the run succeeds
        #[arg(long, default_value_t = false)]
        open: bool,
    },
    /// Check that the input datasets and output directory are usable.
    Doctor {
        #[arg(long)]
        apps: Option<PathBuf>,
        #[arg(long)]
        reviews: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}
