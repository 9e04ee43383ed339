//! Command-line parsing for the yield-trend screen.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling/statistics code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "yt", version, about = "Crop Yield Trend Screen (OWID-based)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline: summary, trend table, SVG plots, exports.
    Run(RunArgs),
    /// Print the adjusted trend table only (useful for scripting).
    Trends(RunArgs),
}

/// Common options for the pipeline.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Crop-yield table (URL or local CSV path).
    #[arg(long)]
    pub yields: Option<String>,

    /// Land-use/population table (URL or local CSV path).
    #[arg(long = "land-use")]
    pub land_use: Option<String>,

    /// Cohort size: keep the top-N entities by population.
    #[arg(long, default_value_t = 30)]
    pub top: usize,

    /// Comma-separated crop subset (labels after suffix stripping).
    #[arg(long, default_value = "wheat,rice,maize,barley", value_delimiter = ',')]
    pub crops: Vec<String>,

    /// Directory for SVG chart output.
    #[arg(long, default_value = "plots")]
    pub plot_dir: PathBuf,

    /// Disable chart rendering.
    #[arg(long)]
    pub no_plot: bool,

    /// Export the adjusted records to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the adjusted records (plus run metadata) to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    /// Write a markdown debug bundle under debug/.
    #[arg(long)]
    pub debug_bundle: bool,
}
