//! Command-line parsing for the corporate spread pipeline.
//!
//! Argument parsing and dispatch stay separate from the pipeline code;
//! `app` turns these structs into a `RunConfig`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::Benchmark;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "spreads", version, about = "Corporate bond spreads over DI and IPCA benchmark curves")]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone, Default)]
pub struct CommonArgs {
    /// TOML config file (defaults to $SPREADS_CONFIG when set).
    #[arg(long, global = true, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Directory holding the input CSV files.
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory receiving the artifacts.
    #[arg(long, global = true, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline and write every artifact.
    Run(RunArgs),
    /// Interpolate one benchmark surface and print a per-tenor summary.
    Curve(CurveArgs),
    /// Screen the bond master with ad-hoc filters.
    Screen(ScreenArgs),
    /// Write a seeded synthetic input data set.
    Sample(SampleArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Only run one universe (both by default).
    #[arg(long, value_enum)]
    pub universe: Option<Benchmark>,

    /// Evaluate the last N eligible dates per bond.
    #[arg(long, conflicts_with = "calendar_days")]
    pub last_n: Option<usize>,

    /// Evaluate eligible dates within N calendar days of the latest yield date.
    #[arg(long)]
    pub calendar_days: Option<u32>,

    /// Lower bound of the plausible spread range (bp).
    #[arg(long, allow_negative_numbers = true)]
    pub min_bp: Option<f64>,

    /// Upper bound of the plausible spread range (bp).
    #[arg(long, allow_negative_numbers = true)]
    pub max_bp: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct CurveArgs {
    #[arg(short = 'b', long, value_enum)]
    pub benchmark: Benchmark,

    /// Also write the interpolated table to this CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ScreenArgs {
    /// Inflation-linked indicator to keep (`N` for DI, `Y` for IPCA).
    #[arg(long, default_value = "N")]
    pub inflation_linked: String,

    /// Drop bonds classified as government.
    #[arg(long)]
    pub exclude_government: bool,

    /// Drop bonds in the financial sector.
    #[arg(long)]
    pub exclude_financial: bool,

    /// Keep only these coupon types (repeatable).
    #[arg(long = "coupon-type", value_name = "TYPE")]
    pub coupon_types: Vec<String>,

    /// Write the selected bonds' ids to this file, one per line.
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output directory for the generated inputs.
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// Business days of history.
    #[arg(long, default_value_t = 90)]
    pub days: usize,

    /// Eligible bonds per universe.
    #[arg(long, default_value_t = 12)]
    pub bonds: usize,

    /// First business day (YYYY-MM-DD).
    #[arg(long, default_value = "2024-01-02")]
    pub start: NaiveDate,
}
