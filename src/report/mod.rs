//! Reporting: summaries, HTML tables, and terminal output.
//!
//! - per-label curve, per-bond spread, and spread-surface pivots (`summary`)
//! - static HTML tables and pages (`html`)
//! - terminal tables (`format`)

pub mod format;
pub mod html;
pub mod summary;

pub use format::{RunCounts, format_curve_summary, format_run_summary, format_screen};
pub use summary::{
    BenchmarkRow, BondSpreadSummary, LabelSummary, SpreadSurface, benchmark_summary, pivot_spreads, summarize_bonds,
    summarize_curve,
};
