//! The spread pipeline, shared by every subcommand.
//!
//! Per universe (DI, IPCA):
//!
//! ```text
//! bond master -> yield-history prefilter -> corporate screen
//! curve quotes -> interpolated curve table
//! -> observation windows -> spreads/skips -> anomaly filter -> pivot
//! ```
//!
//! `run_universe` is the pure in-memory part; `run_all` adds file loading,
//! the per-universe progress log file, and artifact writing. A data or
//! configuration error aborts only the universe it occurred in; errors in
//! the shared inputs (bond master, yield series) abort the whole run.

use std::path::Path;

use crate::config::RunConfig;
use crate::domain::{Benchmark, Bond, InterpolatedCurveTable, SpreadOutput, YieldSurface, YieldTimeSeries};
use crate::error::AppError;
use crate::io::export;
use crate::io::ingest::{self, BondMaster};
use crate::log::{FileLog, ProgressLog};
use crate::plot::{self, HeatScale};
use crate::report::{self, BenchmarkRow, RunCounts, SpreadSurface, html};
use crate::spread::{self, FilterOutcome};
use crate::surface::interpolate_surface;
use crate::universe::{self, Screen};

/// Everything computed for one universe.
#[derive(Debug, Clone)]
pub struct UniverseRun {
    pub benchmark: Benchmark,
    pub curve: InterpolatedCurveTable,
    /// Bonds that passed the universe screen.
    pub bonds: Vec<Bond>,
    /// Spread calculator output before the anomaly filter.
    pub output: SpreadOutput,
    pub filtered: FilterOutcome,
    pub surface: SpreadSurface,
}

impl UniverseRun {
    pub fn counts(&self) -> RunCounts {
        RunCounts {
            bonds_screened: self.bonds.len(),
            curve_dates: self.curve.n_dates(),
            spreads_computed: self.output.spreads.len(),
            skipped: self.output.skipped.len(),
            spreads_kept: self.filtered.kept.len(),
        }
    }
}

/// Result of `run_all`.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub runs: Vec<UniverseRun>,
    /// Universes that were aborted, with the reason.
    pub failures: Vec<(Benchmark, AppError)>,
    pub benchmark_rows: Vec<BenchmarkRow>,
}

fn log_inputs(master: &BondMaster, yields: &YieldTimeSeries, log: &mut dyn ProgressLog) {
    log.line(&format!(
        "Bond master: {} rows read, {} bonds, {} duplicate ids dropped, {} rows rejected",
        master.rows_read,
        master.bonds.len(),
        master.duplicates,
        master.row_errors.len()
    ));
    for err in &master.row_errors {
        log.line(&format!(
            "  rejected line {} ({}): {}",
            err.line,
            err.id.as_deref().unwrap_or("?"),
            err.message
        ));
    }
    log.line(&format!(
        "Yield series: {} dates, {} bond columns",
        yields.dates().len(),
        yields.bond_ids().len()
    ));
}

/// Load and interpolate one benchmark surface.
pub fn load_curve_table(
    config: &RunConfig,
    benchmark: Benchmark,
    log: &mut dyn ProgressLog,
) -> Result<InterpolatedCurveTable, AppError> {
    let surface = load_surface(config, benchmark, log)?;
    interpolate_surface(&surface, &config.grid(benchmark)?, benchmark, log)
}

fn load_surface(config: &RunConfig, benchmark: Benchmark, log: &mut dyn ProgressLog) -> Result<YieldSurface, AppError> {
    let loaded = ingest::load_curve_quotes(&config.curve_path(benchmark), config.volume_floor(benchmark))?;
    ingest::log_curve_stats(benchmark.display_name(), &loaded.stats, log);
    Ok(loaded.surface)
}

/// Run one universe in memory.
pub fn run_universe(
    benchmark: Benchmark,
    bonds: &[Bond],
    yields: &YieldTimeSeries,
    curve_surface: &YieldSurface,
    config: &RunConfig,
    log: &mut dyn ProgressLog,
) -> Result<UniverseRun, AppError> {
    log.line(&format!("=== {} universe ===", benchmark.display_name()));

    let with_history = universe::with_yield_history(bonds, yields, log);
    let screened = Screen::corporate(benchmark).apply(&with_history, log);

    let grid = config.grid(benchmark)?;
    let curve = interpolate_surface(curve_surface, &grid, benchmark, log)?;

    let windows = spread::build_observation_windows(&screened, yields, &curve, config.window, log);
    let output = spread::compute_spreads(&screened, yields, &curve, &windows, config.day_count, log);
    let filtered = spread::filter_anomalies(output.spreads.clone(), config.anomaly, log);
    let surface = report::pivot_spreads(&filtered.kept, &grid);
    log.line(&format!(
        "Spread surface: {} dates x {} buckets",
        surface.dates.len(),
        surface.labels.len()
    ));

    Ok(UniverseRun {
        benchmark,
        curve,
        bonds: screened,
        output,
        filtered,
        surface,
    })
}

/// Run the selected universes from files and write every artifact.
pub fn run_all(config: &RunConfig, universes: &[Benchmark]) -> Result<RunReport, AppError> {
    std::fs::create_dir_all(&config.out_dir).map_err(|e| {
        AppError::io(format!("Failed to create output dir '{}': {e}", config.out_dir.display()))
    })?;

    let master = ingest::load_bond_master(&config.bonds_path())?;
    let yields = ingest::load_yield_series(&config.yields_path())?;

    let mut report = RunReport::default();
    for &benchmark in universes {
        let log_path = config.out_dir.join(format!("logs_{}.txt", benchmark.key()));
        let mut log = FileLog::create(&log_path, benchmark.key())?;
        log_inputs(&master, &yields, &mut log);

        let result = load_surface(config, benchmark, &mut log)
            .and_then(|surface| run_universe(benchmark, &master.bonds, &yields, &surface, config, &mut log))
            .and_then(|run| write_universe(&run, &config.out_dir, &mut log).map(|_| run));

        match result {
            Ok(run) => report.runs.push(run),
            Err(err) => {
                log.line(&format!("{} universe aborted: {err}", benchmark.display_name()));
                tracing::error!(universe = benchmark.key(), "{err}");
                report.failures.push((benchmark, err));
            }
        }
        log.flush()?;
    }

    let finals: Vec<(Benchmark, &[_])> = report
        .runs
        .iter()
        .map(|r| (r.benchmark, r.filtered.kept.as_slice()))
        .collect();
    report.benchmark_rows = report::benchmark_summary(&finals, &master.bonds);
    export::write_benchmark_summary(&config.out_dir.join("benchmark_summary_table.csv"), &report.benchmark_rows)?;
    export::write_text(
        &config.out_dir.join("benchmark_summary_table.html"),
        &export::benchmark_summary_html("Benchmark summary", &report.benchmark_rows),
    )?;
    tracing::info!(rows = report.benchmark_rows.len(), "benchmark summary written");

    Ok(report)
}

fn write_universe(run: &UniverseRun, out_dir: &Path, log: &mut dyn ProgressLog) -> Result<(), AppError> {
    let u = run.benchmark.key();
    let name = run.benchmark.display_name();
    let path = |file: String| out_dir.join(file);

    let curve_csv = path(format!("{u}_curve_table.csv"));
    export::write_curve_table(&curve_csv, &run.curve)?;

    let chart = plot::curve_surface_svg(&run.curve, &format!("{name} interpolated yield surface"))?;
    let surface_html = path(format!("{u}_surface.html"));
    export::write_text(&surface_html, &html::page(&format!("{name} yield surface"), &chart))?;

    let curve_summary = path(format!("{u}_summary_table.html"));
    export::write_text(
        &curve_summary,
        &export::curve_summary_html(&format!("{name} curve summary"), &report::summarize_curve(&run.curve)),
    )?;

    let spreads_csv = path(format!("corp_bonds_{u}_summary.csv"));
    export::write_spreads(&spreads_csv, &run.filtered.kept)?;

    let pivot_csv = path(format!("{u}_spread_surface.csv"));
    export::write_spread_surface(&pivot_csv, &run.surface)?;
    let heatmap = plot::spread_heatmap_svg(&run.surface, &format!("{name} spread surface"), HeatScale::default())?;
    let pivot_html = path(format!("{u}_spread_surface.html"));
    export::write_text(&pivot_html, &html::page(&format!("{name} spread surface"), &heatmap))?;

    let bond_summary = path(format!("summary_{}_table.html", name));
    export::write_text(
        &bond_summary,
        &export::bond_summary_html(&format!("{name} bond spreads"), &report::summarize_bonds(&run.filtered.kept)),
    )?;

    let skipped_csv = path(format!("skipped_{u}_yields.csv"));
    export::write_skipped(&skipped_csv, &run.output.skipped)?;

    for p in [
        &curve_csv,
        &surface_html,
        &curve_summary,
        &spreads_csv,
        &pivot_csv,
        &pivot_html,
        &bond_summary,
        &skipped_csv,
    ] {
        log.line(&format!("wrote {}", p.display()));
    }
    Ok(())
}

/// Apply an ad-hoc screen to the bond master.
pub fn screen_bonds(config: &RunConfig, screen: &Screen, log: &mut dyn ProgressLog) -> Result<Vec<Bond>, AppError> {
    let master = ingest::load_bond_master(&config.bonds_path())?;
    Ok(screen.apply(&master.bonds, log))
}
