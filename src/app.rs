//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and resolves the run configuration
//! - dispatches to the pipeline
//! - prints terminal summaries

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, CommonArgs, Command, CurveArgs, RunArgs, SampleArgs, ScreenArgs};
use crate::config::RunConfig;
use crate::domain::{Benchmark, WindowSpec};
use crate::error::AppError;
use crate::log::TracingLog;
use crate::universe::Screen;

pub mod pipeline;

/// Entry point for the `spreads` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(&cli.common, args),
        Command::Curve(args) => handle_curve(&cli.common, args),
        Command::Screen(args) => handle_screen(&cli.common, args),
        Command::Sample(args) => handle_sample(&cli.common, args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (tests, embedding) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Resolve defaults, config file, environment, then CLI flags.
pub fn resolve_config(common: &CommonArgs) -> Result<RunConfig, AppError> {
    let mut config = RunConfig::load(common.config.as_deref())?;
    if let Some(dir) = &common.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &common.out_dir {
        config.out_dir = dir.clone();
    }
    Ok(config)
}

/// Apply `run` flags on top of a resolved config.
pub fn apply_run_args(config: &mut RunConfig, args: &RunArgs) -> Result<(), AppError> {
    if let Some(n) = args.last_n {
        config.window = WindowSpec::LastN(n);
    }
    if let Some(days) = args.calendar_days {
        config.window = WindowSpec::CalendarDays(days);
    }
    if let Some(min) = args.min_bp {
        config.anomaly.min_bp = min;
    }
    if let Some(max) = args.max_bp {
        config.anomaly.max_bp = max;
    }
    config.validate()
}

fn handle_run(common: &CommonArgs, args: RunArgs) -> Result<(), AppError> {
    let mut config = resolve_config(common)?;
    apply_run_args(&mut config, &args)?;

    let universes: Vec<Benchmark> = match args.universe {
        Some(b) => vec![b],
        None => Benchmark::ALL.to_vec(),
    };
    tracing::info!(
        data_dir = %config.data_dir.display(),
        out_dir = %config.out_dir.display(),
        "running {} universe(s)",
        universes.len()
    );

    let report = pipeline::run_all(&config, &universes)?;
    for run in &report.runs {
        let bonds = crate::report::summarize_bonds(&run.filtered.kept);
        println!(
            "{}",
            crate::report::format_run_summary(run.benchmark, &run.counts(), &bonds)
        );
    }
    println!(
        "Benchmark summary: {} bond/benchmark pairs -> {}",
        report.benchmark_rows.len(),
        config.out_dir.display()
    );

    // The exit code reflects the first universe that failed.
    match report.failures.into_iter().next() {
        Some((_, err)) => Err(err),
        None => Ok(()),
    }
}

fn handle_curve(common: &CommonArgs, args: CurveArgs) -> Result<(), AppError> {
    let config = resolve_config(common)?;
    let table = pipeline::load_curve_table(&config, args.benchmark, &mut TracingLog)?;

    let summary = crate::report::summarize_curve(&table);
    println!("{}", crate::report::format_curve_summary(args.benchmark, &summary));

    if let Some(path) = &args.export {
        crate::io::export::write_curve_table(path, &table)?;
        println!("Curve table written to {}", path.display());
    }
    Ok(())
}

fn handle_screen(common: &CommonArgs, args: ScreenArgs) -> Result<(), AppError> {
    let config = resolve_config(common)?;
    let screen = Screen::custom(
        &args.inflation_linked,
        args.exclude_government,
        args.exclude_financial,
        &args.coupon_types,
    );
    let bonds = pipeline::screen_bonds(&config, &screen, &mut TracingLog)?;
    println!("{}", crate::report::format_screen(&bonds));

    if let Some(path) = &args.export {
        let ids: String = bonds.iter().map(|b| format!("{}\n", b.id)).collect();
        crate::io::export::write_text(path, &ids)?;
    }
    Ok(())
}

fn handle_sample(common: &CommonArgs, args: SampleArgs) -> Result<(), AppError> {
    let config = resolve_config(common)?;
    let spec = crate::data::SampleSpec {
        seed: args.seed,
        start: args.start,
        n_days: args.days,
        bonds_per_universe: args.bonds,
    };
    let summary = crate::data::write_sample(&args.out, &config, &spec, &mut TracingLog)?;
    println!(
        "Wrote {} bonds over {} dates to {}",
        summary.bonds,
        summary.dates,
        args.out.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn run_flags_override_config() {
        let mut config = RunConfig::default();
        let args = RunArgs {
            universe: None,
            last_n: None,
            calendar_days: Some(45),
            min_bp: Some(-200.0),
            max_bp: Some(2000.0),
        };
        apply_run_args(&mut config, &args).unwrap();
        assert_eq!(config.window, WindowSpec::CalendarDays(45));
        assert_eq!(config.anomaly.min_bp, -200.0);
        assert_eq!(config.anomaly.max_bp, 2000.0);
    }

    #[test]
    fn inverted_anomaly_range_is_rejected() {
        let mut config = RunConfig::default();
        let args = RunArgs {
            universe: None,
            last_n: Some(10),
            calendar_days: None,
            min_bp: Some(50.0),
            max_bp: None,
        };
        let err = apply_run_args(&mut config, &args).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn cli_dirs_override_config() {
        let common = CommonArgs {
            config: None,
            data_dir: Some(PathBuf::from("in")),
            out_dir: Some(PathBuf::from("artifacts")),
        };
        let config = resolve_config(&common).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("in"));
        assert_eq!(config.out_dir, PathBuf::from("artifacts"));
    }
}
