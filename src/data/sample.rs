//! Seeded synthetic input data.
//!
//! Writes the four input files the pipeline reads (bond master, yield time
//! series, DI and IPCA curve quotes) with realistic shapes:
//!
//! - curves follow a Nelson-Siegel-like level/slope with a daily random walk
//! - DI quotes carry a `volume` column, a few below the configured floor
//! - bond yields are the interpolated benchmark at the bond's bucket plus a
//!   small spread, with occasional outliers, zero yields, and gaps
//! - a handful of decoy bonds exercise every universe screen rule
//!
//! The same seed always yields byte-identical files.

use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::config::RunConfig;
use crate::domain::{Benchmark, Bond, CurvePoint, InterpolatedCurveTable, YieldSurface};
use crate::error::AppError;
use crate::log::ProgressLog;
use crate::surface::interpolate_surface;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleSpec {
    pub seed: u64,
    pub start: NaiveDate,
    /// Business days of history.
    pub n_days: usize,
    /// Eligible bonds per universe (decoys come on top).
    pub bonds_per_universe: usize,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            seed: 7,
            start: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap_or_default(),
            n_days: 90,
            bonds_per_universe: 12,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSummary {
    pub bonds: usize,
    pub dates: usize,
    pub di_quotes: usize,
    pub ipca_quotes: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct QuoteRow {
    date: NaiveDate,
    ticker: String,
    term: String,
    yield_pct: f64,
    volume: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Cell {
    Value(f64),
    Missing,
}

struct SampleData {
    dates: Vec<NaiveDate>,
    bonds: Vec<Bond>,
    /// Column order of the yield sheet, with one row of cells per date.
    yield_ids: Vec<String>,
    yield_cells: Vec<Vec<Cell>>,
    di: Vec<QuoteRow>,
    ipca: Vec<QuoteRow>,
}

/// (ticker, issuer, industry group)
const ISSUERS: [(&str, &str, &str); 8] = [
    ("ENRG", "Energia Paulista SA", "Electric"),
    ("RODV", "Rodovias do Sul SA", "Transportation"),
    ("SANB", "Saneamento Basico SA", "Water"),
    ("TELC", "Telecom Nacional SA", "Telecommunications"),
    ("MINR", "Mineracao Vale Verde SA", "Mining"),
    ("PAPL", "Papel e Celulose SA", "Forest Products&Paper"),
    ("AGRO", "Agro Cerrado SA", "Agriculture"),
    ("LOGI", "Logistica Atlantica SA", "Transportation"),
];

/// DI nodes as months to maturity.
const DI_NODES_MONTHS: [u32; 9] = [4, 8, 14, 26, 38, 50, 66, 90, 126];
/// IPCA nodes in years.
const IPCA_NODES_YEARS: [f64; 9] = [1.5, 2.5, 4.0, 6.0, 9.0, 13.0, 18.0, 25.0, 32.0];

/// Generate the sample and write it using the file names in `config`.
pub fn write_sample(
    dir: &Path,
    config: &RunConfig,
    spec: &SampleSpec,
    log: &mut dyn ProgressLog,
) -> Result<SampleSummary, AppError> {
    if spec.n_days < 2 || spec.bonds_per_universe == 0 {
        return Err(AppError::config("Sample needs at least 2 days and 1 bond per universe."));
    }
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::io(format!("Failed to create sample dir '{}': {e}", dir.display())))?;

    let data = generate(config, spec, log)?;

    write_bond_master(&dir.join(&config.bonds_file), &data.bonds)?;
    write_yields(&dir.join(&config.yields_file), &data)?;
    write_quotes(&dir.join(&config.di_curve_file), &data.di, true)?;
    write_quotes(&dir.join(&config.ipca_curve_file), &data.ipca, false)?;

    let summary = SampleSummary {
        bonds: data.bonds.len(),
        dates: data.dates.len(),
        di_quotes: data.di.len(),
        ipca_quotes: data.ipca.len(),
    };
    log.line(&format!(
        "Sample written to {}: {} bonds, {} dates, {} DI quotes, {} IPCA quotes",
        dir.display(),
        summary.bonds,
        summary.dates,
        summary.di_quotes,
        summary.ipca_quotes
    ));
    Ok(summary)
}

fn generate(config: &RunConfig, spec: &SampleSpec, log: &mut dyn ProgressLog) -> Result<SampleData, AppError> {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, 1.0).map_err(|e| AppError::io(format!("Noise distribution error: {e}")))?;

    let dates = business_days(spec.start, spec.n_days);
    let end = dates.last().copied().unwrap_or(spec.start);

    let di = curve_quotes(Benchmark::Di, &dates, &mut rng, &normal);
    let ipca = curve_quotes(Benchmark::Ipca, &dates, &mut rng, &normal);

    let mut bonds = Vec::new();
    let mut yield_ids = Vec::new();
    let mut columns: Vec<Vec<Cell>> = Vec::new();
    let mut serial = 0usize;

    for (benchmark, quotes) in [(Benchmark::Di, &di), (Benchmark::Ipca, &ipca)] {
        let table = benchmark_table(config, benchmark, quotes, log)?;
        let grid = table.grid().clone();
        let max_years = match benchmark {
            Benchmark::Di => 9.0,
            Benchmark::Ipca => 24.0,
        };

        let n_decoys = 5;
        for i in 0..spec.bonds_per_universe + n_decoys {
            serial += 1;
            let (ticker, issuer, group) = ISSUERS[serial % ISSUERS.len()];

            let maturity = if i == 1 {
                // Matures inside the sample so later dates are skipped.
                dates[dates.len() * 2 / 3]
            } else {
                end + Duration::days(rng.gen_range(200..(max_years * 365.0) as i64))
            };

            let coupon = table
                .row(end)
                .and_then(|row| row.iter().flatten().next().copied())
                .unwrap_or(10.0);
            let id = format!("{ticker}{serial:02} {coupon:.2} {} Corp", maturity.format("%m/%d/%y"));

            let mut bond = Bond {
                id: id.clone(),
                maturity,
                coupon_type: Some("FIXED".to_string()),
                currency: Some("BRL".to_string()),
                classification: Some("Corporate Bonds".to_string()),
                industry_sector: Some("Utilities".to_string()),
                industry_group: Some(group.to_string()),
                inflation_linked: Some(benchmark.inflation_flag().to_string()),
                debt_to_ebitda: Some((rng.gen_range(0.5..4.5_f64) * 100.0).round() / 100.0),
                issuer: Some(issuer.to_string()),
                exchange_ticker: Some(format!("{ticker}3 BZ")),
                description: Some(format!("{issuer} debenture, {} linked", benchmark.display_name())),
                first_quote_date: (i == 2).then(|| dates[dates.len() / 2]),
            };

            // Decoys, one per screen rule.
            match i.checked_sub(spec.bonds_per_universe) {
                Some(0) => bond.classification = Some("Government Regional".to_string()),
                Some(1) => bond.industry_sector = Some("Financial".to_string()),
                Some(2) => bond.coupon_type = Some("FLOATING".to_string()),
                Some(3) => bond.currency = Some("USD".to_string()),
                Some(4) => bond.debt_to_ebitda = None,
                _ => {}
            }

            let column = dates
                .iter()
                .map(|&date| {
                    let roll: f64 = rng.r#gen();
                    if roll < 0.03 {
                        return Cell::Missing;
                    }
                    if roll < 0.04 {
                        return Cell::Value(0.0);
                    }
                    let tenor = config.day_count.year_fraction(date, maturity);
                    let bucket = grid.nearest(tenor.max(0.0));
                    let base = table.value(date, bucket).unwrap_or(coupon);
                    let spread_bp = if roll > 0.95 {
                        rng.gen_range(30.0..300.0) * if rng.gen_bool(0.5) { 1.0 } else { -1.0 }
                    } else {
                        4.0 * normal.sample(&mut rng)
                    };
                    Cell::Value(round4(base + spread_bp / 100.0))
                })
                .collect();

            bonds.push(bond);
            yield_ids.push(id);
            columns.push(column);
        }
    }

    // In the bond master but never quoted.
    serial += 1;
    bonds.push(Bond {
        id: format!("ORPH{serial:02} 11.00 01/15/30 Corp"),
        maturity: end + Duration::days(2000),
        coupon_type: Some("FIXED".to_string()),
        currency: Some("BRL".to_string()),
        inflation_linked: Some("N".to_string()),
        debt_to_ebitda: Some(1.0),
        ..Bond::default()
    });

    let yield_cells = (0..dates.len())
        .map(|row| columns.iter().map(|col| col[row]).collect())
        .collect();

    Ok(SampleData {
        dates,
        bonds,
        yield_ids,
        yield_cells,
        di,
        ipca,
    })
}

fn business_days(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(n);
    let mut d = start;
    while out.len() < n {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(d);
        }
        d += Duration::days(1);
    }
    out
}

fn curve_quotes(benchmark: Benchmark, dates: &[NaiveDate], rng: &mut StdRng, normal: &Normal<f64>) -> Vec<QuoteRow> {
    let (level0, slope, decay) = match benchmark {
        Benchmark::Di => (10.4, 1.1, 3.0),
        Benchmark::Ipca => (5.2, 0.9, 6.0),
    };
    let nodes: Vec<(String, String, f64)> = match benchmark {
        Benchmark::Di => DI_NODES_MONTHS
            .iter()
            .enumerate()
            .map(|(i, m)| (format!("OD{}", i + 1), format!("{m}M"), f64::from(*m) / 12.0))
            .collect(),
        Benchmark::Ipca => IPCA_NODES_YEARS
            .iter()
            .enumerate()
            .map(|(i, y)| (format!("NTNB{}", i + 1), format!("{y}"), *y))
            .collect(),
    };

    let mut level = level0;
    let mut rows = Vec::with_capacity(dates.len() * nodes.len());
    for &date in dates {
        level += 0.02 * normal.sample(rng);
        for (ticker, term, years) in &nodes {
            let y = level + slope * (1.0 - (-years / decay).exp()) + 0.01 * normal.sample(rng);
            let volume = match benchmark {
                Benchmark::Di if rng.gen_bool(0.05) => Some(200.0),
                Benchmark::Di => Some(rng.gen_range(2_000.0..80_000.0_f64).round()),
                Benchmark::Ipca => None,
            };
            rows.push(QuoteRow {
                date,
                ticker: ticker.clone(),
                term: term.clone(),
                yield_pct: round4(y),
                volume,
            });
        }
    }
    rows
}

/// The interpolated benchmark exactly as the pipeline will see it.
fn benchmark_table(
    config: &RunConfig,
    benchmark: Benchmark,
    quotes: &[QuoteRow],
    log: &mut dyn ProgressLog,
) -> Result<InterpolatedCurveTable, AppError> {
    let floor = config.volume_floor(benchmark);
    let points = quotes
        .iter()
        .filter(|q| match (floor, q.volume) {
            (Some(f), Some(v)) => v > f,
            _ => true,
        })
        .map(|q| {
            let tenor_years = match benchmark {
                Benchmark::Di => q.term.trim_end_matches('M').parse::<f64>().unwrap_or(0.0) / 12.0,
                Benchmark::Ipca => q.term.parse::<f64>().unwrap_or(0.0),
            };
            CurvePoint {
                obs_date: q.date,
                tenor_years,
                yield_pct: q.yield_pct,
                instrument_id: q.ticker.clone(),
            }
        })
        .collect();
    let surface = YieldSurface::from_points(points);
    interpolate_surface(&surface, &config.grid(benchmark)?, benchmark, log)
}

fn write_bond_master(path: &Path, bonds: &[Bond]) -> Result<(), AppError> {
    let mut w = writer(path)?;
    let header = [
        "ID",
        "MATURITY",
        "CPN_TYP",
        "CRNCY",
        "CLASSIFICATION_LEVEL_4_NAME",
        "INDUSTRY_SECTOR",
        "INDUSTRY_GROUP",
        "INFLATION_LINKED_INDICATOR",
        "TOT_DEBT_TO_EBITDA",
        "ISSUER",
        "ULT_PARENT_TICKER_EXCHANGE",
        "CIE DES BULK",
        "FIRST_QUOTE_DATE",
    ];
    w.write_record(header).map_err(|e| write_err(path, e))?;

    for b in bonds {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let record = [
            b.id.clone(),
            b.maturity.to_string(),
            text(&b.coupon_type),
            text(&b.currency),
            text(&b.classification),
            text(&b.industry_sector),
            text(&b.industry_group),
            text(&b.inflation_linked),
            b.debt_to_ebitda.map(|v| v.to_string()).unwrap_or_else(|| "#N/A N/A".to_string()),
            text(&b.issuer),
            text(&b.exchange_ticker),
            text(&b.description),
            b.first_quote_date.map(|d| d.to_string()).unwrap_or_default(),
        ];
        w.write_record(&record).map_err(|e| write_err(path, e))?;
    }
    flush(w, path)
}

fn write_yields(path: &Path, data: &SampleData) -> Result<(), AppError> {
    let mut w = writer(path)?;
    let mut header = vec!["Date".to_string()];
    header.extend(data.yield_ids.iter().cloned());
    w.write_record(&header).map_err(|e| write_err(path, e))?;

    for (date, row) in data.dates.iter().zip(&data.yield_cells) {
        let mut record = vec![date.to_string()];
        record.extend(row.iter().map(|cell| match cell {
            Cell::Value(v) => format!("{v:.4}"),
            Cell::Missing => "#N/A N/A".to_string(),
        }));
        w.write_record(&record).map_err(|e| write_err(path, e))?;
    }
    flush(w, path)
}

fn write_quotes(path: &Path, rows: &[QuoteRow], with_volume: bool) -> Result<(), AppError> {
    let mut w = writer(path)?;
    let mut header = vec!["Curve date", "Generic ticker", "Term", "px_last"];
    if with_volume {
        header.push("volume");
    }
    w.write_record(&header).map_err(|e| write_err(path, e))?;

    for q in rows {
        let mut record = vec![q.date.to_string(), q.ticker.clone(), q.term.clone(), format!("{:.4}", q.yield_pct)];
        if with_volume {
            record.push(q.volume.map(|v| v.to_string()).unwrap_or_default());
        }
        w.write_record(&record).map_err(|e| write_err(path, e))?;
    }
    flush(w, path)
}

fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>, AppError> {
    csv::Writer::from_path(path).map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))
}

fn flush(mut w: csv::Writer<std::fs::File>, path: &Path) -> Result<(), AppError> {
    w.flush()
        .map_err(|e| AppError::io(format!("Failed to flush '{}': {e}", path.display())))
}

fn write_err(path: &Path, e: csv::Error) -> AppError {
    AppError::io(format!("Failed to write '{}': {e}", path.display()))
}

fn round4(v: f64) -> f64 {
    (v * 1e4).round() / 1e4
}
