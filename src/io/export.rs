//! Artifact writers.
//!
//! Every table is written twice at most: a CSV meant for spreadsheets and
//! downstream scripts, and (for the summary tables) a static HTML page.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::{InterpolatedCurveTable, SkipRecord, SpreadRecord};
use crate::error::AppError;
use crate::report::html;
use crate::report::{BenchmarkRow, BondSpreadSummary, LabelSummary, SpreadSurface};

#[derive(Debug, Serialize)]
struct SpreadRow<'a> {
    #[serde(rename = "Bond ID")]
    bond_id: &'a str,
    #[serde(rename = "Obs Date")]
    obs_date: String,
    #[serde(rename = "Corp Yield (%)")]
    bond_yield: f64,
    #[serde(rename = "Tenor (yrs)")]
    tenor_years: f64,
    #[serde(rename = "Tenor Bucket")]
    tenor_bucket: &'a str,
    #[serde(rename = "Benchmark Yield (%)")]
    benchmark_yield: f64,
    #[serde(rename = "Spread (bp)")]
    spread_bp: f64,
}

#[derive(Debug, Serialize)]
struct SkipRow<'a> {
    #[serde(rename = "Bond ID")]
    bond_id: &'a str,
    #[serde(rename = "Obs Date")]
    obs_date: String,
    #[serde(rename = "Reason")]
    reason: &'static str,
}

#[derive(Debug, Serialize)]
struct BenchmarkCsvRow<'a> {
    #[serde(rename = "Bond ID")]
    bond_id: &'a str,
    #[serde(rename = "Benchmark")]
    benchmark: &'static str,
    #[serde(rename = "Issuer")]
    issuer: &'a str,
    #[serde(rename = "Exchange Code")]
    exchange_ticker: &'a str,
    #[serde(rename = "Sector Group")]
    industry_group: &'a str,
    #[serde(rename = "Debt/EBITDA")]
    debt_to_ebitda: Option<f64>,
    #[serde(rename = "Description")]
    description: &'a str,
}

/// Interpolated curve table: `Date` then one column per grid label.
/// Undefined cells are left empty.
pub fn write_curve_table(path: &Path, table: &InterpolatedCurveTable) -> Result<(), AppError> {
    let mut w = csv_writer(path)?;
    let mut header = vec!["Date".to_string()];
    header.extend(table.grid().buckets().iter().map(|b| b.label.clone()));
    w.write_record(&header).map_err(|e| write_err(path, e))?;

    for (date, row) in table.rows() {
        let mut record = vec![date.to_string()];
        record.extend(row.iter().map(|v| fmt_cell(*v)));
        w.write_record(&record).map_err(|e| write_err(path, e))?;
    }
    finish(w, path)
}

pub fn write_spreads(path: &Path, records: &[SpreadRecord]) -> Result<(), AppError> {
    let mut w = csv_writer(path)?;
    if records.is_empty() {
        write_header(&mut w, path, &SPREAD_HEADER)?;
    }
    for r in records {
        w.serialize(SpreadRow {
            bond_id: &r.bond_id,
            obs_date: r.obs_date.to_string(),
            bond_yield: r.bond_yield,
            tenor_years: r.tenor_years,
            tenor_bucket: &r.tenor_bucket,
            benchmark_yield: r.benchmark_yield,
            spread_bp: r.spread_bp,
        })
        .map_err(|e| write_err(path, e))?;
    }
    finish(w, path)
}

pub fn write_skipped(path: &Path, records: &[SkipRecord]) -> Result<(), AppError> {
    let mut w = csv_writer(path)?;
    if records.is_empty() {
        write_header(&mut w, path, &["Bond ID", "Obs Date", "Reason"])?;
    }
    for r in records {
        w.serialize(SkipRow {
            bond_id: &r.bond_id,
            obs_date: r.obs_date.map(|d| d.to_string()).unwrap_or_default(),
            reason: r.reason.as_str(),
        })
        .map_err(|e| write_err(path, e))?;
    }
    finish(w, path)
}

/// Spread surface pivot: `Obs Date` then one column per populated bucket.
pub fn write_spread_surface(path: &Path, surface: &SpreadSurface) -> Result<(), AppError> {
    let mut w = csv_writer(path)?;
    let mut header = vec!["Obs Date".to_string()];
    header.extend(surface.labels.iter().cloned());
    w.write_record(&header).map_err(|e| write_err(path, e))?;

    for (date, row) in surface.dates.iter().zip(&surface.cells) {
        let mut record = vec![date.to_string()];
        record.extend(row.iter().map(|v| fmt_cell(*v)));
        w.write_record(&record).map_err(|e| write_err(path, e))?;
    }
    finish(w, path)
}

pub fn write_benchmark_summary(path: &Path, rows: &[BenchmarkRow]) -> Result<(), AppError> {
    let mut w = csv_writer(path)?;
    if rows.is_empty() {
        write_header(&mut w, path, &BENCHMARK_HEADER)?;
    }
    for r in rows {
        w.serialize(BenchmarkCsvRow {
            bond_id: &r.bond_id,
            benchmark: r.benchmark.display_name(),
            issuer: &r.issuer,
            exchange_ticker: &r.exchange_ticker,
            industry_group: &r.industry_group,
            debt_to_ebitda: r.debt_to_ebitda,
            description: &r.description,
        })
        .map_err(|e| write_err(path, e))?;
    }
    finish(w, path)
}

pub fn write_text(path: &Path, contents: &str) -> Result<(), AppError> {
    std::fs::write(path, contents).map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))
}

pub fn curve_summary_html(title: &str, rows: &[LabelSummary]) -> String {
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.label.clone(),
                r.n.to_string(),
                r.latest.map(|(d, _)| d.to_string()).unwrap_or_default(),
                fmt_cell(r.latest.map(|(_, v)| v)),
                fmt_cell(r.mean),
                fmt_cell(r.min),
                fmt_cell(r.max),
            ]
        })
        .collect();
    html::page(
        title,
        &html::table(&["Tenor", "N", "Latest Date", "Latest (%)", "Mean (%)", "Min (%)", "Max (%)"], &body),
    )
}

pub fn bond_summary_html(title: &str, rows: &[BondSpreadSummary]) -> String {
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.bond_id.clone(),
                r.n_obs.to_string(),
                r.first_date.to_string(),
                r.last_date.to_string(),
                format!("{:.2}", r.last_spread_bp),
                format!("{:.2}", r.mean_spread_bp),
                r.last_bucket.clone(),
            ]
        })
        .collect();
    html::page(
        title,
        &html::table(
            &["Bond ID", "Obs", "First Date", "Last Date", "Last Spread (bp)", "Mean Spread (bp)", "Last Bucket"],
            &body,
        ),
    )
}

pub fn benchmark_summary_html(title: &str, rows: &[BenchmarkRow]) -> String {
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.bond_id.clone(),
                r.benchmark.display_name().to_string(),
                r.issuer.clone(),
                r.exchange_ticker.clone(),
                r.industry_group.clone(),
                r.debt_to_ebitda.map(|v| format!("{v:.2}")).unwrap_or_default(),
                r.description.clone(),
            ]
        })
        .collect();
    html::page(title, &html::table(&BENCHMARK_HEADER, &body))
}

const SPREAD_HEADER: [&str; 7] = [
    "Bond ID",
    "Obs Date",
    "Corp Yield (%)",
    "Tenor (yrs)",
    "Tenor Bucket",
    "Benchmark Yield (%)",
    "Spread (bp)",
];

const BENCHMARK_HEADER: [&str; 7] = [
    "Bond ID",
    "Benchmark",
    "Issuer",
    "Exchange Code",
    "Sector Group",
    "Debt/EBITDA",
    "Description",
];

fn csv_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    csv::Writer::from_path(path).map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))
}

fn write_header(w: &mut csv::Writer<File>, path: &Path, header: &[&str]) -> Result<(), AppError> {
    w.write_record(header).map_err(|e| write_err(path, e))
}

fn finish(mut w: csv::Writer<File>, path: &Path) -> Result<(), AppError> {
    w.flush()
        .map_err(|e| AppError::io(format!("Failed to flush '{}': {e}", path.display())))
}

fn write_err(path: &Path, e: csv::Error) -> AppError {
    AppError::io(format!("Failed to write '{}': {e}", path.display()))
}

fn fmt_cell(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.6}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::tempdir;

    use super::*;
    use crate::domain::{Benchmark, SkipReason, TargetTenorGrid};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn spreads_csv_has_named_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corp.csv");
        let rec = SpreadRecord {
            bond_id: "ACME, 2030".to_string(),
            obs_date: d(2024, 3, 1),
            bond_yield: 12.0,
            tenor_years: 5.5,
            tenor_bucket: "5Y".to_string(),
            benchmark_yield: 10.85,
            spread_bp: 115.0,
        };
        write_spreads(&path, &[rec]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Bond ID,Obs Date,Corp Yield (%),Tenor (yrs),Tenor Bucket,Benchmark Yield (%),Spread (bp)"
        );
        assert_eq!(lines.next().unwrap(), "\"ACME, 2030\",2024-03-01,12.0,5.5,5Y,10.85,115.0");
    }

    #[test]
    fn empty_outputs_still_carry_headers() {
        let dir = tempdir().unwrap();
        let (spreads, summary) = (dir.path().join("s.csv"), dir.path().join("b.csv"));
        write_spreads(&spreads, &[]).unwrap();
        write_benchmark_summary(&summary, &[]).unwrap();
        assert!(std::fs::read_to_string(&spreads).unwrap().starts_with("Bond ID,Obs Date"));
        assert!(std::fs::read_to_string(&summary).unwrap().starts_with("Bond ID,Benchmark"));
    }

    #[test]
    fn skipped_rows_without_date_are_blank() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("skipped.csv");
        let rows = vec![
            SkipRecord {
                bond_id: "A".to_string(),
                obs_date: Some(d(2024, 3, 1)),
                reason: SkipReason::InvalidBondYield,
            },
            SkipRecord {
                bond_id: "B".to_string(),
                obs_date: None,
                reason: SkipReason::NoOverlappingDates,
            },
        ];
        write_skipped(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("A,2024-03-01,invalid bond yield"));
        assert!(text.contains("B,,no overlapping observation dates"));
    }

    #[test]
    fn curve_table_leaves_undefined_cells_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("curve.csv");
        let grid = TargetTenorGrid::from_pairs(&[("1Y", 1.0), ("5Y", 5.0)]).unwrap();
        let mut table = InterpolatedCurveTable::new(grid);
        table.insert(d(2024, 3, 1), vec![Some(10.5), None]).unwrap();
        write_curve_table(&path, &table).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Date,1Y,5Y\n2024-03-01,10.500000,\n");
    }

    #[test]
    fn benchmark_html_lists_rows() {
        let rows = vec![BenchmarkRow {
            bond_id: "A".to_string(),
            benchmark: Benchmark::Ipca,
            issuer: "Acme".to_string(),
            exchange_ticker: "ACME3 BZ".to_string(),
            industry_group: "Electric".to_string(),
            debt_to_ebitda: Some(2.0),
            description: String::new(),
        }];
        let page = benchmark_summary_html("Benchmarks", &rows);
        assert!(page.contains("<td>IPCA</td>"));
        assert!(page.contains("<td>2.00</td>"));
    }
}
