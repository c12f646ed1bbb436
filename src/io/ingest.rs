//! CSV ingest and normalization.
//!
//! Three inputs, each an export of one workbook sheet:
//!
//! - bond master: one row per bond, static attributes
//! - yield time series: first column is the date, one column per bond id
//! - benchmark curve quotes: long form (`Curve date`, `Generic ticker`,
//!   `Term`, `px_last`, optional `volume`)
//!
//! Validation policy:
//! - missing files/columns are configuration errors (exit code 2)
//! - a malformed curve quote or yield-date cell is a data error that aborts
//!   the load (exit code 3); dropping it would distort the curve
//! - bond-master rows that fail to parse are rejected into `row_errors` and
//!   reported, the rest of the sheet is still usable
//!
//! Header matching is case-insensitive; spaces become `_` and a UTF-8 BOM is
//! stripped, so `Curve date` matches `curve_date`.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{Bond, CurvePoint, YieldSurface, YieldTimeSeries};
use crate::error::AppError;
use crate::log::ProgressLog;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub id: Option<String>,
    pub message: String,
}

/// Bond master ingest output.
#[derive(Debug, Clone, Default)]
pub struct BondMaster {
    pub bonds: Vec<Bond>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub duplicates: usize,
}

impl BondMaster {
    pub fn get(&self, id: &str) -> Option<&Bond> {
        self.bonds.iter().find(|b| b.id == id)
    }
}

/// Counts for every quote the surface loader dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurveLoadStats {
    pub rows_read: usize,
    pub missing_values: usize,
    pub non_positive_yield: usize,
    pub low_volume: usize,
    pub duplicate_quotes: usize,
    pub points_used: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LoadedCurve {
    pub surface: YieldSurface,
    pub stats: CurveLoadStats,
}

pub fn load_bond_master(path: &Path) -> Result<BondMaster, AppError> {
    read_bond_master(open(path)?, &path.display().to_string())
}

pub fn load_yield_series(path: &Path) -> Result<YieldTimeSeries, AppError> {
    read_yield_series(open(path)?, &path.display().to_string())
}

pub fn load_curve_quotes(path: &Path, volume_floor: Option<f64>) -> Result<LoadedCurve, AppError> {
    read_curve_quotes(open(path)?, &path.display().to_string(), volume_floor)
}

/// Log the ingest summary for a curve file.
pub fn log_curve_stats(name: &str, stats: &CurveLoadStats, log: &mut dyn ProgressLog) {
    log.line(&format!(
        "{name} quotes: {} rows read | dropped: {} missing, {} non-positive yield, {} low volume, {} duplicate | {} points used",
        stats.rows_read,
        stats.missing_values,
        stats.non_positive_yield,
        stats.low_volume,
        stats.duplicate_quotes,
        stats.points_used
    ));
}

pub fn read_bond_master<R: Read>(reader: R, source: &str) -> Result<BondMaster, AppError> {
    let mut reader = csv_reader(reader);
    let header_map = read_header_map(&mut reader, source)?;
    require_columns(&header_map, &["id", "maturity"], source)?;

    let mut master = BondMaster::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        master.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                master.row_errors.push(RowError {
                    line,
                    id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_bond(&record, &header_map) {
            Ok(bond) => {
                if !seen.insert(bond.id.clone()) {
                    master.duplicates += 1;
                    continue;
                }
                master.bonds.push(bond);
            }
            Err(message) => master.row_errors.push(RowError {
                line,
                id: get_optional(&record, &header_map, "id").map(str::to_string),
                message,
            }),
        }
    }

    Ok(master)
}

pub fn read_yield_series<R: Read>(reader: R, source: &str) -> Result<YieldTimeSeries, AppError> {
    let mut reader = csv_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| AppError::config(format!("Failed to read headers of '{source}': {e}")))?
        .clone();
    if headers.len() < 2 {
        return Err(AppError::config(format!(
            "'{source}' needs a date column followed by at least one bond column."
        )));
    }

    let ids: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();
    let mut series = YieldTimeSeries::new();
    for id in &ids {
        series.add_bond(id);
    }

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result.map_err(|e| AppError::data(format!("'{source}' line {line}: CSV parse error: {e}")))?;

        let Some(raw_date) = record.get(0).map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        let date = parse_date(raw_date).map_err(|e| AppError::data(format!("'{source}' line {line}: {e}")))?;
        series.add_date(date);

        for (col, id) in ids.iter().enumerate() {
            if let Some(value) = record.get(col + 1).and_then(parse_cell) {
                series.insert(id, date, value);
            }
        }
    }

    Ok(series)
}

pub fn read_curve_quotes<R: Read>(reader: R, source: &str, volume_floor: Option<f64>) -> Result<LoadedCurve, AppError> {
    let mut reader = csv_reader(reader);
    let header_map = read_header_map(&mut reader, source)?;
    require_columns(&header_map, &["curve_date", "generic_ticker", "term", "px_last"], source)?;
    let has_volume = header_map.contains_key("volume");

    let mut stats = CurveLoadStats::default();
    // Keyed by (ticker, date); a later quote replaces an earlier one.
    let mut quotes: Vec<Option<CurvePoint>> = Vec::new();
    let mut latest: HashMap<(String, NaiveDate), usize> = HashMap::new();

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        stats.rows_read += 1;
        let record = result.map_err(|e| AppError::data(format!("'{source}' line {line}: CSV parse error: {e}")))?;

        let date = get_required(&record, &header_map, "curve_date")
            .and_then(parse_date)
            .map_err(|e| AppError::data(format!("'{source}' line {line}: {e}")))?;
        let ticker = get_optional(&record, &header_map, "generic_ticker").unwrap_or_default().to_string();
        // A malformed tenor is an error even on rows the filters below would drop.
        let tenor = get_optional(&record, &header_map, "term")
            .map(parse_tenor)
            .transpose()
            .map_err(|e| AppError::data(format!("'{source}' line {line}: {e}")))?;

        if let (Some(floor), true) = (volume_floor, has_volume) {
            let volume = parse_opt_f64(get_optional(&record, &header_map, "volume"));
            if !volume.is_some_and(|v| v > floor) {
                stats.low_volume += 1;
                continue;
            }
        }

        let (Some(tenor_years), Some(yield_pct)) = (tenor, parse_opt_f64(get_optional(&record, &header_map, "px_last")))
        else {
            stats.missing_values += 1;
            continue;
        };
        if yield_pct <= 0.0 {
            stats.non_positive_yield += 1;
            continue;
        }

        let point = CurvePoint {
            obs_date: date,
            tenor_years,
            yield_pct,
            instrument_id: ticker.clone(),
        };
        if let Some(prev) = latest.insert((ticker, date), quotes.len()) {
            quotes[prev] = None;
            stats.duplicate_quotes += 1;
        }
        quotes.push(Some(point));
    }

    let points: Vec<CurvePoint> = quotes.into_iter().flatten().collect();
    let n_quotes = points.len();
    let surface = YieldSurface::from_points(points);
    stats.duplicate_quotes += n_quotes - surface.n_points();
    stats.points_used = surface.n_points();

    Ok(LoadedCurve { surface, stats })
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::config(format!("Failed to open input '{}': {e}", path.display())))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn read_header_map<R: Read>(reader: &mut csv::Reader<R>, source: &str) -> Result<HashMap<String, usize>, AppError> {
    let headers = reader
        .headers()
        .map_err(|e| AppError::config(format!("Failed to read headers of '{source}': {e}")))?;
    Ok(build_header_map(headers))
}

fn require_columns(header_map: &HashMap<String, usize>, names: &[&str], source: &str) -> Result<(), AppError> {
    for name in names {
        if !header_map.contains_key(*name) {
            return Err(AppError::config(format!("'{source}' is missing required column: `{name}`")));
        }
    }
    Ok(())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}').trim();
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_lowercase()
}

fn parse_bond(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<Bond, String> {
    let id = get_required(record, header_map, "id")?.to_string();
    let maturity = parse_date(get_required(record, header_map, "maturity")?)?;

    let first_quote_date = match get_optional(record, header_map, "first_quote_date") {
        Some(s) => Some(parse_date(s)?),
        None => None,
    };

    let text = |name: &str| get_optional(record, header_map, name).map(str::to_string);

    Ok(Bond {
        id,
        maturity,
        coupon_type: text("cpn_typ"),
        currency: text("crncy"),
        classification: text("classification_level_4_name"),
        industry_sector: text("industry_sector"),
        industry_group: text("industry_group"),
        inflation_linked: text("inflation_linked_indicator"),
        debt_to_ebitda: parse_opt_f64(get_optional(record, header_map, "tot_debt_to_ebitda")),
        issuer: text("issuer"),
        exchange_ticker: text("ult_parent_ticker_exchange"),
        description: text("cie_des_bulk"),
        first_quote_date,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a date in one of the common export formats.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    let s = s.trim();
    // Excel exports sometimes carry a midnight time component.
    let s = s.split_once(|c: char| c == ' ' || c == 'T').map_or(s, |(date, _)| date);
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD."
    ))
}

/// Parse a curve term into years.
///
/// Accepts a plain number of years (`2.5`) or a count with a unit suffix:
/// `D` (act/365), `W`, `M`, `Y` (`6M`, `10Y`). The result must be finite
/// and strictly positive.
pub fn parse_tenor(s: &str) -> Result<f64, String> {
    let s = s.trim();
    let upper = s.to_ascii_uppercase();
    let (number, scale) = match upper.chars().last() {
        Some('D') => (&upper[..upper.len() - 1], 1.0 / 365.0),
        Some('W') => (&upper[..upper.len() - 1], 7.0 / 365.0),
        Some('M') => (&upper[..upper.len() - 1], 1.0 / 12.0),
        Some('Y') => (&upper[..upper.len() - 1], 1.0),
        _ => (upper.as_str(), 1.0),
    };
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("Invalid term '{s}' (expected years or <n>D/W/M/Y)."))?;
    let years = value * scale;
    if !(years.is_finite() && years > 0.0) {
        return Err(format!("Invalid term '{s}': tenor must be finite and > 0."));
    }
    Ok(years)
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// A yield cell. Blank or text (`#N/A`) means "not quoted"; a literal `NaN`
/// is kept so the spread stage can report it as an invalid yield.
fn parse_cell(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok()
}
