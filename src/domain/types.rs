//! Shared domain types.
//!
//! Everything the pipeline passes between stages lives here:
//!
//! - benchmark/universe tags (`Benchmark`) and day counts (`DayCount`)
//! - curve inputs (`CurvePoint`, `YieldSurface`) and the target grid
//! - the interpolated output (`InterpolatedCurveTable`)
//! - bond inputs (`Bond`, `YieldTimeSeries`) and spread outputs
//!
//! Types are plain data; the algorithms live in `surface` and `spread`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Benchmark curve a universe of bonds is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Benchmark {
    /// Overnight interbank rate curve (fixed-rate corporates).
    Di,
    /// Inflation-linked real-yield curve (IPCA-linked corporates).
    Ipca,
}

impl Benchmark {
    pub const ALL: [Benchmark; 2] = [Benchmark::Di, Benchmark::Ipca];

    /// Lower-case key used in artifact file names.
    pub fn key(self) -> &'static str {
        match self {
            Benchmark::Di => "di",
            Benchmark::Ipca => "ipca",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Benchmark::Di => "DI",
            Benchmark::Ipca => "IPCA",
        }
    }

    /// Value of the bond master's inflation-linked indicator for this universe.
    pub fn inflation_flag(self) -> &'static str {
        match self {
            Benchmark::Di => "N",
            Benchmark::Ipca => "Y",
        }
    }
}

impl fmt::Display for Benchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Day-count convention for remaining-tenor calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum DayCount {
    /// Actual/365 fixed.
    #[default]
    #[serde(rename = "act/365f")]
    #[value(name = "act/365f")]
    Act365F,
    /// Actual/365.25.
    #[serde(rename = "act/365.25")]
    #[value(name = "act/365.25")]
    Act365_25,
}

impl DayCount {
    pub fn year_denominator(self) -> f64 {
        match self {
            DayCount::Act365F => 365.0,
            DayCount::Act365_25 => 365.25,
        }
    }

    /// Signed year fraction from `start` to `end`.
    pub fn year_fraction(self, start: NaiveDate, end: NaiveDate) -> f64 {
        (end - start).num_days() as f64 / self.year_denominator()
    }
}

/// A single benchmark quote after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvePoint {
    pub obs_date: NaiveDate,
    pub tenor_years: f64,
    pub yield_pct: f64,
    pub instrument_id: String,
}

/// Benchmark quotes grouped by observation date, each date sorted by tenor.
#[derive(Debug, Clone, Default)]
pub struct YieldSurface {
    by_date: BTreeMap<NaiveDate, Vec<CurvePoint>>,
}

impl YieldSurface {
    /// Group points by date.
    ///
    /// Within a date, points sharing a tenor collapse to the last one seen in
    /// `points` order.
    pub fn from_points(points: Vec<CurvePoint>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Vec<CurvePoint>> = BTreeMap::new();
        for p in points {
            by_date.entry(p.obs_date).or_default().push(p);
        }

        for day in by_date.values_mut() {
            // Stable sort keeps arrival order among equal tenors.
            day.sort_by(|a, b| a.tenor_years.total_cmp(&b.tenor_years));
            let mut deduped: Vec<CurvePoint> = Vec::with_capacity(day.len());
            for p in day.drain(..) {
                match deduped.last_mut() {
                    Some(last) if last.tenor_years == p.tenor_years => *last = p,
                    _ => deduped.push(p),
                }
            }
            *day = deduped;
        }

        Self { by_date }
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.by_date.keys().copied()
    }

    pub fn points_on(&self, date: NaiveDate) -> &[CurvePoint] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[CurvePoint])> + '_ {
        self.by_date.iter().map(|(d, pts)| (*d, pts.as_slice()))
    }

    pub fn n_dates(&self) -> usize {
        self.by_date.len()
    }

    pub fn n_points(&self) -> usize {
        self.by_date.values().map(Vec::len).sum()
    }
}

/// One column of the interpolated output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenorBucket {
    pub label: String,
    pub years: f64,
}

/// Ordered target tenors a surface is evaluated on.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetTenorGrid {
    buckets: Vec<TenorBucket>,
}

impl TargetTenorGrid {
    /// Validate and sort a grid.
    ///
    /// Labels must be unique; tenors must be finite, positive and distinct.
    pub fn new(buckets: Vec<TenorBucket>) -> Result<Self, AppError> {
        if buckets.is_empty() {
            return Err(AppError::config("Tenor grid must contain at least one bucket."));
        }
        for b in &buckets {
            if !(b.years.is_finite() && b.years > 0.0) {
                return Err(AppError::config(format!(
                    "Tenor grid bucket '{}' has invalid tenor {} (must be finite and > 0).",
                    b.label, b.years
                )));
            }
        }

        let mut buckets = buckets;
        buckets.sort_by(|a, b| a.years.total_cmp(&b.years));
        for pair in buckets.windows(2) {
            if pair[0].years == pair[1].years {
                return Err(AppError::config(format!(
                    "Tenor grid buckets '{}' and '{}' share tenor {}.",
                    pair[0].label, pair[1].label, pair[0].years
                )));
            }
        }
        for (i, b) in buckets.iter().enumerate() {
            if buckets[..i].iter().any(|o| o.label == b.label) {
                return Err(AppError::config(format!("Duplicate tenor grid label '{}'.", b.label)));
            }
        }

        Ok(Self { buckets })
    }

    /// Build from `(label, years)` pairs.
    pub fn from_pairs(pairs: &[(&str, f64)]) -> Result<Self, AppError> {
        Self::new(
            pairs
                .iter()
                .map(|&(label, years)| TenorBucket {
                    label: label.to_string(),
                    years,
                })
                .collect(),
        )
    }

    pub fn buckets(&self) -> &[TenorBucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn tenors(&self) -> Vec<f64> {
        self.buckets.iter().map(|b| b.years).collect()
    }

    pub fn label(&self, idx: usize) -> &str {
        &self.buckets[idx].label
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.buckets.iter().position(|b| b.label == label)
    }

    /// Index of the bucket nearest to `tenor`.
    ///
    /// Exact ties resolve to the shorter tenor: buckets are scanned in
    /// ascending order and only a strictly smaller distance replaces the
    /// current best.
    pub fn nearest(&self, tenor: f64) -> usize {
        let mut best = 0;
        let mut best_dist = (tenor - self.buckets[0].years).abs();
        for (i, b) in self.buckets.iter().enumerate().skip(1) {
            let dist = (tenor - b.years).abs();
            if dist < best_dist {
                best = i;
                best_dist = dist;
            }
        }
        best
    }
}

/// Interpolated benchmark yields: one row per date, one value per grid bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedCurveTable {
    grid: TargetTenorGrid,
    rows: BTreeMap<NaiveDate, Vec<Option<f64>>>,
}

impl InterpolatedCurveTable {
    pub fn new(grid: TargetTenorGrid) -> Self {
        Self {
            grid,
            rows: BTreeMap::new(),
        }
    }

    /// Insert a row. `values` must have one entry per grid bucket.
    pub fn insert(&mut self, date: NaiveDate, values: Vec<Option<f64>>) -> Result<(), AppError> {
        if values.len() != self.grid.len() {
            return Err(AppError::data(format!(
                "Curve row for {date} has {} values, grid has {} buckets.",
                values.len(),
                self.grid.len()
            )));
        }
        self.rows.insert(date, values);
        Ok(())
    }

    pub fn grid(&self) -> &TargetTenorGrid {
        &self.grid
    }

    pub fn row(&self, date: NaiveDate) -> Option<&[Option<f64>]> {
        self.rows.get(&date).map(Vec::as_slice)
    }

    pub fn value(&self, date: NaiveDate, bucket: usize) -> Option<f64> {
        self.rows.get(&date).and_then(|r| r.get(bucket).copied().flatten())
    }

    /// True when at least one bucket is defined on `date`.
    pub fn has_coverage(&self, date: NaiveDate) -> bool {
        self.rows
            .get(&date)
            .is_some_and(|r| r.iter().any(Option::is_some))
    }

    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, &[Option<f64>])> + '_ {
        self.rows.iter().map(|(d, r)| (*d, r.as_slice()))
    }

    pub fn n_dates(&self) -> usize {
        self.rows.len()
    }

    pub fn n_defined(&self) -> usize {
        self.rows.values().flatten().filter(|v| v.is_some()).count()
    }
}

/// Static bond master attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bond {
    pub id: String,
    pub maturity: NaiveDate,
    pub coupon_type: Option<String>,
    pub currency: Option<String>,
    pub classification: Option<String>,
    pub industry_sector: Option<String>,
    pub industry_group: Option<String>,
    pub inflation_linked: Option<String>,
    pub debt_to_ebitda: Option<f64>,
    pub issuer: Option<String>,
    pub exchange_ticker: Option<String>,
    pub description: Option<String>,
    /// First date with a usable quote; earlier observations are ignored.
    pub first_quote_date: Option<NaiveDate>,
}

/// Wide yield table: observation dates × bond ids.
///
/// Only quoted cells are stored. A stored value may still be unusable
/// (zero or NaN); the spread calculator decides.
#[derive(Debug, Clone, Default)]
pub struct YieldTimeSeries {
    dates: Vec<NaiveDate>,
    columns: HashMap<String, BTreeMap<NaiveDate, f64>>,
    order: Vec<String>,
}

impl YieldTimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bond column (keeps first-seen column order).
    pub fn add_bond(&mut self, id: &str) {
        if !self.columns.contains_key(id) {
            self.columns.insert(id.to_string(), BTreeMap::new());
            self.order.push(id.to_string());
        }
    }

    pub fn insert(&mut self, id: &str, date: NaiveDate, value: f64) {
        self.add_bond(id);
        if let Some(col) = self.columns.get_mut(id) {
            col.insert(date, value);
        }
        if let Err(pos) = self.dates.binary_search(&date) {
            self.dates.insert(pos, date);
        }
    }

    /// Record an observation date even if no bond is quoted on it.
    pub fn add_date(&mut self, date: NaiveDate) {
        if let Err(pos) = self.dates.binary_search(&date) {
            self.dates.insert(pos, date);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.columns.contains_key(id)
    }

    pub fn yield_on(&self, id: &str, date: NaiveDate) -> Option<f64> {
        self.columns.get(id).and_then(|c| c.get(&date).copied())
    }

    /// Dates with a quoted value for `id`, ascending.
    pub fn quoted_dates<'a>(&'a self, id: &str) -> impl Iterator<Item = NaiveDate> + 'a {
        self.columns.get(id).into_iter().flat_map(|c| c.keys().copied())
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn bond_ids(&self) -> &[String] {
        &self.order
    }
}

/// How many historical dates each bond is evaluated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowSpec {
    /// The N most recent eligible dates.
    LastN(usize),
    /// Eligible dates within N calendar days of the latest yield date.
    CalendarDays(u32),
}

impl Default for WindowSpec {
    fn default() -> Self {
        WindowSpec::LastN(60)
    }
}

/// Observation dates to evaluate for one bond (ascending).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationWindow {
    pub bond_id: String,
    pub dates: Vec<NaiveDate>,
}

/// A computed corporate spread.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadRecord {
    pub bond_id: String,
    pub obs_date: NaiveDate,
    /// Bond yield, percent.
    pub bond_yield: f64,
    /// Remaining tenor in years at `obs_date`.
    pub tenor_years: f64,
    /// Grid label the remaining tenor was bucketed to.
    pub tenor_bucket: String,
    /// Interpolated benchmark yield at `tenor_bucket`, percent.
    pub benchmark_yield: f64,
    /// `(bond_yield - benchmark_yield) * 100`.
    pub spread_bp: f64,
}

/// Why a (bond, date) pair produced no spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    InvalidBondYield,
    BenchmarkUnavailable,
    Matured,
    NoOverlappingDates,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::InvalidBondYield => "invalid bond yield",
            SkipReason::BenchmarkUnavailable => "benchmark yield unavailable",
            SkipReason::Matured => "bond matured before observation date",
            SkipReason::NoOverlappingDates => "no overlapping observation dates",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRecord {
    pub bond_id: String,
    /// `None` only for `NoOverlappingDates`.
    pub obs_date: Option<NaiveDate>,
    pub reason: SkipReason,
}

/// Spread calculator output. Together the two vectors cover every attempted pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpreadOutput {
    pub spreads: Vec<SpreadRecord>,
    pub skipped: Vec<SkipRecord>,
}
