//! Tabular summaries derived from a universe run.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::domain::{Benchmark, Bond, InterpolatedCurveTable, SpreadRecord, TargetTenorGrid};

/// Statistics of one curve-table column.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSummary {
    pub label: String,
    pub n: usize,
    pub latest: Option<(NaiveDate, f64)>,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// One row per grid label, in grid order. Undefined cells are ignored.
pub fn summarize_curve(table: &InterpolatedCurveTable) -> Vec<LabelSummary> {
    let grid = table.grid();
    (0..grid.len())
        .map(|idx| {
            let values: Vec<(NaiveDate, f64)> = table
                .rows()
                .filter_map(|(date, row)| row[idx].map(|v| (date, v)))
                .collect();
            let n = values.len();
            let sum: f64 = values.iter().map(|(_, v)| v).sum();
            LabelSummary {
                label: grid.label(idx).to_string(),
                n,
                latest: values.last().copied(),
                mean: (n > 0).then(|| sum / n as f64),
                min: values.iter().map(|(_, v)| *v).reduce(f64::min),
                max: values.iter().map(|(_, v)| *v).reduce(f64::max),
            }
        })
        .collect()
}

/// Spread history of one bond.
#[derive(Debug, Clone, PartialEq)]
pub struct BondSpreadSummary {
    pub bond_id: String,
    pub n_obs: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub last_spread_bp: f64,
    pub mean_spread_bp: f64,
    pub last_bucket: String,
}

/// Per-bond summary, ordered by bond id.
pub fn summarize_bonds(records: &[SpreadRecord]) -> Vec<BondSpreadSummary> {
    let mut by_bond: BTreeMap<&str, Vec<&SpreadRecord>> = BTreeMap::new();
    for r in records {
        by_bond.entry(r.bond_id.as_str()).or_default().push(r);
    }

    by_bond
        .into_iter()
        .filter_map(|(id, mut rows)| {
            rows.sort_by_key(|r| r.obs_date);
            let first = rows.first()?;
            let last = rows.last()?;
            let mean = rows.iter().map(|r| r.spread_bp).sum::<f64>() / rows.len() as f64;
            Some(BondSpreadSummary {
                bond_id: id.to_string(),
                n_obs: rows.len(),
                first_date: first.obs_date,
                last_date: last.obs_date,
                last_spread_bp: last.spread_bp,
                mean_spread_bp: mean,
                last_bucket: last.tenor_bucket.clone(),
            })
        })
        .collect()
}

/// Mean spread per (date, bucket).
///
/// Columns follow grid order and only buckets that received at least one
/// record are kept. Rows are ascending dates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpreadSurface {
    pub labels: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl SpreadSurface {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.labels.is_empty()
    }

    /// Finite cell range, if any.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut values = self.cells.iter().flatten().flatten().copied();
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

pub fn pivot_spreads(records: &[SpreadRecord], grid: &TargetTenorGrid) -> SpreadSurface {
    let mut sums: BTreeMap<(NaiveDate, usize), (f64, usize)> = BTreeMap::new();
    let mut used = BTreeSet::new();

    for r in records {
        // Records carrying a label from another grid are not pivoted.
        let Some(col) = grid.position(&r.tenor_bucket) else {
            continue;
        };
        used.insert(col);
        let cell = sums.entry((r.obs_date, col)).or_insert((0.0, 0));
        cell.0 += r.spread_bp;
        cell.1 += 1;
    }

    let columns: Vec<usize> = used.into_iter().collect();
    let dates: Vec<NaiveDate> = sums
        .keys()
        .map(|(d, _)| *d)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let cells = dates
        .iter()
        .map(|d| {
            columns
                .iter()
                .map(|c| sums.get(&(*d, *c)).map(|(s, n)| s / *n as f64))
                .collect()
        })
        .collect();

    SpreadSurface {
        labels: columns.iter().map(|c| grid.label(*c).to_string()).collect(),
        dates,
        cells,
    }
}

/// Bond metadata for every (bond, benchmark) pair that survived a run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRow {
    pub bond_id: String,
    pub benchmark: Benchmark,
    pub issuer: String,
    pub exchange_ticker: String,
    pub industry_group: String,
    pub debt_to_ebitda: Option<f64>,
    pub description: String,
}

/// Distinct (bond, benchmark) pairs joined with the bond master.
///
/// Pairs whose bond is missing from `bonds` still appear with blank metadata.
pub fn benchmark_summary(runs: &[(Benchmark, &[SpreadRecord])], bonds: &[Bond]) -> Vec<BenchmarkRow> {
    let pairs: BTreeSet<(&str, Benchmark)> = runs
        .iter()
        .flat_map(|(b, records)| records.iter().map(move |r| (r.bond_id.as_str(), *b)))
        .collect();

    pairs
        .into_iter()
        .map(|(id, benchmark)| {
            let bond = bonds.iter().find(|b| b.id == id);
            let text = |v: Option<&String>| v.cloned().unwrap_or_default();
            BenchmarkRow {
                bond_id: id.to_string(),
                benchmark,
                issuer: text(bond.and_then(|b| b.issuer.as_ref())),
                exchange_ticker: text(bond.and_then(|b| b.exchange_ticker.as_ref())),
                industry_group: text(bond.and_then(|b| b.industry_group.as_ref())),
                debt_to_ebitda: bond.and_then(|b| b.debt_to_ebitda),
                description: text(bond.and_then(|b| b.description.as_ref())),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rec(id: &str, date: NaiveDate, bucket: &str, spread_bp: f64) -> SpreadRecord {
        SpreadRecord {
            bond_id: id.to_string(),
            obs_date: date,
            bond_yield: 12.0,
            tenor_years: 2.0,
            tenor_bucket: bucket.to_string(),
            benchmark_yield: 12.0 - spread_bp / 100.0,
            spread_bp,
        }
    }

    fn grid() -> TargetTenorGrid {
        TargetTenorGrid::from_pairs(&[("1Y", 1.0), ("2Y", 2.0), ("5Y", 5.0)]).unwrap()
    }

    #[test]
    fn curve_summary_ignores_undefined_cells() {
        let mut table = InterpolatedCurveTable::new(grid());
        table.insert(d(2024, 1, 2), vec![Some(10.0), Some(11.0), None]).unwrap();
        table.insert(d(2024, 1, 3), vec![Some(12.0), None, None]).unwrap();

        let s = summarize_curve(&table);
        assert_eq!(s.len(), 3);
        assert_eq!(s[0].n, 2);
        assert_eq!(s[0].latest, Some((d(2024, 1, 3), 12.0)));
        assert!((s[0].mean.unwrap() - 11.0).abs() < 1e-12);
        assert_eq!(s[0].min, Some(10.0));
        assert_eq!(s[1].latest, Some((d(2024, 1, 2), 11.0)));
        assert_eq!(s[2].n, 0);
        assert_eq!(s[2].mean, None);
    }

    #[test]
    fn bond_summary_uses_latest_observation() {
        let records = vec![
            rec("B", d(2024, 1, 3), "2Y", 4.0),
            rec("A", d(2024, 1, 2), "1Y", 2.0),
            rec("B", d(2024, 1, 2), "5Y", -2.0),
        ];
        let s = summarize_bonds(&records);
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].bond_id, "A");
        let b = &s[1];
        assert_eq!(b.n_obs, 2);
        assert_eq!(b.first_date, d(2024, 1, 2));
        assert_eq!(b.last_date, d(2024, 1, 3));
        assert_eq!(b.last_spread_bp, 4.0);
        assert_eq!(b.last_bucket, "2Y");
        assert!((b.mean_spread_bp - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pivot_averages_and_keeps_grid_order() {
        let records = vec![
            rec("A", d(2024, 1, 2), "5Y", 6.0),
            rec("B", d(2024, 1, 2), "5Y", 2.0),
            rec("C", d(2024, 1, 2), "1Y", -1.0),
            rec("A", d(2024, 1, 3), "5Y", 8.0),
        ];
        let surface = pivot_spreads(&records, &grid());
        assert_eq!(surface.labels, vec!["1Y", "5Y"]);
        assert_eq!(surface.dates, vec![d(2024, 1, 2), d(2024, 1, 3)]);
        assert_eq!(surface.cells[0], vec![Some(-1.0), Some(4.0)]);
        assert_eq!(surface.cells[1], vec![None, Some(8.0)]);
        assert_eq!(surface.value_range(), Some((-1.0, 8.0)));
        assert!(pivot_spreads(&[], &grid()).is_empty());
    }

    #[test]
    fn benchmark_summary_is_distinct_and_joined() {
        let bond = Bond {
            id: "A".to_string(),
            issuer: Some("Acme SA".to_string()),
            debt_to_ebitda: Some(2.5),
            ..Bond::default()
        };
        let di = vec![rec("A", d(2024, 1, 2), "1Y", 1.0), rec("A", d(2024, 1, 3), "1Y", 1.0)];
        let ipca = vec![rec("A", d(2024, 1, 2), "5Y", 1.0), rec("Z", d(2024, 1, 2), "5Y", 1.0)];

        let rows = benchmark_summary(&[(Benchmark::Di, di.as_slice()), (Benchmark::Ipca, ipca.as_slice())], &[bond]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].benchmark, Benchmark::Di);
        assert_eq!(rows[0].issuer, "Acme SA");
        assert_eq!(rows[1].benchmark, Benchmark::Ipca);
        assert_eq!(rows[2].bond_id, "Z");
        assert_eq!(rows[2].issuer, "");
        assert_eq!(rows[2].debt_to_ebitda, None);
    }
}
