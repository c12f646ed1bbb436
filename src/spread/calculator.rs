//! Per-bond, per-date spread computation.
//!
//! For every (bond, date) pair in a bond's observation window:
//!
//! 1. the bond yield must be quoted, finite and non-zero
//! 2. the remaining tenor (maturity - date) must be positive
//! 3. the tenor is bucketed to the nearest grid label (ties → shorter)
//! 4. the benchmark must be defined at that bucket on that date
//!
//! Passing pairs become `SpreadRecord`s with
//! `spread_bp = (bond_yield - benchmark_yield) * 100` (yields in percent).
//! Failing pairs become `SkipRecord`s. Failures are per pair; the loop never
//! stops early, so the two outputs partition every attempted pair.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::{
    Bond, DayCount, InterpolatedCurveTable, ObservationWindow, SkipReason, SkipRecord, SpreadOutput, SpreadRecord,
    YieldTimeSeries,
};
use crate::log::ProgressLog;

/// Percent → basis points.
pub const BP_PER_PERCENT: f64 = 100.0;

/// Compute spreads for every bond/date pair in `windows`.
///
/// Output order follows `bonds`, then ascending dates. Bonds without a window
/// (or with an empty one) yield a single `NoOverlappingDates` skip.
pub fn compute_spreads(
    bonds: &[Bond],
    yields: &YieldTimeSeries,
    curve: &InterpolatedCurveTable,
    windows: &[ObservationWindow],
    day_count: DayCount,
    log: &mut dyn ProgressLog,
) -> SpreadOutput {
    let by_id: HashMap<&str, &ObservationWindow> = windows.iter().map(|w| (w.bond_id.as_str(), w)).collect();

    let mut out = SpreadOutput::default();
    let mut attempted = 0usize;

    for bond in bonds {
        let dates = by_id.get(bond.id.as_str()).map(|w| w.dates.as_slice()).unwrap_or(&[]);
        if dates.is_empty() {
            out.skipped.push(SkipRecord {
                bond_id: bond.id.clone(),
                obs_date: None,
                reason: SkipReason::NoOverlappingDates,
            });
            continue;
        }

        for &date in dates {
            attempted += 1;
            match spread_for(bond, date, yields.yield_on(&bond.id, date), curve, day_count) {
                Ok(record) => out.spreads.push(record),
                Err(reason) => out.skipped.push(SkipRecord {
                    bond_id: bond.id.clone(),
                    obs_date: Some(date),
                    reason,
                }),
            }
        }
    }

    log.line(&format!(
        "Spreads computed: {} of {} pairs | skipped: {}",
        out.spreads.len(),
        attempted,
        out.skipped.len()
    ));
    for (reason, n) in count_reasons(&out.skipped) {
        log.line(&format!("  skipped ({reason}): {n}"));
    }

    out
}

/// Price a single pair, or say why it cannot be priced.
pub fn spread_for(
    bond: &Bond,
    date: NaiveDate,
    bond_yield: Option<f64>,
    curve: &InterpolatedCurveTable,
    day_count: DayCount,
) -> Result<SpreadRecord, SkipReason> {
    let bond_yield = match bond_yield {
        Some(y) if y.is_finite() && y != 0.0 => y,
        _ => return Err(SkipReason::InvalidBondYield),
    };

    let tenor_years = day_count.year_fraction(date, bond.maturity);
    if tenor_years <= 0.0 {
        return Err(SkipReason::Matured);
    }

    let grid = curve.grid();
    let bucket = grid.nearest(tenor_years);
    let benchmark_yield = curve
        .value(date, bucket)
        .ok_or(SkipReason::BenchmarkUnavailable)?;

    Ok(SpreadRecord {
        bond_id: bond.id.clone(),
        obs_date: date,
        bond_yield,
        tenor_years,
        tenor_bucket: grid.label(bucket).to_string(),
        benchmark_yield,
        spread_bp: (bond_yield - benchmark_yield) * BP_PER_PERCENT,
    })
}

fn count_reasons(skipped: &[SkipRecord]) -> Vec<(SkipReason, usize)> {
    let order = [
        SkipReason::InvalidBondYield,
        SkipReason::Matured,
        SkipReason::BenchmarkUnavailable,
        SkipReason::NoOverlappingDates,
    ];
    order
        .into_iter()
        .map(|reason| (reason, skipped.iter().filter(|s| s.reason == reason).count()))
        .filter(|&(_, n)| n > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Duration;

    use super::*;
    use crate::domain::{TargetTenorGrid, WindowSpec};
    use crate::log::MemoryLog;
    use crate::spread::window::build_observation_windows;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bond(id: &str, maturity: NaiveDate) -> Bond {
        Bond {
            id: id.to_string(),
            maturity,
            ..Bond::default()
        }
    }

    /// Grid 1Y/2Y/3Y/5Y; the curve at `date` is 10.5 @1Y, 10.85 @2Y, 11.2 @3Y, undefined @5Y.
    fn scenario_curve(dates: &[NaiveDate]) -> InterpolatedCurveTable {
        let grid = TargetTenorGrid::from_pairs(&[("1Y", 1.0), ("2Y", 2.0), ("3Y", 3.0), ("5Y", 5.0)]).unwrap();
        let mut table = InterpolatedCurveTable::new(grid);
        for &date in dates {
            table.insert(date, vec![Some(10.5), Some(10.85), Some(11.2), None]).unwrap();
        }
        table
    }

    #[test]
    fn spread_is_bond_minus_benchmark_in_bp() {
        let date = d(2024, 1, 2);
        let curve = scenario_curve(&[date]);
        let b = bond("CORP1", date + Duration::days(730));

        let record = spread_for(&b, date, Some(12.0), &curve, DayCount::Act365F).unwrap();
        assert_eq!(record.tenor_bucket, "2Y");
        assert!((record.tenor_years - 2.0).abs() < 1e-12);
        assert!((record.benchmark_yield - 10.85).abs() < 1e-12);
        assert!((record.spread_bp - 115.0).abs() < 1e-9, "got {}", record.spread_bp);
    }

    #[test]
    fn zero_missing_and_nan_yields_are_invalid() {
        let date = d(2024, 1, 2);
        let curve = scenario_curve(&[date]);
        let b = bond("CORP1", d(2026, 1, 2));
        for y in [Some(0.0), None, Some(f64::NAN), Some(f64::INFINITY)] {
            assert_eq!(
                spread_for(&b, date, y, &curve, DayCount::Act365F),
                Err(SkipReason::InvalidBondYield)
            );
        }
    }

    #[test]
    fn undefined_bucket_is_benchmark_unavailable() {
        let date = d(2024, 1, 2);
        let curve = scenario_curve(&[date]);
        let b = bond("LONG", d(2029, 1, 2));
        assert_eq!(
            spread_for(&b, date, Some(12.0), &curve, DayCount::Act365F),
            Err(SkipReason::BenchmarkUnavailable)
        );
    }

    #[test]
    fn matured_bond_is_skipped() {
        let date = d(2024, 1, 2);
        let curve = scenario_curve(&[date]);
        let b = bond("OLD", date);
        assert_eq!(
            spread_for(&b, date, Some(12.0), &curve, DayCount::Act365F),
            Err(SkipReason::Matured)
        );
    }

    #[test]
    fn halfway_tenor_buckets_to_shorter_label() {
        let date = d(2024, 1, 2);
        let grid = TargetTenorGrid::from_pairs(&[("1Y", 1.0), ("3Y", 3.0)]).unwrap();
        let mut curve = InterpolatedCurveTable::new(grid);
        curve.insert(date, vec![Some(10.5), Some(11.2)]).unwrap();

        // 730 days under act/365f is exactly 2.0y, equidistant from 1Y and 3Y.
        let b = bond("MID", date + Duration::days(730));
        let record = spread_for(&b, date, Some(11.0), &curve, DayCount::Act365F).unwrap();
        assert_eq!(record.tenor_bucket, "1Y");
        assert!((record.spread_bp - 50.0).abs() < 1e-9);
    }

    fn universe() -> (Vec<Bond>, YieldTimeSeries, InterpolatedCurveTable) {
        let dates: Vec<NaiveDate> = (0..6).map(|i| d(2024, 3, 4) + Duration::days(i)).collect();
        let curve = scenario_curve(&dates[..5]);
        let bonds = vec![
            bond("GOOD", d(2026, 3, 4)),
            bond("ZERO", d(2027, 3, 4)),
            bond("LONG", d(2030, 3, 4)),
            bond("NONE", d(2026, 3, 4)),
        ];
        let mut ts = YieldTimeSeries::new();
        for (i, &date) in dates.iter().enumerate() {
            ts.insert("GOOD", date, 12.0 + i as f64 * 0.01);
            ts.insert("ZERO", date, if i % 2 == 0 { 0.0 } else { 11.5 });
            ts.insert("LONG", date, 13.0);
        }
        (bonds, ts, curve)
    }

    #[test]
    fn outputs_partition_every_window_pair() {
        let (bonds, ts, curve) = universe();
        let mut log = MemoryLog::new();
        let windows = build_observation_windows(&bonds, &ts, &curve, WindowSpec::LastN(60), &mut log);
        let out = compute_spreads(&bonds, &ts, &curve, &windows, DayCount::Act365F, &mut log);

        let expected: HashSet<(String, NaiveDate)> = windows
            .iter()
            .flat_map(|w| w.dates.iter().map(move |&dt| (w.bond_id.clone(), dt)))
            .collect();
        let mut seen: Vec<(String, NaiveDate)> = out
            .spreads
            .iter()
            .map(|r| (r.bond_id.clone(), r.obs_date))
            .chain(
                out.skipped
                    .iter()
                    .filter_map(|s| s.obs_date.map(|dt| (s.bond_id.clone(), dt))),
            )
            .collect();
        let n_seen = seen.len();
        seen.sort();
        seen.dedup();
        assert_eq!(n_seen, seen.len(), "a pair appears twice");
        assert_eq!(seen.into_iter().collect::<HashSet<_>>(), expected);

        // GOOD: 5 spreads. ZERO: 3 invalid + 2 spreads. LONG: 5 benchmark gaps. NONE: no overlap.
        assert_eq!(out.spreads.len(), 7);
        let count = |r: SkipReason| out.skipped.iter().filter(|s| s.reason == r).count();
        assert_eq!(count(SkipReason::InvalidBondYield), 3);
        assert_eq!(count(SkipReason::BenchmarkUnavailable), 5);
        assert_eq!(count(SkipReason::NoOverlappingDates), 1);
        assert!(log.contains("skipped (invalid bond yield): 3"));
    }

    #[test]
    fn compute_spreads_is_idempotent() {
        let (bonds, ts, curve) = universe();
        let windows = build_observation_windows(&bonds, &ts, &curve, WindowSpec::LastN(60), &mut MemoryLog::new());
        let a = compute_spreads(&bonds, &ts, &curve, &windows, DayCount::Act365F, &mut MemoryLog::new());
        let b = compute_spreads(&bonds, &ts, &curve, &windows, DayCount::Act365F, &mut MemoryLog::new());
        assert_eq!(a, b);
        assert_eq!(format!("{a:?}"), format!("{b:?}"));
    }

    #[test]
    fn zero_yield_scenario_yields_only_a_skip() {
        let date = d(2024, 1, 2);
        let curve = scenario_curve(&[date]);
        let bonds = vec![bond("Z", date + Duration::days(730))];
        let mut ts = YieldTimeSeries::new();
        ts.insert("Z", date, 0.0);
        let windows = vec![ObservationWindow {
            bond_id: "Z".to_string(),
            dates: vec![date],
        }];
        let out = compute_spreads(&bonds, &ts, &curve, &windows, DayCount::Act365F, &mut MemoryLog::new());
        assert!(out.spreads.is_empty());
        assert_eq!(
            out.skipped,
            vec![SkipRecord {
                bond_id: "Z".to_string(),
                obs_date: Some(date),
                reason: SkipReason::InvalidBondYield,
            }]
        );
        assert_eq!(out.skipped[0].reason.as_str(), "invalid bond yield");
    }
}
