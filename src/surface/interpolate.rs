//! Benchmark surface interpolation.
//!
//! For each observation date the discrete benchmark quotes are turned into a
//! continuous curve and evaluated on the target tenor grid. Targets outside
//! the quoted tenor range stay undefined (`None`); nothing is extrapolated or
//! clamped.
//!
//! The curve construction differs per benchmark, so the method is a strategy
//! (`CurveInterpolator`) picked once from the `Benchmark` tag:
//!
//! - DI: monotone cubic Hermite, no spurious wiggles between futures tenors
//! - IPCA: piecewise linear between the sparse real-yield vertices

use crate::domain::{Benchmark, InterpolatedCurveTable, TargetTenorGrid, YieldSurface};
use crate::error::AppError;
use crate::log::ProgressLog;
use crate::math::interp::{MonotoneCubic, linear};

/// Curve construction method for one observation date.
pub trait CurveInterpolator {
    fn name(&self) -> &'static str;

    /// Evaluate the curve through `points` at every tenor in `targets`.
    ///
    /// `points` are `(tenor_years, yield_pct)` sorted by strictly increasing
    /// tenor. Returns one entry per target; `None` when the target lies outside
    /// the quoted range or fewer than two points exist.
    fn interpolate(&self, points: &[(f64, f64)], targets: &[f64]) -> Result<Vec<Option<f64>>, AppError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolator;

#[derive(Debug, Clone, Copy, Default)]
pub struct MonotoneCubicInterpolator;

impl CurveInterpolator for LinearInterpolator {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn interpolate(&self, points: &[(f64, f64)], targets: &[f64]) -> Result<Vec<Option<f64>>, AppError> {
        validate_nodes(points)?;
        if points.len() < 2 {
            return Ok(vec![None; targets.len()]);
        }
        let (xs, ys) = split(points);
        Ok(targets.iter().map(|&t| linear(&xs, &ys, t)).collect())
    }
}

impl CurveInterpolator for MonotoneCubicInterpolator {
    fn name(&self) -> &'static str {
        "monotone-cubic"
    }

    fn interpolate(&self, points: &[(f64, f64)], targets: &[f64]) -> Result<Vec<Option<f64>>, AppError> {
        validate_nodes(points)?;
        let (xs, ys) = split(points);
        let Some(spline) = MonotoneCubic::new(&xs, &ys) else {
            return Ok(vec![None; targets.len()]);
        };
        Ok(targets.iter().map(|&t| spline.eval(t)).collect())
    }
}

impl Benchmark {
    /// Interpolation method used for this benchmark's curve.
    pub fn interpolator(self) -> &'static dyn CurveInterpolator {
        match self {
            Benchmark::Di => &MonotoneCubicInterpolator,
            Benchmark::Ipca => &LinearInterpolator,
        }
    }
}

/// Interpolate every date of `surface` onto `grid`.
///
/// Fails with a data error if any date carries an invalid tenor.
pub fn interpolate_surface(
    surface: &YieldSurface,
    grid: &TargetTenorGrid,
    benchmark: Benchmark,
    log: &mut dyn ProgressLog,
) -> Result<InterpolatedCurveTable, AppError> {
    let method = benchmark.interpolator();
    let targets = grid.tenors();
    let mut table = InterpolatedCurveTable::new(grid.clone());
    let mut sparse_dates = 0usize;

    for (date, day) in surface.iter() {
        let points: Vec<(f64, f64)> = day.iter().map(|p| (p.tenor_years, p.yield_pct)).collect();
        if points.len() < 2 {
            sparse_dates += 1;
        }
        let values = method
            .interpolate(&points, &targets)
            .map_err(|e| AppError::data(format!("{} curve on {date}: {e}", benchmark.display_name())))?;
        table.insert(date, values)?;
    }

    let cells = table.n_dates() * grid.len();
    log.line(&format!(
        "{} curve interpolated ({}): {} dates, {} with fewer than 2 quotes, {}/{} grid values defined",
        benchmark.display_name(),
        method.name(),
        table.n_dates(),
        sparse_dates,
        table.n_defined(),
        cells
    ));

    Ok(table)
}

fn validate_nodes(points: &[(f64, f64)]) -> Result<(), AppError> {
    for &(tenor, y) in points {
        if !(tenor.is_finite() && tenor > 0.0) {
            return Err(AppError::data(format!(
                "invalid tenor {tenor} (must be finite and > 0)"
            )));
        }
        if !y.is_finite() {
            return Err(AppError::data(format!("non-finite yield at tenor {tenor}")));
        }
    }
    for pair in points.windows(2) {
        if pair[1].0 <= pair[0].0 {
            return Err(AppError::data(format!(
                "tenors must be strictly increasing ({} then {})",
                pair[0].0, pair[1].0
            )));
        }
    }
    Ok(())
}

fn split(points: &[(f64, f64)]) -> (Vec<f64>, Vec<f64>) {
    points.iter().copied().unzip()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::CurvePoint;
    use crate::log::MemoryLog;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn quotes(date: NaiveDate, pts: &[(f64, f64)]) -> Vec<CurvePoint> {
        pts.iter()
            .enumerate()
            .map(|(i, &(t, y))| CurvePoint {
                obs_date: date,
                tenor_years: t,
                yield_pct: y,
                instrument_id: format!("Q{i}"),
            })
            .collect()
    }

    #[test]
    fn midpoint_defined_and_outside_undefined_for_both_methods() {
        let points = [(1.0, 10.5), (3.0, 11.2)];
        for b in Benchmark::ALL {
            let out = b.interpolator().interpolate(&points, &[2.0, 5.0]).unwrap();
            assert!((out[0].unwrap() - 10.85).abs() < 1e-12, "{b}: {:?}", out[0]);
            assert_eq!(out[1], None, "{b} must not extrapolate");
        }
    }

    #[test]
    fn exact_at_observed_tenors() {
        let points = [(0.5, 10.1), (1.0, 10.4), (2.0, 10.9), (5.0, 11.5), (10.0, 11.8)];
        let targets: Vec<f64> = points.iter().map(|p| p.0).collect();
        for b in Benchmark::ALL {
            let out = b.interpolator().interpolate(&points, &targets).unwrap();
            for (v, p) in out.iter().zip(points.iter()) {
                assert_eq!(*v, Some(p.1), "{b} at tenor {}", p.0);
            }
        }
    }

    #[test]
    fn defined_inside_range_only() {
        let points = [(1.0, 5.0), (2.0, 5.5), (7.0, 6.0)];
        let targets = [0.25, 0.999, 1.0, 1.5, 4.0, 7.0, 7.001, 30.0];
        for b in Benchmark::ALL {
            let out = b.interpolator().interpolate(&points, &targets).unwrap();
            for (&t, v) in targets.iter().zip(out.iter()) {
                assert_eq!(v.is_some(), (1.0..=7.0).contains(&t), "{b} at {t}");
            }
        }
    }

    #[test]
    fn fewer_than_two_points_is_all_undefined() {
        for b in Benchmark::ALL {
            let out = b.interpolator().interpolate(&[(2.0, 10.0)], &[1.0, 2.0, 3.0]).unwrap();
            assert_eq!(out, vec![None, None, None]);
            let out = b.interpolator().interpolate(&[], &[1.0]).unwrap();
            assert_eq!(out, vec![None]);
        }
    }

    #[test]
    fn invalid_tenors_are_rejected() {
        for b in Benchmark::ALL {
            let m = b.interpolator();
            assert!(matches!(m.interpolate(&[(-1.0, 10.0), (2.0, 11.0)], &[1.0]), Err(AppError::Data(_))));
            assert!(matches!(m.interpolate(&[(0.0, 10.0), (2.0, 11.0)], &[1.0]), Err(AppError::Data(_))));
            assert!(matches!(m.interpolate(&[(f64::NAN, 10.0), (2.0, 11.0)], &[1.0]), Err(AppError::Data(_))));
            assert!(matches!(m.interpolate(&[(3.0, 10.0), (2.0, 11.0)], &[1.0]), Err(AppError::Data(_))));
            // A single bad point is still rejected, not dropped.
            assert!(m.interpolate(&[(f64::INFINITY, 10.0)], &[1.0]).is_err());
        }
    }

    #[test]
    fn surface_table_has_one_row_per_date() {
        let d1 = d(2024, 5, 2);
        let d2 = d(2024, 5, 3);
        let mut pts = quotes(d1, &[(1.0, 10.5), (3.0, 11.2)]);
        pts.extend(quotes(d2, &[(1.0, 10.6)]));
        let surface = YieldSurface::from_points(pts);
        let grid = TargetTenorGrid::from_pairs(&[("1Y", 1.0), ("2Y", 2.0), ("5Y", 5.0)]).unwrap();

        let mut log = MemoryLog::new();
        let table = interpolate_surface(&surface, &grid, Benchmark::Ipca, &mut log).unwrap();

        assert_eq!(table.n_dates(), 2);
        assert!((table.value(d1, 1).unwrap() - 10.85).abs() < 1e-12);
        assert_eq!(table.value(d1, 2), None);
        assert_eq!(table.row(d2).unwrap(), &[None, None, None]);
        assert!(table.has_coverage(d1));
        assert!(!table.has_coverage(d2));
        assert!(log.contains("1 with fewer than 2 quotes"));
    }

    #[test]
    fn interpolation_is_repeatable() {
        let day = d(2024, 1, 2);
        let surface = YieldSurface::from_points(quotes(day, &[(0.25, 10.0), (1.0, 10.3), (4.0, 11.0), (9.0, 11.3)]));
        let grid = TargetTenorGrid::from_pairs(&[("6M", 0.5), ("2Y", 2.0), ("7Y", 7.0)]).unwrap();
        let a = interpolate_surface(&surface, &grid, Benchmark::Di, &mut MemoryLog::new()).unwrap();
        let b = interpolate_surface(&surface, &grid, Benchmark::Di, &mut MemoryLog::new()).unwrap();
        assert_eq!(a, b);
    }
}
