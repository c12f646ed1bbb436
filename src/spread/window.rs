//! Observation windows: which dates each bond is evaluated on.
//!
//! A date is eligible for a bond when all of the following hold:
//! - the bond has a quoted yield on that date
//! - the benchmark table has at least one defined value on that date
//! - the date is not before the bond's first-quote date (when known)
//!
//! The window then keeps the most recent part of the eligible dates, either
//! the last N of them or those within N calendar days of the latest yield
//! date in the time series.

use chrono::Duration;

use crate::domain::{Bond, InterpolatedCurveTable, ObservationWindow, WindowSpec, YieldTimeSeries};
use crate::log::ProgressLog;

/// Build one window per bond, in `bonds` order.
pub fn build_observation_windows(
    bonds: &[Bond],
    yields: &YieldTimeSeries,
    curve: &InterpolatedCurveTable,
    spec: WindowSpec,
    log: &mut dyn ProgressLog,
) -> Vec<ObservationWindow> {
    let calendar_start = match spec {
        WindowSpec::CalendarDays(days) => yields
            .latest_date()
            .map(|latest| latest - Duration::days(i64::from(days))),
        WindowSpec::LastN(_) => None,
    };

    let windows: Vec<ObservationWindow> = bonds
        .iter()
        .map(|bond| {
            let eligible = yields.quoted_dates(&bond.id).filter(|&date| {
                curve.has_coverage(date) && bond.first_quote_date.is_none_or(|first| date >= first)
            });

            let dates = match spec {
                WindowSpec::LastN(n) => {
                    let all: Vec<_> = eligible.collect();
                    let skip = all.len().saturating_sub(n);
                    all[skip..].to_vec()
                }
                WindowSpec::CalendarDays(_) => match calendar_start {
                    Some(start) => eligible.filter(|&date| date >= start).collect(),
                    None => Vec::new(),
                },
            };

            ObservationWindow {
                bond_id: bond.id.clone(),
                dates,
            }
        })
        .collect();

    let empty = windows.iter().filter(|w| w.dates.is_empty()).count();
    let pairs: usize = windows.iter().map(|w| w.dates.len()).sum();
    log.line(&format!(
        "Observation windows ({}): {} bonds, {} (bond, date) pairs, {} bonds without overlap",
        describe(spec),
        windows.len(),
        pairs,
        empty
    ));

    windows
}

fn describe(spec: WindowSpec) -> String {
    match spec {
        WindowSpec::LastN(n) => format!("last {n} dates"),
        WindowSpec::CalendarDays(d) => format!("last {d} calendar days"),
    }
}
