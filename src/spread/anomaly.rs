//! Post-hoc anomaly filter for computed spreads.
//!
//! Drops rows whose bond yield is exactly zero (the vendor's missing-data
//! sentinel) and rows whose spread falls outside a fixed plausibility band.
//! The default band is `[-10, 10]` bp; it is a business threshold and is
//! applied exactly as configured.

use serde::{Deserialize, Serialize};

use crate::domain::SpreadRecord;
use crate::log::ProgressLog;

/// Inclusive plausible spread range, in bp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnomalyRange {
    pub min_bp: f64,
    pub max_bp: f64,
}

impl Default for AnomalyRange {
    fn default() -> Self {
        Self {
            min_bp: -10.0,
            max_bp: 10.0,
        }
    }
}

impl AnomalyRange {
    pub fn contains(&self, spread_bp: f64) -> bool {
        spread_bp >= self.min_bp && spread_bp <= self.max_bp
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterOutcome {
    pub kept: Vec<SpreadRecord>,
    pub removed_zero_yield: usize,
    pub removed_out_of_range: usize,
}

/// Keep only plausible records. Survivors are passed through untouched.
pub fn filter_anomalies(records: Vec<SpreadRecord>, range: AnomalyRange, log: &mut dyn ProgressLog) -> FilterOutcome {
    let before = records.len();
    let mut outcome = FilterOutcome::default();

    for r in records {
        if r.bond_yield == 0.0 {
            outcome.removed_zero_yield += 1;
        } else if !range.contains(r.spread_bp) {
            outcome.removed_out_of_range += 1;
        } else {
            outcome.kept.push(r);
        }
    }

    log.line(&format!(
        "After anomaly filter [{}, {}] bp: {} of {} (zero yield: {}, out of range: {})",
        range.min_bp,
        range.max_bp,
        outcome.kept.len(),
        before,
        outcome.removed_zero_yield,
        outcome.removed_out_of_range
    ));

    outcome
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::log::MemoryLog;

    fn rec(id: &str, bond_yield: f64, spread_bp: f64) -> SpreadRecord {
        SpreadRecord {
            bond_id: id.to_string(),
            obs_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            bond_yield,
            tenor_years: 2.0,
            tenor_bucket: "2Y".to_string(),
            benchmark_yield: bond_yield - spread_bp / 100.0,
            spread_bp,
        }
    }

    #[test]
    fn removes_exactly_zero_yield_and_out_of_range() {
        let input = vec![
            rec("keep-low-edge", 10.0, -10.0),
            rec("keep-high-edge", 10.0, 10.0),
            rec("keep-mid", 10.0, 3.5),
            rec("zero", 0.0, 0.0),
            rec("wide", 12.0, 115.0),
            rec("tight", 9.0, -10.0001),
        ];
        let mut log = MemoryLog::new();
        let out = filter_anomalies(input.clone(), AnomalyRange::default(), &mut log);

        let kept: Vec<&str> = out.kept.iter().map(|r| r.bond_id.as_str()).collect();
        assert_eq!(kept, vec!["keep-low-edge", "keep-high-edge", "keep-mid"]);
        assert_eq!(out.removed_zero_yield, 1);
        assert_eq!(out.removed_out_of_range, 2);
        assert_eq!(out.kept[2], input[2]);
        assert!(log.contains("3 of 6"));
    }

    #[test]
    fn configured_range_is_respected() {
        let range = AnomalyRange {
            min_bp: -200.0,
            max_bp: 2000.0,
        };
        let out = filter_anomalies(vec![rec("wide", 12.0, 115.0)], range, &mut MemoryLog::new());
        assert_eq!(out.kept.len(), 1);
    }
}
