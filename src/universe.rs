//! Bond universe selection.
//!
//! A `Screen` is an ordered list of `BondPredicate`s. Predicates are applied
//! one at a time so the progress log shows how many bonds each step removed.
//! The standard corporate universe and the ad-hoc `screen` subcommand are
//! both expressed this way.

use std::collections::BTreeSet;

use crate::domain::{Benchmark, Bond, YieldTimeSeries};
use crate::log::ProgressLog;

#[derive(Debug, Clone, PartialEq)]
pub enum BondPredicate {
    /// Drop bonds whose classification starts with the prefix.
    ExcludeClassificationPrefix(String),
    /// Drop bonds in any of these industry sectors.
    ExcludeSectors(Vec<String>),
    /// Keep only these coupon types.
    CouponTypes(Vec<String>),
    /// Keep only these currencies.
    Currencies(Vec<String>),
    /// Keep bonds whose normalized inflation-linked flag equals the value.
    InflationLinked(String),
    /// Keep bonds with a finite debt/EBITDA.
    HasDebtToEbitda,
}

impl BondPredicate {
    pub fn matches(&self, bond: &Bond) -> bool {
        match self {
            BondPredicate::ExcludeClassificationPrefix(prefix) => !bond
                .classification
                .as_deref()
                .is_some_and(|c| c.starts_with(prefix.as_str())),
            BondPredicate::ExcludeSectors(sectors) => !bond
                .industry_sector
                .as_deref()
                .is_some_and(|s| sectors.iter().any(|x| x == s)),
            BondPredicate::CouponTypes(types) => bond
                .coupon_type
                .as_deref()
                .is_some_and(|c| types.iter().any(|x| x == c)),
            BondPredicate::Currencies(currencies) => bond
                .currency
                .as_deref()
                .is_some_and(|c| currencies.iter().any(|x| x == c)),
            BondPredicate::InflationLinked(flag) => normalize_flag(bond.inflation_linked.as_deref()) == normalize_flag(Some(flag)),
            BondPredicate::HasDebtToEbitda => bond.debt_to_ebitda.is_some_and(f64::is_finite),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            BondPredicate::ExcludeClassificationPrefix(p) => format!("exclude classification '{p}*'"),
            BondPredicate::ExcludeSectors(s) => format!("exclude sector {}", s.join("|")),
            BondPredicate::CouponTypes(t) => format!("coupon type in {}", t.join("|")),
            BondPredicate::Currencies(c) => format!("currency in {}", c.join("|")),
            BondPredicate::InflationLinked(f) => format!("inflation-linked = {}", normalize_flag(Some(f))),
            BondPredicate::HasDebtToEbitda => "debt/EBITDA present".to_string(),
        }
    }
}

/// Ordered predicate list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Screen {
    predicates: Vec<BondPredicate>,
}

impl Screen {
    pub fn new(predicates: Vec<BondPredicate>) -> Self {
        Self { predicates }
    }

    pub fn predicates(&self) -> &[BondPredicate] {
        &self.predicates
    }

    /// The standard corporate universe for a benchmark.
    pub fn corporate(benchmark: Benchmark) -> Self {
        Self::new(vec![
            BondPredicate::ExcludeClassificationPrefix("Government".to_string()),
            BondPredicate::ExcludeSectors(vec!["Financial".to_string()]),
            BondPredicate::CouponTypes(vec!["FIXED".to_string()]),
            BondPredicate::Currencies(vec!["BRL".to_string()]),
            BondPredicate::InflationLinked(benchmark.inflation_flag().to_string()),
            BondPredicate::HasDebtToEbitda,
        ])
    }

    /// User-chosen filters over the raw bond master.
    pub fn custom(inflation_flag: &str, exclude_government: bool, exclude_financial: bool, coupon_types: &[String]) -> Self {
        let mut predicates = Vec::new();
        if exclude_government {
            predicates.push(BondPredicate::ExcludeClassificationPrefix("Government".to_string()));
        }
        if exclude_financial {
            predicates.push(BondPredicate::ExcludeSectors(vec!["Financial".to_string()]));
        }
        if !coupon_types.is_empty() {
            predicates.push(BondPredicate::CouponTypes(coupon_types.to_vec()));
        }
        predicates.push(BondPredicate::InflationLinked(inflation_flag.to_string()));
        Self::new(predicates)
    }

    /// Apply predicates in order, logging the survivor count after each.
    pub fn apply(&self, bonds: &[Bond], log: &mut dyn ProgressLog) -> Vec<Bond> {
        let mut current: Vec<Bond> = bonds.to_vec();
        log.line(&format!("Universe screen: {} bonds in", current.len()));

        for predicate in &self.predicates {
            if let BondPredicate::InflationLinked(_) = predicate {
                let seen: BTreeSet<String> = current
                    .iter()
                    .map(|b| normalize_flag(b.inflation_linked.as_deref()))
                    .collect();
                log.line(&format!(
                    "  inflation-linked flags present: {}",
                    seen.into_iter().collect::<Vec<_>>().join(", ")
                ));
            }
            current.retain(|b| predicate.matches(b));
            log.line(&format!("  after {}: {}", predicate.describe(), current.len()));
        }

        current
    }
}

/// Keep bonds that have a column in the yield time series.
pub fn with_yield_history(bonds: &[Bond], yields: &YieldTimeSeries, log: &mut dyn ProgressLog) -> Vec<Bond> {
    let kept: Vec<Bond> = bonds.iter().filter(|b| yields.contains(&b.id)).cloned().collect();
    log.line(&format!(
        "Bonds with yield history: {} of {}",
        kept.len(),
        bonds.len()
    ));
    kept
}

fn normalize_flag(flag: Option<&str>) -> String {
    flag.map(|f| f.trim().to_ascii_uppercase()).unwrap_or_default()
}
