//! Formatted terminal output.
//!
//! Formatting lives here so the pipeline stages stay free of layout code and
//! output changes are localized.

use crate::domain::{Benchmark, Bond};
use crate::report::summary::{BondSpreadSummary, LabelSummary};

/// Counts reported at the end of a universe run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub bonds_screened: usize,
    pub curve_dates: usize,
    pub spreads_computed: usize,
    pub skipped: usize,
    pub spreads_kept: usize,
}

pub fn format_run_summary(benchmark: Benchmark, counts: &RunCounts, bonds: &[BondSpreadSummary]) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} corporate spreads ===\n", benchmark.display_name()));
    out.push_str(&format!(
        "Bonds: {} | curve dates: {} | spreads: {} computed, {} skipped, {} kept\n",
        counts.bonds_screened, counts.curve_dates, counts.spreads_computed, counts.skipped, counts.spreads_kept
    ));

    if bonds.is_empty() {
        out.push_str("(no spreads survived the filters)\n");
        return out;
    }

    out.push('\n');
    out.push_str(&format_bond_table(bonds));
    out
}

pub fn format_curve_summary(benchmark: Benchmark, rows: &[LabelSummary]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} interpolated curve\n", benchmark.display_name()));
    push_line(
        &mut out,
        format!("{:<6} {:>5} {:>12} {:>9} {:>9} {:>9} {:>9}", "tenor", "n", "latest_date", "latest", "mean", "min", "max"),
    );
    push_line(
        &mut out,
        format!("{:-<6} {:-<5} {:-<12} {:-<9} {:-<9} {:-<9} {:-<9}", "", "", "", "", "", "", ""),
    );
    for r in rows {
        let (date, latest) = match r.latest {
            Some((d, v)) => (d.to_string(), fmt_opt(Some(v))),
            None => ("-".to_string(), fmt_opt(None)),
        };
        push_line(
            &mut out,
            format!(
                "{:<6} {:>5} {:>12} {:>9} {:>9} {:>9} {:>9}",
                r.label,
                r.n,
                date,
                latest,
                fmt_opt(r.mean),
                fmt_opt(r.min),
                fmt_opt(r.max)
            ),
        );
    }
    out
}

fn format_bond_table(rows: &[BondSpreadSummary]) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!("{:<24} {:>5} {:>12} {:>10} {:>10} {:<6}", "bond", "n", "last_date", "last_bp", "mean_bp", "bucket"),
    );
    push_line(
        &mut out,
        format!("{:-<24} {:-<5} {:-<12} {:-<10} {:-<10} {:-<6}", "", "", "", "", "", ""),
    );
    for r in rows {
        push_line(
            &mut out,
            format!(
                "{:<24} {:>5} {:>12} {:>10.2} {:>10.2} {:<6}",
                truncate(&r.bond_id, 24),
                r.n_obs,
                r.last_date,
                r.last_spread_bp,
                r.mean_spread_bp,
                r.last_bucket
            ),
        );
    }
    out
}

/// Bonds selected by a custom screen.
pub fn format_screen(bonds: &[Bond]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} bonds selected\n", bonds.len()));
    push_line(
        &mut out,
        format!("{:<24} {:<10} {:<8} {:>8} {:<30}", "bond", "maturity", "coupon", "debt/eb", "issuer"),
    );
    push_line(&mut out, format!("{:-<24} {:-<10} {:-<8} {:-<8} {:-<30}", "", "", "", "", ""));
    for b in bonds {
        push_line(
            &mut out,
            format!(
                "{:<24} {:<10} {:<8} {:>8} {:<30}",
                truncate(&b.id, 24),
                b.maturity,
                truncate(b.coupon_type.as_deref().unwrap_or(""), 8),
                b.debt_to_ebitda.map(|v| format!("{v:.2}")).unwrap_or_default(),
                truncate(b.issuer.as_deref().unwrap_or(""), 30)
            ),
        );
    }
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
