//! Corporate spread computation against an interpolated benchmark surface.
//!
//! - observation windows per bond (`window`)
//! - per-pair spread/skip records (`calculator`)
//! - plausibility filter on the result (`anomaly`)

pub mod anomaly;
pub mod calculator;
pub mod window;

pub use anomaly::{AnomalyRange, FilterOutcome, filter_anomalies};
pub use calculator::{compute_spreads, spread_for};
pub use window::build_observation_windows;
