//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - benchmark and day-count enums (`Benchmark`, `DayCount`)
//! - curve inputs and outputs (`CurvePoint`, `YieldSurface`, `InterpolatedCurveTable`)
//! - bond inputs (`Bond`, `YieldTimeSeries`) and spread results (`SpreadRecord`, `SkipRecord`)

pub mod types;

pub use types::*;
