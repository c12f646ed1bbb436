//! `bond-spreads` library crate.
//!
//! Interpolates DI and IPCA benchmark yield surfaces onto a fixed tenor grid
//! and measures corporate bond spreads against them. The binary (`spreads`)
//! is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - every stage can be driven in memory (see `app::pipeline::run_universe`)

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod log;
pub mod math;
pub mod plot;
pub mod report;
pub mod spread;
pub mod surface;
pub mod universe;
