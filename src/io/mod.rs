//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - artifact writers, CSV and HTML (`export`)

pub mod export;
pub mod ingest;
