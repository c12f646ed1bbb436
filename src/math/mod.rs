//! Numerical helpers.
//!
//! - interval lookup and interpolation kernels (`interp`)

pub mod interp;
