//! Benchmark yield surface construction.

pub mod interpolate;

pub use interpolate::{
    CurveInterpolator, LinearInterpolator, MonotoneCubicInterpolator, interpolate_surface,
};
