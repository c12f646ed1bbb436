//! Chart rendering for the HTML artifacts.

pub mod svg;

pub use svg::{HeatScale, curve_surface_svg, spread_heatmap_svg};
