//! SVG charts rendered with Plotters.
//!
//! Charts are drawn into an in-memory string and embedded in the HTML
//! artifacts. Plotters' own errors are mapped to `AppError::Io`.

use std::error::Error;

use chrono::{Duration, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::InterpolatedCurveTable;
use crate::error::AppError;
use crate::report::SpreadSurface;

const WIDTH: u32 = 1100;
const HEIGHT: u32 = 600;

/// Colour scale bounds for the spread heatmap, in bp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatScale {
    pub min_bp: f64,
    pub max_bp: f64,
}

impl Default for HeatScale {
    fn default() -> Self {
        Self {
            min_bp: -200.0,
            max_bp: 2000.0,
        }
    }
}

/// One line per grid label: interpolated yield over observation dates.
pub fn curve_surface_svg(table: &InterpolatedCurveTable, title: &str) -> Result<String, AppError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        draw_curve_surface(&root, table, title)
            .and_then(|_| root.present().map_err(Into::into))
            .map_err(|e| AppError::io(format!("Failed to render curve chart: {e}")))?;
    }
    Ok(svg)
}

/// Heatmap of mean spread per (date, bucket).
pub fn spread_heatmap_svg(surface: &SpreadSurface, title: &str, scale: HeatScale) -> Result<String, AppError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        draw_heatmap(&root, surface, title, scale)
            .and_then(|_| root.present().map_err(Into::into))
            .map_err(|e| AppError::io(format!("Failed to render spread heatmap: {e}")))?;
    }
    Ok(svg)
}

fn draw_curve_surface(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    table: &InterpolatedCurveTable,
    title: &str,
) -> Result<(), Box<dyn Error>> {
    root.fill(&WHITE)?;

    let rows: Vec<(NaiveDate, &[Option<f64>])> = table.rows().collect();
    let Some(&(base, _)) = rows.first() else {
        return draw_empty(root, title);
    };

    let values = rows.iter().flat_map(|(_, row)| row.iter().flatten().copied());
    let Some((y_lo, y_hi)) = bounds(values) else {
        return draw_empty(root, title);
    };
    let x_hi = rows.last().map_or(1.0, |(d, _)| day_offset(base, *d)).max(1.0);
    let pad = ((y_hi - y_lo) * 0.05).max(0.05);

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .caption(title, ("sans-serif", 24))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_hi, (y_lo - pad)..(y_hi + pad))?;

    let fmt_x = |x: &f64| (base + Duration::days(x.round() as i64)).to_string();
    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&fmt_x)
        .y_desc("Yield (%)")
        .draw()?;

    let grid = table.grid();
    for idx in 0..grid.len() {
        let points: Vec<(f64, f64)> = rows
            .iter()
            .filter_map(|(d, row)| row[idx].map(|v| (day_offset(base, *d), v)))
            .collect();
        if points.is_empty() {
            continue;
        }
        let color = Palette99::pick(idx).to_rgba();
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(grid.label(idx))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    Ok(())
}

fn draw_heatmap(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    surface: &SpreadSurface,
    title: &str,
    scale: HeatScale,
) -> Result<(), Box<dyn Error>> {
    root.fill(&WHITE)?;
    if surface.is_empty() {
        return draw_empty(root, title);
    }

    let n_cols = surface.labels.len() as i32;
    let n_rows = surface.dates.len() as i32;

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .caption(
            format!("{title} [{} bp .. {} bp]", scale.min_bp, scale.max_bp),
            ("sans-serif", 24),
        )
        .x_label_area_size(40)
        .y_label_area_size(90)
        .build_cartesian_2d(0i32..n_cols, 0i32..n_rows)?;

    let fmt_x = |x: &i32| surface.labels.get(*x as usize).cloned().unwrap_or_default();
    let fmt_y = |y: &i32| surface.dates.get(*y as usize).map(|d| d.to_string()).unwrap_or_default();
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(surface.labels.len())
        .y_labels(surface.dates.len().min(12))
        .x_label_formatter(&fmt_x)
        .y_label_formatter(&fmt_y)
        .x_desc("Tenor bucket")
        .draw()?;

    let cells = surface.cells.iter().enumerate().flat_map(|(r, row)| {
        row.iter().enumerate().filter_map(move |(c, v)| {
            v.map(|bp| {
                let (c, r) = (c as i32, r as i32);
                Rectangle::new([(c, r), (c + 1, r + 1)], heat_color(bp, scale).filled())
            })
        })
    });
    chart.draw_series(cells)?;

    Ok(())
}

fn draw_empty(root: &DrawingArea<SVGBackend<'_>, Shift>, title: &str) -> Result<(), Box<dyn Error>> {
    root.draw(&Text::new(
        format!("{title}: no data"),
        (40, 40),
        ("sans-serif", 20).into_font(),
    ))?;
    Ok(())
}

/// Blue at the low end, white at zero, red at the high end.
fn heat_color(bp: f64, scale: HeatScale) -> RGBColor {
    let v = bp.clamp(scale.min_bp, scale.max_bp);
    if v >= 0.0 {
        let t = if scale.max_bp > 0.0 { v / scale.max_bp } else { 0.0 };
        lerp(RGBColor(255, 255, 255), RGBColor(178, 24, 43), t)
    } else {
        let t = if scale.min_bp < 0.0 { v / scale.min_bp } else { 0.0 };
        lerp(RGBColor(255, 255, 255), RGBColor(33, 102, 172), t)
    }
}

fn lerp(a: RGBColor, b: RGBColor, t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

fn day_offset(base: NaiveDate, d: NaiveDate) -> f64 {
    (d - base).num_days() as f64
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TargetTenorGrid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn heat_color_endpoints() {
        let s = HeatScale::default();
        assert_eq!(heat_color(0.0, s), RGBColor(255, 255, 255));
        assert_eq!(heat_color(5000.0, s), RGBColor(178, 24, 43));
        assert_eq!(heat_color(-500.0, s), RGBColor(33, 102, 172));
    }

    #[test]
    fn curve_chart_renders_svg() {
        let grid = TargetTenorGrid::from_pairs(&[("1Y", 1.0), ("5Y", 5.0)]).unwrap();
        let mut table = InterpolatedCurveTable::new(grid);
        table.insert(d(2024, 3, 1), vec![Some(10.5), Some(11.2)]).unwrap();
        table.insert(d(2024, 3, 4), vec![Some(10.6), None]).unwrap();

        let svg = curve_surface_svg(&table, "DI surface").unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("DI surface"));
        assert!(svg.contains("5Y"));
    }

    #[test]
    fn empty_inputs_still_render() {
        let grid = TargetTenorGrid::from_pairs(&[("1Y", 1.0)]).unwrap();
        let svg = curve_surface_svg(&InterpolatedCurveTable::new(grid), "empty").unwrap();
        assert!(svg.contains("no data"));

        let svg = spread_heatmap_svg(&SpreadSurface::default(), "spreads", HeatScale::default()).unwrap();
        assert!(svg.contains("no data"));
    }

    #[test]
    fn heatmap_renders_cells() {
        let surface = SpreadSurface {
            labels: vec!["1Y".to_string(), "5Y".to_string()],
            dates: vec![d(2024, 3, 1)],
            cells: vec![vec![Some(4.0), None]],
        };
        let svg = spread_heatmap_svg(&surface, "DI spreads", HeatScale::default()).unwrap();
        assert!(svg.contains("<rect"));
    }
}
