//! Plotters-powered chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.
//! One widget covers every chart in the dashboard: observed scatter with
//! projection lines, the raw emissions lines, and per-sector history lines.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// High-contrast palette, cycled per series.
pub const PALETTE: [(u8, u8, u8); 9] = [
    (0, 255, 255),
    (255, 165, 0),
    (0, 255, 0),
    (255, 0, 255),
    (255, 255, 0),
    (100, 149, 237),
    (255, 99, 71),
    (200, 200, 200),
    (154, 205, 50),
];

/// Palette entry `i` as a Ratatui color (for legends drawn outside the chart).
pub fn palette_color(i: usize) -> Color {
    let (r, g, b) = PALETTE[i % PALETTE.len()];
    Color::Rgb(r, g, b)
}

/// One entity (or sector) worth of chart data.
#[derive(Debug, Clone, Default)]
pub struct ChartSeries {
    /// Drawn as dots.
    pub points: Vec<(f64, f64)>,
    /// Drawn as a connected line.
    pub line: Vec<(f64, f64)>,
    /// Index into `PALETTE`.
    pub color: usize,
}

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call.
pub struct ProjectionChart<'a> {
    pub series: &'a [ChartSeries],
    /// Year cursor, drawn as a vertical rule.
    pub cursor_x: Option<f64>,
    /// Highlighted point under the cursor.
    pub marker: Option<(f64, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for ProjectionChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            if let Some(x) = self.cursor_x {
                chart.draw_series(LineSeries::new([(x, y0), (x, y1)], &RGBColor(90, 90, 90)))?;
            }

            for s in self.series {
                let (r, g, b) = PALETTE[s.color % PALETTE.len()];
                let color = RGBColor(r, g, b);
                if s.line.len() >= 2 {
                    chart.draw_series(LineSeries::new(s.line.iter().copied(), &color))?;
                }
                // `Circle` radii are mapped incorrectly by the ratatui backend,
                // so observations are single pixels.
                chart.draw_series(s.points.iter().map(|&(x, y)| Pixel::new((x, y), color)))?;
            }

            if let Some(marker) = self.marker {
                chart.draw_series(std::iter::once(Pixel::new(marker, WHITE)))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Padded `[min, max]` bounds over every point and line of `series`.
///
/// Falls back to `fallback` when there is nothing finite to bound.
pub fn bounds(series: &[ChartSeries], coord: fn(&(f64, f64)) -> f64, pad_frac: f64, fallback: [f64; 2]) -> [f64; 2] {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in series.iter().flat_map(|s| s.points.iter().chain(&s.line)).map(coord) {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return fallback;
    }
    let pad = ((hi - lo).abs() * pad_frac).max(1e-12);
    [lo - pad, hi + pad]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_points_and_lines() {
        let series = vec![
            ChartSeries {
                points: vec![(2000.0, 1.0)],
                line: vec![(2000.0, 2.0), (2100.0, 11.0)],
                color: 0,
            },
            ChartSeries::default(),
        ];
        let [x_lo, x_hi] = bounds(&series, |p| p.0, 0.0, [0.0, 1.0]);
        assert!((x_lo - 2000.0).abs() < 1e-9 && (x_hi - 2100.0).abs() < 1e-9);
        let [lo, hi] = bounds(&series, |p| p.1, 0.1, [0.0, 1.0]);
        assert!((lo - 0.0).abs() < 1e-12 && (hi - 12.0).abs() < 1e-12);
    }

    #[test]
    fn empty_bounds_fall_back() {
        assert_eq!(bounds(&[], |p| p.0, 0.05, [1.0, 2.0]), [1.0, 2.0]);
    }

    #[test]
    fn palette_cycles() {
        assert_eq!(palette_color(0), palette_color(PALETTE.len()));
    }
}
