//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements, per entity (cycling through the glyph tables):
//! - observed points: `o`, `x`, `+`, `*`, ...
//! - projected curve: `-`, `.`, `~`, `:`, ...

use crate::app::pipeline::ProjectionRun;
use crate::data::EmissionSource;
use crate::domain::ProjectionFile;
use crate::report::{UNIT, fmt_compact};

const POINT_GLYPHS: [char; 7] = ['o', 'x', '+', '*', '#', '@', '%'];
const LINE_GLYPHS: [char; 7] = ['-', '.', '~', ':', '=', '^', '"'];

/// One entity's data in plot coordinates (`year`, `value`).
#[derive(Debug, Clone, Default)]
pub struct PlotSeries {
    pub entity: String,
    pub observed: Vec<(f64, f64)>,
    pub projected: Vec<(f64, f64)>,
}

/// Collect observed + projected series for every successful projection of a run.
pub fn series_for_run(run: &ProjectionRun, source: &dyn EmissionSource) -> Vec<PlotSeries> {
    run.projections
        .iter()
        .map(|p| PlotSeries {
            entity: p.entity.clone(),
            observed: source
                .series(&p.entity)
                .map(|s| s.points.iter().map(|o| (o.year as f64, o.value)).collect())
                .unwrap_or_default(),
            projected: p.points.iter().map(|pt| (pt.year as f64, pt.value)).collect(),
        })
        .collect()
}

/// Projected curves from a saved projection file (no observations).
pub fn series_from_file(file: &ProjectionFile) -> Vec<PlotSeries> {
    file.projections
        .iter()
        .map(|p| PlotSeries {
            entity: p.entity.clone(),
            observed: Vec::new(),
            projected: p.points.iter().map(|pt| (pt.year as f64, pt.value)).collect(),
        })
        .collect()
}

/// Render all series into one fixed-size plot, followed by a legend.
pub fn render_ascii_plot(series: &[PlotSeries], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = axis_range(series, |&(x, _)| x).unwrap_or((1750.0, 2100.0));
    let (y_min, y_max) = axis_range(series, |&(_, y)| y).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curves first (so points can overlay).
    for (i, s) in series.iter().enumerate() {
        let glyph = LINE_GLYPHS[i % LINE_GLYPHS.len()];
        draw_curve(&mut grid, &s.projected, (x_min, x_max), (y_min, y_max), glyph);
    }
    for (i, s) in series.iter().enumerate() {
        let glyph = POINT_GLYPHS[i % POINT_GLYPHS.len()];
        for &(x, y) in &s.observed {
            if !(x.is_finite() && y.is_finite()) {
                continue;
            }
            let col = map_x(x, x_min, x_max, width);
            let row = map_y(y, y_min, y_max, height);
            grid[row][col] = glyph;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: year=[{x_min:.0}, {x_max:.0}] | value=[{}, {}] {UNIT}\n",
        fmt_compact(y_min),
        fmt_compact(y_max)
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    for (i, s) in series.iter().enumerate() {
        out.push_str(&format!(
            "{} {} {}\n",
            POINT_GLYPHS[i % POINT_GLYPHS.len()],
            LINE_GLYPHS[i % LINE_GLYPHS.len()],
            s.entity
        ));
    }

    out
}

fn axis_range(series: &[PlotSeries], coord: impl Fn(&(f64, f64)) -> f64) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for s in series {
        for v in s.observed.iter().chain(&s.projected).map(&coord) {
            if v.is_finite() {
                min = min.min(v);
                max = max.max(v);
            }
        }
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_range: (f64, f64), y_range: (f64, f64), ch: char) {
    let height = grid.len();
    let width = grid.first().map_or(0, Vec::len);
    if width == 0 {
        return;
    }

    let mut prev = None;
    for &(x, y) in curve {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        let col = map_x(x, x_range.0, x_range.1, width);
        let row = map_y(y, y_range.0, y_range.1, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, ch),
            None if grid[row][col] == ' ' => grid[row][col] = ch,
            None => {}
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EmissionTable;
    use crate::domain::{EmissionRecord, FitQuality, LogisticParams, Projection, ProjectionPoint};

    #[test]
    fn plot_golden_snapshot_small() {
        let series = vec![PlotSeries {
            entity: "World".to_string(),
            observed: vec![(2000.0, 100.0), (2010.0, 110.0)],
            projected: vec![(2000.0, 100.0), (2010.0, 100.0)],
        }];

        let txt = render_ascii_plot(&series, 10, 5);
        let expected = concat!(
            "Plot: year=[2000, 2010] | value=[99.5, 110.5] Tonnes\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
            "o - World\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn entities_get_distinct_glyphs() {
        let series = vec![
            PlotSeries {
                entity: "A".to_string(),
                observed: vec![(2000.0, 0.0)],
                projected: vec![],
            },
            PlotSeries {
                entity: "B".to_string(),
                observed: vec![(2010.0, 10.0)],
                projected: vec![(2000.0, 5.0), (2010.0, 5.0)],
            },
        ];
        let txt = render_ascii_plot(&series, 20, 8);
        assert!(txt.contains('o'));
        assert!(txt.contains('x'));
        assert!(txt.contains(".........."));
        assert!(txt.ends_with("o - A\nx . B\n"));
    }

    #[test]
    fn run_series_pull_observations_from_source() {
        let table = EmissionTable::new(
            "v",
            vec![EmissionRecord {
                entity: "World".to_string(),
                year: 2000,
                value: 1.0,
            }],
        );
        let run = ProjectionRun {
            projections: vec![Projection {
                entity: "World".to_string(),
                params: LogisticParams::new(1.0, 2000.0, 0.1, 0.0),
                quality: FitQuality {
                    sse: 0.0,
                    rmse: 0.0,
                    n: 1,
                    evaluations: 1,
                },
                points: vec![ProjectionPoint { year: 2000, value: 0.5 }],
            }],
            ..ProjectionRun::default()
        };
        let series = series_for_run(&run, &table);
        assert_eq!(series[0].observed, vec![(2000.0, 1.0)]);
        assert_eq!(series[0].projected, vec![(2000.0, 0.5)]);
    }

    #[test]
    fn empty_input_still_renders_frame() {
        let txt = render_ascii_plot(&[], 10, 5);
        assert_eq!(txt.lines().count(), 6);
    }
}
