//! Ratatui-based terminal dashboard.
//!
//! Left column: entity list (multi-select) and the warnings/notices panel.
//! Right column: the active view, one of
//! - projection: observed points plus fitted logistic curves to the horizon
//! - raw: observed emissions as lines
//! - sectors: breakdown bars and per-sector history for the focused entity
//!
//! A year cursor (←/→) drives the hover label shown under the chart.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::LoadedTable;
use crate::app::pipeline::{ProjectionRun, project_entities};
use crate::cli::TuiArgs;
use crate::data::{EmissionSource, EmissionTable, SectorShare, SectorTable};
use crate::domain::{ProjectionConfig, ProjectionPoint};
use crate::error::AppError;
use crate::report::{fmt_compact, hover_label};

mod plotters_chart;

use plotters_chart::{ChartSeries, ProjectionChart, bounds, palette_color};

/// Year the cursor starts on (clamped into the chart range).
const START_YEAR: i32 = 2050;

/// Horizon step for `+`/`-`.
const HORIZON_STEP: i32 = 10;

/// Width of the widest sector bar, in cells.
const BAR_WIDTH: usize = 24;

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    // Load everything before touching the terminal so errors print normally.
    let loaded = crate::app::load_table(&args.data)?;
    let sectors = crate::app::load_sector_table(args.sectors.as_ref(), args.data.demo, args.data.seed)
        .map_err(|e| e.message().to_string());
    let mut app = App::new(loaded, sectors, args.engine.config());

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Projection,
    Raw,
    Sectors,
}

impl View {
    fn next(self) -> Self {
        match self {
            View::Projection => View::Raw,
            View::Raw => View::Sectors,
            View::Sectors => View::Projection,
        }
    }

    fn title(self) -> &'static str {
        match self {
            View::Projection => "Logistic projection",
            View::Raw => "Observed emissions",
            View::Sectors => "Emissions by sector",
        }
    }
}

struct App {
    table: EmissionTable,
    sectors: Result<SectorTable, String>,
    config: ProjectionConfig,
    entities: Vec<String>,
    selected: Vec<bool>,
    /// Requested entities the table doesn't know; kept so they surface as notices.
    unknown: Vec<String>,
    focus: usize,
    year: i32,
    view: View,
    run: ProjectionRun,
    status: String,
}

impl App {
    fn new(loaded: LoadedTable, sectors: Result<SectorTable, String>, config: ProjectionConfig) -> Self {
        let LoadedTable { table, selection, .. } = loaded;
        let entities = table.entities();
        let selected: Vec<bool> = entities.iter().map(|e| selection.contains(e)).collect();
        let unknown = selection.into_iter().filter(|e| !entities.contains(e)).collect();
        let focus = selected.iter().position(|&s| s).unwrap_or(0);

        let mut app = Self {
            table,
            sectors,
            config,
            entities,
            selected,
            unknown,
            focus,
            year: START_YEAR,
            view: View::Projection,
            run: ProjectionRun::default(),
            status: String::new(),
        };
        app.year = app.clamp_year(START_YEAR);
        app.refit();
        app
    }

    fn selection(&self) -> Vec<String> {
        self.entities
            .iter()
            .zip(&self.selected)
            .filter(|(_, s)| **s)
            .map(|(e, _)| e.clone())
            .chain(self.unknown.iter().cloned())
            .collect()
    }

    fn refit(&mut self) {
        self.run = project_entities(&self.table, &self.selection(), &self.config);
        self.status = format!(
            "{} projected | {} warning(s) | horizon {}",
            self.run.projections.len(),
            self.run.warnings.len(),
            self.config.horizon_year
        );
    }

    fn year_bounds(&self) -> (i32, i32) {
        let first = self.table.year_range().map_or(self.config.horizon_year, |(lo, _)| lo);
        (first.min(self.config.horizon_year), self.config.horizon_year)
    }

    fn clamp_year(&self, year: i32) -> i32 {
        let (lo, hi) = self.year_bounds();
        year.clamp(lo, hi)
    }

    fn focused_entity(&self) -> Option<&str> {
        self.entities.get(self.focus).map(String::as_str)
    }

    fn color_of(&self, entity: &str) -> usize {
        self.entities.iter().position(|e| e == entity).unwrap_or(0)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100)).map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Apply a key press; returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => self.focus = self.focus.saturating_sub(1),
            KeyCode::Down => {
                if self.focus + 1 < self.entities.len() {
                    self.focus += 1;
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(flag) = self.selected.get_mut(self.focus) {
                    *flag = !*flag;
                    self.refit();
                }
            }
            KeyCode::Left => self.year = self.clamp_year(self.year - 1),
            KeyCode::Right => self.year = self.clamp_year(self.year + 1),
            KeyCode::PageDown => self.year = self.clamp_year(self.year - 10),
            KeyCode::PageUp => self.year = self.clamp_year(self.year + 10),
            KeyCode::Tab | KeyCode::Char('v') => {
                self.view = self.view.next();
                self.status = format!("view: {}", self.view.title());
            }
            KeyCode::Char('+') => self.shift_horizon(HORIZON_STEP),
            KeyCode::Char('-') => self.shift_horizon(-HORIZON_STEP),
            _ => {}
        }
        false
    }

    fn shift_horizon(&mut self, delta: i32) {
        let last_observed = self.table.year_range().map_or(0, |(_, hi)| hi);
        let next = (self.config.horizon_year + delta).max(last_observed + 1);
        if next == self.config.horizon_year {
            return;
        }
        self.config.horizon_year = next;
        self.year = self.clamp_year(self.year);
        self.refit();
    }

    /// Projected point under the year cursor for the focused entity (or the
    /// first projected entity when the focused one has no projection).
    fn hover_point(&self) -> Option<(&str, ProjectionPoint)> {
        let projection = self
            .focused_entity()
            .and_then(|e| self.run.projection(e))
            .or_else(|| self.run.projections.first())?;
        let point = projection
            .points
            .iter()
            .find(|p| p.year >= self.year)
            .or_else(|| projection.points.last())?;
        Some((projection.entity.as_str(), *point))
    }

    fn hover_text(&self) -> String {
        match self.hover_point() {
            Some((entity, p)) => hover_label(entity, p.year, p.value),
            None => "No projection to inspect.".to_string(),
        }
    }

    fn projection_series(&self) -> Vec<ChartSeries> {
        self.run
            .projections
            .iter()
            .map(|p| ChartSeries {
                points: observed(&self.table, &p.entity),
                line: p.points.iter().map(|pt| (pt.year as f64, pt.value)).collect(),
                color: self.color_of(&p.entity),
            })
            .collect()
    }

    fn raw_series(&self) -> Vec<ChartSeries> {
        self.selection()
            .iter()
            .filter_map(|e| {
                let mut line = observed(&self.table, e);
                if line.is_empty() {
                    return None;
                }
                line.sort_by(|a, b| a.0.total_cmp(&b.0));
                Some(ChartSeries {
                    points: Vec::new(),
                    line,
                    color: self.color_of(e),
                })
            })
            .collect()
    }

    /// Year used by the sector view: the latest row at or before the cursor,
    /// else the earliest row for the entity.
    fn sector_year(&self, sectors: &SectorTable, entity: &str) -> Option<i32> {
        let years = sectors.records.iter().filter(|r| r.entity == entity).map(|r| r.year);
        years.clone().filter(|&y| y <= self.year).max().or_else(|| years.min())
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let line = Line::from(vec![
            Span::styled("co2", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" — {} | ", self.table.value_label())),
            Span::styled(
                format!(
                    "view: {} | year: {} | horizon: {}",
                    self.view.title(),
                    self.year,
                    self.config.horizon_year
                ),
                Style::default().fg(Color::Gray),
            ),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(0)])
            .split(area);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(10)])
            .split(columns[0]);

        self.draw_entities(frame, left[0]);
        self.draw_messages(frame, left[1]);

        match self.view {
            View::Projection | View::Raw => {
                let right = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(5)])
                    .split(columns[1]);
                self.draw_chart(frame, right[0]);
                self.draw_hover(frame, right[1]);
            }
            View::Sectors => self.draw_sectors(frame, columns[1]),
        }
    }

    fn draw_entities(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .entities
            .iter()
            .zip(&self.selected)
            .enumerate()
            .map(|(i, (name, &on))| {
                let mark = if on { "[x]" } else { "[ ]" };
                let style = if on {
                    Style::default().fg(palette_color(i))
                } else {
                    Style::default().fg(Color::Gray)
                };
                ListItem::new(Line::from(Span::styled(format!("{mark} {name}"), style)))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Regions").borders(Borders::ALL))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.focus));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_messages(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        for w in &self.run.warnings {
            lines.push(Line::from(Span::styled(w.message(), Style::default().fg(Color::Red))));
        }
        for n in &self.run.notices {
            lines.push(Line::from(Span::styled(n.message.clone(), Style::default().fg(Color::Gray))));
        }
        if lines.is_empty() {
            lines.push(Line::from(Span::styled("No warnings.", Style::default().fg(Color::DarkGray))));
        }

        let p = Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Messages").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title(self.view.title()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let series = match self.view {
            View::Projection => self.projection_series(),
            _ => self.raw_series(),
        };
        if series.is_empty() {
            let msg = Paragraph::new("Nothing to plot: select a region with Space.")
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        }

        let (lo, hi) = self.year_bounds();
        let x_fallback = [lo as f64, hi.max(lo + 1) as f64];
        let x_bounds = bounds(&series, |p| p.0, 0.0, x_fallback);
        let y_bounds = bounds(&series, |p| p.1, 0.05, [0.0, 1.0]);

        let marker = match self.view {
            View::Projection => self.hover_point().map(|(_, p)| (p.year as f64, p.value)),
            _ => None,
        };

        let (chart_rect, insets) = chart_layout(inner);
        let widget = ProjectionChart {
            series: &series,
            cursor_x: Some(self.year as f64),
            marker,
            x_bounds,
            y_bounds,
            x_label: "year",
            y_label: "t CO₂",
            fmt_x: fmt_axis_year,
            fmt_y: fmt_compact,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds, "year", "t CO₂");
        }
    }

    fn draw_hover(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let p = Paragraph::new(self.hover_text())
            .style(Style::default().fg(Color::White))
            .block(Block::default().title("Cursor").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_sectors(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(12), Constraint::Min(0)])
            .split(area);

        let entity = self.focused_entity().unwrap_or_default();
        let block = Block::default().title(View::Sectors.title()).borders(Borders::ALL);

        let sectors = match &self.sectors {
            Ok(s) => s,
            Err(msg) => {
                let p = Paragraph::new(msg.as_str())
                    .style(Style::default().fg(Color::Yellow))
                    .wrap(Wrap { trim: true })
                    .block(block);
                frame.render_widget(p, area);
                return;
            }
        };

        let Some(year) = self.sector_year(sectors, entity) else {
            let p = Paragraph::new(format!("No data available for {entity}"))
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(p, area);
            return;
        };

        let text = match sectors.breakdown(entity, year) {
            Ok(shares) => {
                let mut lines = vec![Line::from(format!("{entity}, {year}"))];
                lines.extend(
                    sector_bar_lines(&shares, BAR_WIDTH)
                        .into_iter()
                        .enumerate()
                        .map(|(i, l)| Line::from(Span::styled(l, Style::default().fg(palette_color(i))))),
                );
                Text::from(lines)
            }
            Err(e) => Text::from(Line::from(Span::styled(
                e.message().to_string(),
                Style::default().fg(Color::Yellow),
            ))),
        };
        frame.render_widget(Paragraph::new(text).block(block), rows[0]);

        let history_block = Block::default().title("Sector history").borders(Borders::ALL);
        let inner = history_block.inner(rows[1]);
        frame.render_widget(history_block, rows[1]);

        let Ok(history) = sectors.history(entity) else {
            return;
        };
        let series: Vec<ChartSeries> = history
            .into_iter()
            .enumerate()
            .map(|(i, (_, pts))| ChartSeries {
                points: Vec::new(),
                line: pts.into_iter().map(|(y, v)| (y as f64, v)).collect(),
                color: i,
            })
            .collect();
        let x_bounds = bounds(&series, |p| p.0, 0.0, [year as f64 - 1.0, year as f64 + 1.0]);
        let y_bounds = bounds(&series, |p| p.1, 0.05, [0.0, 1.0]);
        frame.render_widget(
            ProjectionChart {
                series: &series,
                cursor_x: Some(year as f64),
                marker: None,
                x_bounds,
                y_bounds,
                x_label: "year",
                y_label: "t CO₂",
                fmt_x: fmt_axis_year,
                fmt_y: fmt_compact,
            },
            inner,
        );
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ region  Space toggle  ←/→ year  PgUp/PgDn ±10y  Tab view  +/- horizon  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn observed(table: &EmissionTable, entity: &str) -> Vec<(f64, f64)> {
    table
        .series(entity)
        .map(|s| s.points.iter().map(|o| (o.year as f64, o.value)).collect())
        .unwrap_or_default()
}

/// One text bar per sector, scaled so the largest share fills `width` cells.
fn sector_bar_lines(shares: &[SectorShare], width: usize) -> Vec<String> {
    let max_share = shares.iter().map(|s| s.share).fold(0.0_f64, f64::max);
    shares
        .iter()
        .map(|s| {
            let cells = if max_share > 0.0 {
                ((s.share / max_share) * width as f64).round() as usize
            } else {
                0
            };
            format!(
                "{:<30} {:<width$} {:>5.1}%",
                s.sector,
                "█".repeat(cells),
                s.share * 100.0
            )
        })
        .collect()
}

fn fmt_axis_year(v: f64) -> String {
    format!("{v:.0}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

#[allow(clippy::too_many_arguments)]
fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    x_title: &str,
    y_title: &str,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_year(x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_compact(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new(x_title.to_string())
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label =
        Paragraph::new(y_title.to_string()).style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
