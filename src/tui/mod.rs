//! Ratatui-based live dashboard.
//!
//! Shows KPI cards, the intensity history, the latest generation mix and the
//! goal-tracker indicators, refreshing from the configured source on a timer.
//! A failed refresh keeps the previous data on screen and reports the error in
//! the status line.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::pipeline::{self, RunOutput};
use crate::cli::DashArgs;
use crate::config::Settings;
use crate::domain::{DataSource, FetchLimits, IntensityReading, MixReading};
use crate::error::AppError;
use crate::plot::intensity_points;
use crate::report::{fmt_kpi, format_goal_tracker, kpis};
use crate::tracker::EvalClock;

mod plotters_chart;

use plotters_chart::IntensityChart;

const DEBUG_DIR: &str = "debug";
const HOURS_PER_DAY: f64 = 24.0;

/// Start the dashboard.
pub fn run(args: DashArgs, settings: Settings) -> Result<(), AppError> {
    let source = pipeline::resolve_source(args.source.source, &settings);
    let data_dir = args.source.data_dir.clone().unwrap_or_else(|| settings.csv_dir.clone());
    let poll = Duration::from_secs(args.poll.unwrap_or(settings.poll_interval_secs).max(1));

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(source, data_dir, args.source.limits(), settings, poll);
    app.refresh();
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

struct App {
    source: DataSource,
    data_dir: PathBuf,
    limits: FetchLimits,
    settings: Settings,
    poll: Duration,
    paused: bool,
    last_refresh: Option<Instant>,
    status: String,
    run: Option<RunOutput>,
}

impl App {
    fn new(source: DataSource, data_dir: PathBuf, limits: FetchLimits, settings: Settings, poll: Duration) -> Self {
        Self {
            source,
            data_dir,
            limits,
            settings,
            poll,
            paused: false,
            last_refresh: None,
            status: format!("Loading from {}...", source.display_name()),
            run: None,
        }
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

            if self.refresh_due() {
                self.refresh();
                needs_redraw = true;
                continue;
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

    /// Returns `true` when the dashboard should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('p') => {
                self.paused = !self.paused;
                self.status = if self.paused {
                    "Auto-refresh paused.".to_string()
                } else {
                    "Auto-refresh resumed.".to_string()
                };
            }
            KeyCode::Char('d') => self.write_debug(Path::new(DEBUG_DIR)),
            _ => {}
        }
        false
    }

    fn refresh_due(&self) -> bool {
        !self.paused && self.last_refresh.is_none_or(|t| t.elapsed() >= self.poll)
    }

    fn refresh(&mut self) {
        self.last_refresh = Some(Instant::now());
        match pipeline::load_data(self.source, &self.data_dir, self.limits, &self.settings) {
            Ok(data) => {
                let run = pipeline::evaluate(data, EvalClock::system());
                self.status = match run.outcome.error() {
                    Some(err) => format!("Updated {} | tracker: {err}", Local::now().format("%H:%M:%S")),
                    None => format!("Updated {}", Local::now().format("%H:%M:%S")),
                };
                self.run = Some(run);
            }
            Err(e) => {
                tracing::warn!(error = %e, "dashboard refresh failed");
                self.status = if self.run.is_some() {
                    format!("Refresh failed (showing previous data): {e}")
                } else {
                    format!("Refresh failed: {e}")
                };
            }
        }
    }

    fn write_debug(&mut self, dir: &Path) {
        let Some(run) = &self.run else {
            self.status = "No data yet; nothing to write.".to_string();
            return;
        };
        self.status = match crate::debug::write_debug_bundle(
            dir,
            run.data.source,
            &run.data.snapshot,
            &run.outcome,
            &run.clock,
        ) {
            Ok(path) => format!("Wrote debug bundle: {}", path.display()),
            Err(e) => format!("Debug write failed: {e}"),
        };
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines = Vec::new();
        lines.push(Line::from(Span::styled(
            "goals - Net-Zero Goal Tracker",
            Style::default().add_modifier(Modifier::BOLD),
        )));

        match &self.run {
            Some(run) => {
                let snap = &run.data.snapshot;
                let k = kpis(&snap.intensity, &snap.mix, &snap.targets);
                lines.push(Line::from(vec![
                    Span::styled("CO2 intensity: ", Style::default().fg(Color::Gray)),
                    Span::raw(fmt_kpi(k.intensity, "g/kWh", 1)),
                    Span::styled("  Renewable share: ", Style::default().fg(Color::Gray)),
                    Span::raw(fmt_kpi(k.renewable_share_pct, "%", 1)),
                    Span::styled("  Alignment: ", Style::default().fg(Color::Gray)),
                    Span::raw(fmt_kpi(k.alignment_pct, "%", 0)),
                ]));
                lines.push(Line::from(Span::styled(
                    format!(
                        "source: {} | rows: intensity={} mix={} targets={} | poll: {}s{}",
                        run.data.source.display_name(),
                        snap.intensity.len(),
                        snap.mix.len(),
                        snap.targets.len(),
                        self.poll.as_secs(),
                        if self.paused { " (paused)" } else { "" },
                    ),
                    Style::default().fg(Color::Gray),
                )));
            }
            None => lines.push(Line::from(Span::styled(
                format!("source: {} | waiting for data", self.source.display_name()),
                Style::default().fg(Color::Gray),
            ))),
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(46)])
            .split(area);
        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(9), Constraint::Min(0)])
            .split(columns[1]);

        self.draw_chart(frame, columns[0]);
        self.draw_mix(frame, side[0]);
        self.draw_tracker(frame, side[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("CO2 intensity").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let series = self
            .run
            .as_ref()
            .map(|r| chart_series(&r.data.snapshot.intensity))
            .unwrap_or_default();
        if series.points.is_empty() {
            let msg = Paragraph::new("Waiting for intensity readings...").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        }

        let on_track = self
            .run
            .as_ref()
            .and_then(|r| r.outcome.indicators())
            .and_then(|t| t.velocity)
            .map(|v| v.on_track);
        let latest_color = match on_track {
            Some(true) => RGBColor(0, 255, 0),
            Some(false) => RGBColor(255, 0, 0),
            None => RGBColor(255, 255, 0),
        };

        let (chart_rect, margins) = chart_layout(inner);
        let widget = IntensityChart {
            series: &series.points,
            latest: series.points.last().copied(),
            latest_color,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            x_label: "hours",
            y_label: "g/kWh",
            fmt_x: fmt_axis_x,
            fmt_y: fmt_axis_y,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(margins) = margins {
            draw_axis_ticks(frame, inner, chart_rect, margins, series.x_bounds, series.y_bounds);
        }
    }

    fn draw_mix(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let latest = self
            .run
            .as_ref()
            .and_then(|r| r.data.snapshot.mix.iter().max_by_key(|m| m.timestamp));
        let lines: Vec<Line> = match latest {
            Some(m) => mix_breakdown(m, 14)
                .into_iter()
                .map(Line::from)
                .collect(),
            None => vec![Line::from(Span::styled("no generation mix", Style::default().fg(Color::Yellow)))],
        };
        let p = Paragraph::new(Text::from(lines)).block(Block::default().title("Generation mix").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_tracker(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let text = match &self.run {
            Some(run) => format_goal_tracker(&run.outcome),
            None => "Waiting for data...".to_string(),
        };
        let p = Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Goal tracker").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "r refresh  p pause  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Chart-ready intensity series with padded bounds.
#[derive(Debug, Clone, Default, PartialEq)]
struct ChartSeries {
    points: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

fn chart_series(rows: &[IntensityReading]) -> ChartSeries {
    let points: Vec<(f64, f64)> = intensity_points(rows)
        .into_iter()
        .map(|(days, v)| (days * HOURS_PER_DAY, v))
        .collect();

    let mut x_max = points.last().map(|p| p.0).unwrap_or(1.0);
    if !x_max.is_finite() || x_max <= 0.0 {
        x_max = 1.0;
    }

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in &points {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        let mid = if y_min.is_finite() { y_min } else { 0.0 };
        y_min = mid - 1.0;
        y_max = mid + 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    ChartSeries {
        points,
        x_bounds: [0.0, x_max],
        y_bounds: [y_min - pad, y_max + pad],
    }
}

/// One text row per technology: MW, share of total, and a bar `bar_width` wide at 100%.
fn mix_breakdown(m: &MixReading, bar_width: usize) -> Vec<String> {
    let total = m.total_mw();
    let rows = [
        ("hydro", m.hydro_mw),
        ("wind", m.wind_mw),
        ("solar", m.solar_mw),
        ("nuclear", m.nuclear_mw),
        ("fossil", m.fossil_mw),
    ];

    let mut out: Vec<String> = rows
        .iter()
        .map(|&(name, mw)| {
            let share = if total > 0.0 { 100.0 * mw / total } else { 0.0 };
            let filled = ((share / 100.0) * bar_width as f64).round() as usize;
            format!("{name:<8}{mw:>8.0} MW {share:>5.1}% {}", "#".repeat(filled.min(bar_width)))
        })
        .collect();
    out.push(format!(
        "renewable {}",
        m.derived_renewable_share_pct()
            .map(|v| format!("{v:.1}%"))
            .unwrap_or_else(|| "n/a".to_string())
    ));
    out
}

fn fmt_axis_x(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_y(v: f64) -> String {
    format!("{v:.0}")
}

/// Space reserved around the plotters area for our own tick labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Margins {
    left: u16,
    bottom: u16,
}

const TICK_MARGINS: Margins = Margins { left: 7, bottom: 2 };
const TICKS: usize = 5;

/// Split `inner` into the plot rectangle and, when there is room, the tick margins.
fn chart_layout(inner: Rect) -> (Rect, Option<Margins>) {
    let m = TICK_MARGINS;
    if inner.width <= m.left + 12 || inner.height <= m.bottom + 6 {
        return (inner, None);
    }
    let rect = Rect {
        x: inner.x + m.left,
        y: inner.y,
        width: inner.width - m.left - 1,
        height: inner.height - m.bottom,
    };
    (rect, Some(m))
}

/// Evenly spaced tick positions along `len` cells (0 = axis start) with their labels.
fn axis_ticks(bounds: [f64; 2], len: u16, fmt: fn(f64) -> String) -> Vec<(u16, String)> {
    let span = f64::from(len.saturating_sub(1));
    (0..TICKS)
        .map(|i| {
            let u = i as f64 / (TICKS - 1) as f64;
            let value = bounds[0] + u * (bounds[1] - bounds[0]);
            ((span * u).round() as u16, fmt(value))
        })
        .collect()
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    margins: Margins,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let style = Style::default().fg(Color::Gray);

    let x_row = chart.y + chart.height;
    for (offset, label) in axis_ticks(x_bounds, chart.width, fmt_axis_x) {
        let width = label.len() as u16;
        let x = (chart.x + offset).saturating_sub(width / 2);
        frame.render_widget(Paragraph::new(label).style(style), Rect { x, y: x_row, width, height: 1 });
    }

    for (offset, label) in axis_ticks(y_bounds, chart.height, fmt_axis_y) {
        let width = (label.len() as u16).min(margins.left - 1);
        let y = chart.y + chart.height - 1 - offset;
        let x = inner.x + margins.left - 1 - width;
        frame.render_widget(Paragraph::new(label).style(style), Rect { x, y, width, height: 1 });
    }

    if x_row + 1 < inner.y + inner.height {
        let caption = Paragraph::new("hours since first reading   (g/kWh)")
            .alignment(Alignment::Center)
            .style(style.add_modifier(Modifier::BOLD));
        frame.render_widget(caption, Rect { x: chart.x, y: x_row + 1, width: chart.width, height: 1 });
    }
}
