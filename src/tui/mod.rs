//! Ratatui-based terminal UI.
//!
//! The TUI provides a settings panel for the date window, data source and API
//! key, then renders the line chart, period statistics, trend and the most
//! recent observations.

use std::io;
use std::time::Duration;

use chrono::{Datelike, Months, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use plotters::style::RGBColor;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Terminal,
};

use crate::app::check_date_bounds;
use crate::app::pipeline::{default_source, Dashboard, DashboardRequest, LoadState, NO_DATA_MESSAGE};
use crate::config::ApiKeyConfig;
use crate::data::FredClient;
use crate::domain::{min_date, parse_date, SeriesTable};
use crate::error::AppError;
use crate::report::{fmt_pct, format_recent_table, format_trend, ReportView};

mod plotters_chart;

use plotters_chart::{ChartSeries, RatesPlottersChart};

const FIELD_START: usize = 0;
const FIELD_END: usize = 1;
const FIELD_SOURCE: usize = 2;
const FIELD_API_KEY: usize = 3;
const FIELD_COUNT: usize = 4;

const SERIES_COLORS: [RGBColor; 2] = [RGBColor(0, 255, 255), RGBColor(255, 96, 96)];

/// Start the TUI.
pub fn run(request: DashboardRequest, api_key: ApiKeyConfig, today: NaiveDate) -> Result<(), AppError> {
    let dashboard = Dashboard::new(FredClient::new()?);
    let mut app = App::new(dashboard, request, api_key, today);
    app.reload();

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
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
    dashboard: Dashboard<FredClient>,
    request: DashboardRequest,
    api_key: ApiKeyConfig,
    today: NaiveDate,
    selected_field: usize,
    /// Text being typed into the selected field, if editing.
    input: Option<String>,
    state: LoadState,
    view: Option<ReportView>,
    status: String,
}

impl App {
    fn new(
        dashboard: Dashboard<FredClient>,
        request: DashboardRequest,
        api_key: ApiKeyConfig,
        today: NaiveDate,
    ) -> Self {
        Self {
            dashboard,
            request,
            api_key,
            today,
            selected_field: 0,
            input: None,
            state: LoadState::Idle,
            view: None,
            status: "Loading...".to_string(),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
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

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.input.is_some() {
            self.handle_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < FIELD_COUNT {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Enter => self.begin_edit(),
            KeyCode::Char('u') => {
                self.dashboard.refresh();
                self.reload();
            }
            _ => {}
        }

        false
    }

    fn begin_edit(&mut self) {
        let initial = match self.selected_field {
            FIELD_START => self.request.start.to_string(),
            FIELD_END => self.request.end.to_string(),
            FIELD_API_KEY => String::new(),
            _ => return,
        };
        self.input = Some(initial);
        self.status = if self.selected_field == FIELD_API_KEY {
            "Type the FRED API key. Enter to apply (empty clears), Esc to cancel.".to_string()
        } else {
            "Editing date (YYYY-MM-DD). Enter to apply, Esc to cancel.".to_string()
        };
    }

    fn handle_edit(&mut self, code: KeyCode) {
        let Some(input) = self.input.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.input = None;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                let text = self.input.take().unwrap_or_default();
                self.apply_input(&text);
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) => {
                let accept = if self.selected_field == FIELD_API_KEY {
                    !c.is_whitespace()
                } else {
                    c.is_ascii_digit() || c == '-'
                };
                if accept {
                    input.push(c);
                }
            }
            _ => {}
        }
    }

    fn apply_input(&mut self, text: &str) {
        if self.selected_field == FIELD_API_KEY {
            self.api_key.set_manual(text);
            self.request.api_key = self.api_key.key.clone();
            self.request.source = default_source(self.api_key.is_present());
            self.reload();
            return;
        }

        let date = match parse_date(text).and_then(|d| {
            let label = if self.selected_field == FIELD_START { "start" } else { "end" };
            check_date_bounds(label, d, self.today).map(|()| d)
        }) {
            Ok(d) => d,
            Err(err) => {
                self.status = err.to_string();
                return;
            }
        };
        self.set_date(date);
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.selected_field {
            FIELD_START | FIELD_END => {
                let current = if self.selected_field == FIELD_START {
                    self.request.start
                } else {
                    self.request.end
                };
                let shifted = if delta >= 0 {
                    current.checked_add_months(Months::new(12))
                } else {
                    current.checked_sub_months(Months::new(12))
                };
                let Some(shifted) = shifted else {
                    return;
                };
                self.set_date(shifted.clamp(min_date(), self.today));
            }
            FIELD_SOURCE => {
                self.request.source = self.request.source.toggle();
                self.reload();
            }
            _ => {}
        }
    }

    fn set_date(&mut self, date: NaiveDate) {
        if self.selected_field == FIELD_START {
            self.request.start = date;
        } else {
            self.request.end = date;
        }
        self.reload();
    }

    fn reload(&mut self) {
        self.state = self.dashboard.load(&self.request);
        self.view = self.state.loaded().map(ReportView::build);
        self.status = status_line(&self.state);
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("ccr", Style::default().fg(Color::Cyan)),
            Span::raw(" | US credit card delinquency and charge-off rates"),
        ]));

        let source = self
            .state
            .loaded()
            .map(|d| d.source.display_name())
            .unwrap_or("-");
        let rows = self.state.loaded().map(|d| d.table.len()).unwrap_or(0);
        lines.push(Line::from(Span::styled(
            format!(
                "range: {} → {} | source: {source} | rows: {rows} | {}",
                self.request.start,
                self.request.end,
                self.api_key.source.describe(),
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(area);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(16)])
            .split(columns[0]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Length(8), Constraint::Min(0)])
            .split(columns[1]);

        self.draw_chart(frame, left[0]);
        self.draw_recent(frame, left[1]);
        self.draw_settings(frame, right[0]);
        self.draw_stats(frame, right[1]);
        self.draw_trend(frame, right[2]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Credit card rates").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(data) = self.state.loaded() else {
            let msg = match &self.state {
                LoadState::Idle => "Waiting for data...".to_string(),
                LoadState::Invalid(message) => message.clone(),
                _ => NO_DATA_MESSAGE.to_string(),
            };
            let p = Paragraph::new(msg)
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(p, inner);
            return;
        };

        let (series, x_bounds, y_bounds) = chart_series(&data.table);
        let widget = RatesPlottersChart {
            series: &series,
            x_bounds,
            y_bounds,
            x_label: "date",
            y_label: "rate (%)",
            fmt_x: fmt_axis_year,
            fmt_y: fmt_axis_pct,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_recent(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let text = match (self.state.loaded(), &self.view) {
            (Some(data), Some(view)) => format_recent_table(data.table.columns(), &view.recent),
            _ => String::new(),
        };
        let p = Paragraph::new(text).block(Block::default().title("Recent data").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let editing = |field: usize| self.input.as_ref().filter(|_| self.selected_field == field);

        let start = editing(FIELD_START).cloned().unwrap_or_else(|| self.request.start.to_string());
        let end = editing(FIELD_END).cloned().unwrap_or_else(|| self.request.end.to_string());
        let key = match editing(FIELD_API_KEY) {
            Some(typed) => "•".repeat(typed.chars().count()),
            None if self.api_key.is_present() => "set".to_string(),
            None => "missing".to_string(),
        };

        let items = vec![
            ListItem::new(format!("Start: {start}")),
            ListItem::new(format!("End: {end}")),
            ListItem::new(format!("Source: {}", self.request.source.display_name())),
            ListItem::new(format!("API key: {key}")),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_stats(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        if let Some(view) = &self.view {
            for s in &view.summaries {
                lines.push(Line::from(Span::styled(
                    s.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(format!(
                    "current {}  mean {}  max {}  min {}",
                    fmt_pct(s.current),
                    fmt_pct(s.mean),
                    fmt_pct(s.max),
                    fmt_pct(s.min),
                )));
            }
        }
        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Period statistics").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_trend(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let text = self.view.as_ref().map(|v| format_trend(&v.trend)).unwrap_or_default();
        let p = Paragraph::new(text)
            .wrap(ratatui::widgets::Wrap { trim: true })
            .block(Block::default().title("Trend").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  Enter edit  u refresh  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// One-line summary of a load for the footer.
fn status_line(state: &LoadState) -> String {
    match state {
        LoadState::Idle => "Idle.".to_string(),
        LoadState::Invalid(message) => message.clone(),
        LoadState::Empty { warnings } => {
            let mut parts = vec![NO_DATA_MESSAGE.to_string()];
            parts.extend(warnings.iter().cloned());
            parts.join(" | ")
        }
        LoadState::Ready(data) if data.warnings.is_empty() => {
            let rows = data.table.len();
            let noun = if rows == 1 { "row" } else { "rows" };
            format!("Loaded {rows} {noun} from {}.", data.source.display_name())
        }
        LoadState::Ready(data) => data.warnings.join(" | "),
    }
}

/// Build chart series for Plotters: x in decimal years, gaps at missing values.
fn chart_series(table: &SeriesTable) -> (Vec<ChartSeries>, [f64; 2], [f64; 2]) {
    let mut series = Vec::with_capacity(table.columns().len());
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);

    for idx in 0..table.columns().len() {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (date, value) in table.column(idx) {
            match value {
                Some(y) => {
                    let x = decimal_year(date);
                    x_min = x_min.min(x);
                    x_max = x_max.max(x);
                    y_min = y_min.min(y);
                    y_max = y_max.max(y);
                    current.push((x, y));
                }
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        series.push(ChartSeries {
            segments,
            color: SERIES_COLORS[idx % SERIES_COLORS.len()],
        });
    }

    if !x_min.is_finite() || !x_max.is_finite() || x_max <= x_min {
        let center = if x_min.is_finite() { x_min } else { 0.0 };
        x_min = center - 0.5;
        x_max = center + 0.5;
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        let center = if y_min.is_finite() { y_min } else { 0.5 };
        y_min = center - 0.5;
        y_max = center + 0.5;
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    (series, [x_min, x_max], [y_min - pad, y_max + pad])
}

fn decimal_year(date: NaiveDate) -> f64 {
    let days_in_year = if date.leap_year() { 366.0 } else { 365.0 };
    date.year() as f64 + f64::from(date.ordinal0()) / days_in_year
}

fn fmt_axis_year(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_pct(v: f64) -> String {
    format!("{v:.1}")
}
