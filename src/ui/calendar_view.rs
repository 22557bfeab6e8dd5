use crate::calc::year_grid::{WEEKDAY_LABELS, month_name};
use crate::calc::{
    CalendarDay, DayKind, GridCache, ScrollRatios, SmoothScroll, ViewSynchronizer, Viewport,
    YearGrid, index_target, max_scroll, scroll_target,
};
use crate::data::{AppSettings, Event, EventData};
use crate::ui::event_modal::{EventModal, ModalAction};
use crate::ui::hex_color;
use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate};
use crossterm::event::{
    self, Event as CEvent, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::collections::HashMap;
use std::fmt;
use std::io::Stdout;
use std::rc::Rc;
use std::time::Duration as StdDuration;
use tracing::{debug, info};

// Light fuchsia, the "today" highlight.
const TODAY_BG: Color = Color::Indexed(219);

const WHEEL_LINES: i64 = 3;

#[derive(PartialEq, Debug)]
enum Mode {
    Normal,
    Search,
}

/// A day cell activation, already normalized to the real calendar date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayClick {
    pub day: u32,
    /// Zero-based.
    pub month: u32,
    pub year: i32,
}

impl fmt::Display for DayClick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}, {}", month_name(self.month), self.day, self.year)
    }
}

pub type DayClickHandler = Box<dyn FnMut(DayClick)>;

/// Marker colors per in-year `(month0, day)` of one year.
struct MarkerCache {
    year: i32,
    colors: HashMap<(u32, u32), Vec<Color>>,
}

/// Owns all widget state: the displayed year, the current month, the event
/// list, the dialog and the scroll position.
pub struct App {
    year: i32,
    today: NaiveDate,
    events: EventData,
    settings: AppSettings,
    ratios: ScrollRatios,
    grids: GridCache,
    grid: Rc<YearGrid>,
    /// Rebuilt on first render after the year or the event list changes.
    markers: Option<MarkerCache>,
    sync: ViewSynchronizer,
    scroller: SmoothScroll,
    /// Set while a month-selector or Today scroll runs, so the sentinels it
    /// passes do not override the month that was picked.
    suppress_sync: bool,
    viewport: Viewport,
    /// False until the first render has measured the grid pane.
    laid_out: bool,
    grid_area: Rect,
    cursor: usize,
    mode: Mode,
    input_buffer: String,
    modal: Option<EventModal>,
    /// Last activation message, cleared on the next keypress.
    status: Option<(String, Color)>,
    on_day_click: Option<DayClickHandler>,
}

impl App {
    pub fn new(events: EventData, settings: AppSettings, today: NaiveDate, year: i32) -> Self {
        let mut grids = GridCache::default();
        let grid = grids.get(year);
        let mut sync = ViewSynchronizer::new(settings.band(), today.month0());
        sync.observe(&grid, u32::from(settings.row_height));
        let cursor = if today.year() == year {
            grid.position(today.month0(), today.day())
        } else {
            grid.position(0, 1)
        }
        .unwrap_or(0);
        let mut app = App {
            year,
            today,
            events,
            ratios: settings.ratios(),
            scroller: SmoothScroll::new(settings.scroll_smoothing),
            settings,
            grids,
            grid,
            markers: None,
            sync,
            suppress_sync: false,
            viewport: Viewport::default(),
            laid_out: false,
            grid_area: Rect::default(),
            cursor,
            mode: Mode::Normal,
            input_buffer: String::new(),
            modal: None,
            status: None,
            on_day_click: None,
        };
        app.center_on_cursor_now();
        app
    }

    pub fn set_on_day_click(&mut self, handler: DayClickHandler) {
        self.on_day_click = Some(handler);
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn selected_month(&self) -> u32 {
        self.sync.current_month()
    }

    pub fn events(&self) -> &EventData {
        &self.events
    }

    pub fn grid(&self) -> &YearGrid {
        &self.grid
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal.is_some()
    }

    pub fn is_observing(&self) -> bool {
        self.sync.is_observing()
    }

    pub fn scroll_top(&self) -> u32 {
        self.viewport.scroll_top
    }

    /// Where the pane is scrolling to (equal to `scroll_top` once settled).
    pub fn scroll_destination(&self) -> u32 {
        self.scroller.target()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn cursor_day(&self) -> Option<CalendarDay> {
        self.grid.get(self.cursor).copied()
    }

    /// Real calendar date under the cursor.
    pub fn cursor_date(&self) -> Option<NaiveDate> {
        let (day, month, year) = self.cursor_day()?.normalized(self.year);
        NaiveDate::from_ymd_opt(year, month + 1, day)
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|(msg, _)| msg.as_str())
    }

    fn row_height(&self) -> u32 {
        u32::from(self.settings.row_height)
    }

    // ── Event list setters (called by the dialog) ─────────────────────────────

    pub fn add_event(&mut self, event: Event) {
        self.events.add(event);
        self.markers = None;
    }

    pub fn update_event(&mut self, event: Event) {
        self.events.update(event);
        self.markers = None;
    }

    pub fn delete_event(&mut self, id: &str) {
        self.events.delete(id);
        self.markers = None;
    }

    // ── Navigation ────────────────────────────────────────────────────────────

    /// Switches the displayed year. The cursor keeps its month and day when the
    /// new year has them (Feb 29 falls back to Feb 28).
    pub fn set_year(&mut self, year: i32) {
        if year == self.year {
            return;
        }
        let (month, day) = self
            .cursor_day()
            .filter(|d| !d.is_padding())
            .map(|d| (d.month as u32, d.day))
            .unwrap_or((0, 1));
        let rh = self.row_height();
        self.year = year;
        self.grid = self.grids.get(year);
        self.markers = None;
        self.sync.observe(&self.grid, rh);
        self.cursor = self
            .grid
            .position(month, day)
            .or_else(|| self.grid.position(month, day.saturating_sub(1)))
            .unwrap_or(0);
        let max = max_scroll(&self.grid, rh, self.viewport.height);
        self.scroller.clamp_to(max);
        self.viewport.scroll_top = self.scroller.position();
        info!(year, "year changed");
    }

    pub fn prev_year(&mut self) {
        self.set_year(self.year.saturating_sub(1));
    }

    pub fn next_year(&mut self) {
        self.set_year(self.year.saturating_add(1));
    }

    /// Starts a smooth scroll that centres `(month0, day)`. Returns false, and
    /// leaves the pane alone, when the year has no such day.
    pub fn scroll_to_day(&mut self, month: u32, day: u32) -> bool {
        let rh = self.row_height();
        match scroll_target(&self.grid, month, day, rh, &self.viewport, &self.ratios) {
            Some(target) => {
                self.scroller.scroll_to(target);
                true
            }
            None => {
                debug!(month, day, "no cell to scroll to");
                false
            }
        }
    }

    /// Month selector: make `month` current and scroll to its first day.
    pub fn select_month(&mut self, month: u32) {
        let month = month.min(11);
        self.sync.set_current_month(month);
        if let Some(i) = self.grid.position(month, 1) {
            self.cursor = i;
        }
        if self.scroll_to_day(month, 1) {
            self.suppress_sync = true;
        }
    }

    /// Back to the real current year and scroll to today.
    pub fn go_today(&mut self) {
        let today = self.today;
        self.set_year(today.year());
        self.jump_to_date(today.month0(), today.day());
    }

    fn jump_to_date(&mut self, month: u32, day: u32) {
        if let Some(i) = self.grid.position(month, day) {
            self.cursor = i;
            self.sync.set_current_month(month);
        }
        if self.scroll_to_day(month, day) {
            self.suppress_sync = true;
        }
    }

    fn move_cursor_days(&mut self, delta: i64) {
        let Some(date) = self.cursor_date() else {
            return;
        };
        let Some(target) = date.checked_add_signed(Duration::days(delta)) else {
            return;
        };
        if target.year() != self.year {
            self.set_year(target.year());
        }
        if let Some(i) = self.grid.position(target.month0(), target.day()) {
            self.cursor = i;
        }
        self.ensure_cursor_visible();
    }

    fn ensure_cursor_visible(&mut self) {
        let rh = self.row_height();
        let top = YearGrid::row_of(self.cursor) as u32 * rh;
        let view_top = self.scroller.target();
        let height = u32::from(self.viewport.height);
        if top < view_top || top + rh > view_top + height {
            let target = index_target(&self.grid, self.cursor, rh, &self.viewport, &self.ratios);
            self.scroller.scroll_to(target);
            self.suppress_sync = false;
        }
    }

    fn center_on_cursor_now(&mut self) {
        let rh = self.row_height();
        let target = index_target(&self.grid, self.cursor, rh, &self.viewport, &self.ratios);
        self.scroller.jump_to(target);
        self.viewport.scroll_top = target;
        self.sync.settle(&self.viewport);
    }

    fn scroll_by(&mut self, lines: i64) {
        let rh = self.row_height();
        let max = i64::from(max_scroll(&self.grid, rh, self.viewport.height));
        let next = (i64::from(self.scroller.target()) + lines).clamp(0, max) as u32;
        self.scroller.jump_to(next);
        self.viewport.scroll_top = next;
        self.suppress_sync = false;
    }

    fn set_viewport_size(&mut self, width: u16, height: u16) {
        if self.laid_out && self.viewport.width == width && self.viewport.height == height {
            return;
        }
        self.viewport.width = width;
        self.viewport.height = height;
        if !self.laid_out {
            self.laid_out = true;
            self.center_on_cursor_now();
        } else {
            let max = max_scroll(&self.grid, self.row_height(), height);
            self.scroller.clamp_to(max);
            self.viewport.scroll_top = self.scroller.position();
        }
    }

    /// Advances the scroll animation by one frame and lets the sentinels the
    /// band crossed update the current month.
    pub fn tick(&mut self) {
        let moved = self.scroller.tick();
        self.viewport.scroll_top = self.scroller.position();
        if moved && self.suppress_sync {
            self.sync.settle(&self.viewport);
        } else if let Some(month) = self.sync.poll(&self.viewport) {
            debug!(month, "current month follows scroll");
        }
        if !self.scroller.is_animating() {
            self.suppress_sync = false;
        }
    }

    fn refresh_markers(&mut self) {
        if self.markers.as_ref().is_some_and(|m| m.year == self.year) {
            return;
        }
        let colors = self
            .events
            .markers_for(&self.grid)
            .into_iter()
            .map(|(key, events)| {
                let colors = events
                    .iter()
                    .map(|e| hex_color(&e.color).unwrap_or(Color::Blue))
                    .collect();
                (key, colors)
            })
            .collect();
        debug!(year = self.year, "event markers rebuilt");
        self.markers = Some(MarkerCache {
            year: self.year,
            colors,
        });
    }

    /// Stops tracking sentinels. Call once the widget goes away.
    pub fn unmount(&mut self) {
        self.sync.disconnect();
    }

    // ── Day activation and the dialog ─────────────────────────────────────────

    /// Activates the cell at `index`, reporting its normalized date.
    pub fn activate_index(&mut self, index: usize) {
        let Some(cell) = self.grid.get(index).copied() else {
            return;
        };
        self.cursor = index;
        let (day, month, year) = cell.normalized(self.year);
        let click = DayClick { day, month, year };
        info!(day, month, year, "day activated");
        self.status = Some((format!("Selected {click}"), Color::Cyan));
        if let Some(handler) = self.on_day_click.as_mut() {
            handler(click);
        }
    }

    fn open_dialog(&mut self, adding: bool) {
        let Some(date) = self.cursor_date() else {
            return;
        };
        let mut modal = EventModal::new(date, &self.settings.default_event_color);
        if adding {
            modal.start_adding();
        }
        debug!(%date, adding, "event dialog opened");
        self.modal = Some(modal);
    }

    fn handle_modal_key(&mut self, code: KeyCode) {
        let Some(modal) = self.modal.as_mut() else {
            return;
        };
        let date = modal.date();
        let on_date = self.events.on_date(date.year(), date.month(), date.day());
        let action = modal.handle_key(code, &on_date);
        match action {
            Some(ModalAction::Add(event)) => self.add_event(event),
            Some(ModalAction::Update(event)) => self.update_event(event),
            Some(ModalAction::Delete(id)) => self.delete_event(&id),
            Some(ModalAction::Close) => {
                debug!("event dialog closed");
                self.modal = None;
            }
            None => {}
        }
    }

    fn is_today(&self, cell: &CalendarDay) -> bool {
        cell.normalized(self.year) == (self.today.day(), self.today.month0(), self.today.year())
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    /// Returns true if the app should quit.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if self.modal.is_some() {
            self.handle_modal_key(code);
            return false;
        }

        self.status = None;

        match self.mode {
            Mode::Search => {
                match code {
                    KeyCode::Enter => {
                        let hit = self
                            .events
                            .search(&self.input_buffer)
                            .first()
                            .and_then(|e| e.ymd());
                        if let Some((y, m, d)) = hit {
                            self.set_year(y);
                            self.jump_to_date(m - 1, d);
                        }
                        self.input_buffer.clear();
                        self.mode = Mode::Normal;
                    }
                    KeyCode::Esc => {
                        self.input_buffer.clear();
                        self.mode = Mode::Normal;
                    }
                    KeyCode::Backspace => {
                        self.input_buffer.pop();
                    }
                    KeyCode::Char(c) => {
                        self.input_buffer.push(c);
                    }
                    _ => {}
                }
                false
            }

            Mode::Normal => {
                match code {
                    KeyCode::Left => self.move_cursor_days(-1),
                    KeyCode::Right => self.move_cursor_days(1),
                    KeyCode::Up => self.move_cursor_days(-7),
                    KeyCode::Down => self.move_cursor_days(7),
                    KeyCode::PageDown => self.scroll_by(i64::from(self.viewport.height)),
                    KeyCode::PageUp => self.scroll_by(-i64::from(self.viewport.height)),
                    KeyCode::Char('n') => self.next_year(),
                    KeyCode::Char('p') => self.prev_year(),
                    KeyCode::Char('m') => self.select_month((self.selected_month() + 1) % 12),
                    KeyCode::Char('M') => self.select_month((self.selected_month() + 11) % 12),
                    KeyCode::Char('t') => self.go_today(),
                    KeyCode::Char(' ') => self.activate_index(self.cursor),
                    KeyCode::Enter => self.open_dialog(false),
                    KeyCode::Char('a') => self.open_dialog(true),
                    KeyCode::Char('/') => {
                        self.mode = Mode::Search;
                        self.input_buffer.clear();
                    }
                    KeyCode::Char('q') => return true,
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                        return true;
                    }
                    _ => {}
                }
                false
            }
        }
    }

    pub fn handle_mouse(&mut self, kind: MouseEventKind, column: u16, row: u16) {
        if self.modal.is_some() {
            return;
        }
        match kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(index) = self.cell_at(column, row) {
                    self.activate_index(index);
                }
            }
            MouseEventKind::ScrollDown => self.scroll_by(WHEEL_LINES),
            MouseEventKind::ScrollUp => self.scroll_by(-WHEEL_LINES),
            _ => {}
        }
    }

    /// Grid index under a terminal position, from the last rendered layout.
    fn cell_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.grid_area;
        if column < area.x
            || row < area.y
            || column >= area.x + area.width
            || row >= area.y + area.height
        {
            return None;
        }
        let cell_w = area.width / 7;
        if cell_w == 0 {
            return None;
        }
        let col = usize::from((column - area.x) / cell_w);
        if col >= 7 {
            return None;
        }
        let line = self.viewport.scroll_top + u32::from(row - area.y);
        let index = (line / self.row_height()) as usize * 7 + col;
        (index < self.grid.len()).then_some(index)
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // toolbar + spacer
                Constraint::Length(1), // weekday header
                Constraint::Min(3),    // grid
                Constraint::Length(2), // status + key hints
            ])
            .split(f.area());

        self.grid_area = chunks[2];
        self.set_viewport_size(chunks[2].width, chunks[2].height);
        self.refresh_markers();

        self.render_toolbar(f, chunks[0]);
        self.render_weekdays(f, chunks[1]);
        self.render_grid(f, chunks[2]);
        self.render_footer(f, chunks[3]);

        if let Some(modal) = &self.modal {
            let area = f.area();
            let date = modal.date();
            let on_date = self.events.on_date(date.year(), date.month(), date.day());
            modal.render(f, area, &on_date);
        }
    }

    fn render_toolbar(&self, f: &mut Frame, area: Rect) {
        let parts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(18)])
            .split(area);

        let bold = Style::default().add_modifier(Modifier::BOLD);
        let hint = Style::default().fg(Color::DarkGray);
        let left = Line::from(vec![
            Span::styled("◂ ", hint),
            Span::styled(format!("{:<9}", month_name(self.selected_month())), bold),
            Span::styled(" ▸", hint),
            Span::styled(" (m/M)   ", hint),
            Span::styled("Today", bold),
            Span::styled(" (t)   ", hint),
            Span::styled("+ Add Event", Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
            Span::styled(" (a)", hint),
        ]);
        f.render_widget(Paragraph::new(left), parts[0]);

        let right = Line::from(vec![
            Span::styled("‹ ", hint),
            Span::styled(format!("{}", self.year), bold),
            Span::styled(" › (p/n)", hint),
        ]);
        f.render_widget(Paragraph::new(right), parts[1]);
    }

    fn render_weekdays(&self, f: &mut Frame, area: Rect) {
        let cell_w = usize::from(area.width / 7);
        let spans: Vec<Span> = WEEKDAY_LABELS
            .iter()
            .map(|label| {
                Span::styled(
                    format!("{label:^cell_w$}"),
                    Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
                )
            })
            .collect();
        let header = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::NONE));
        f.render_widget(header, area);
    }

    fn render_grid(&self, f: &mut Frame, area: Rect) {
        let rh = self.row_height();
        let cell_w = usize::from(area.width / 7);
        if cell_w == 0 || area.height == 0 {
            return;
        }
        let scroll_top = self.viewport.scroll_top;
        let first_row = (scroll_top / rh) as usize;
        let last_row = ((scroll_top + u32::from(area.height)).div_ceil(rh) as usize)
            .min(self.grid.weeks().len());
        let no_markers = HashMap::new();
        let markers = self.markers.as_ref().map_or(&no_markers, |m| &m.colors);
        let selected_month = self.selected_month() as i32;
        let label_style = Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD);

        let mut lines: Vec<Line> = Vec::new();
        for row in first_row..last_row {
            let week = &self.grid.weeks()[row];
            let mut number_spans = Vec::new();
            let mut marker_spans = Vec::new();
            for (col, cell) in week.iter().enumerate() {
                let index = row * 7 + col;
                let style = day_style(
                    index == self.cursor,
                    self.is_today(cell),
                    !cell.is_padding() && cell.month == selected_month,
                    cell.is_padding(),
                );
                let label = if self.grid.starts_month(index) {
                    month_label(cell, cell_w.saturating_sub(3))
                } else {
                    String::new()
                };
                let used = 2 + label.chars().count();
                number_spans.push(Span::styled(format!("{:>2}", cell.day), style));
                number_spans.push(Span::styled(label, label_style));
                number_spans.push(Span::raw(" ".repeat(cell_w.saturating_sub(used))));

                let on_day = EventData::markers_on(markers, cell.kind, cell.month, cell.day);
                let shown = on_day.len().min(cell_w.saturating_sub(1));
                for color in &on_day[..shown] {
                    marker_spans.push(Span::styled("●", Style::default().fg(*color)));
                }
                marker_spans.push(Span::raw(" ".repeat(cell_w - shown)));
            }
            lines.push(Line::from(number_spans));
            lines.push(Line::from(marker_spans));
            for _ in 2..rh {
                lines.push(Line::from(""));
            }
        }

        let offset = (scroll_top - first_row as u32 * rh) as u16;
        f.render_widget(Paragraph::new(lines).scroll((offset, 0)), area);
    }

    fn render_footer(&self, f: &mut Frame, area: Rect) {
        let status = match self.mode {
            Mode::Search => {
                let hits = self.events.search(&self.input_buffer);
                let first = hits
                    .first()
                    .map(|e| format!("  first: {} {}", e.date, e.title))
                    .unwrap_or_default();
                Line::from(format!(
                    "Search: {}_  {} match(es){}",
                    self.input_buffer,
                    hits.len(),
                    first
                ))
            }
            Mode::Normal => match &self.status {
                Some((msg, color)) => Line::from(Span::styled(
                    msg.clone(),
                    Style::default().fg(*color).add_modifier(Modifier::BOLD),
                )),
                None => Line::from(Span::styled(
                    format!("{} event(s)", self.events.events.len()),
                    Style::default().add_modifier(Modifier::DIM),
                )),
            },
        };
        let help = Line::from(Span::styled(
            "←→↑↓ move  PgUp/PgDn scroll  n/p year  m/M month  t today  Space select  Enter events  / search  q quit",
            Style::default().fg(Color::DarkGray),
        ));
        f.render_widget(Paragraph::new(vec![status, help]), area);
    }
}

/// Month name for the first cell of a month, shortened to fit `avail` columns.
fn month_label(cell: &CalendarDay, avail: usize) -> String {
    let month = match cell.kind {
        DayKind::Leading => 11,
        DayKind::Trailing => 0,
        DayKind::InYear => cell.month as u32,
    };
    let name = month_name(month);
    if name.len() <= avail {
        format!(" {name}")
    } else if avail >= 3 {
        format!(" {}", &name[..3])
    } else {
        String::new()
    }
}

/// Style of a day number based on its state.
pub(crate) fn day_style(
    is_cursor: bool,
    is_today: bool,
    in_selected_month: bool,
    is_padding: bool,
) -> Style {
    if is_cursor {
        Style::default()
            .fg(Color::Black)
            .bg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else if is_today {
        Style::default()
            .fg(Color::Black)
            .bg(TODAY_BG)
            .add_modifier(Modifier::BOLD)
    } else if is_padding {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
    } else if in_selected_month {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

// ── App event loop ────────────────────────────────────────────────────────────

pub fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.tick();
        terminal.draw(|f| app.render(f))?;
        if event::poll(StdDuration::from_millis(16))? {
            match event::read()? {
                CEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key.code, key.modifiers) {
                        break;
                    }
                }
                CEvent::Mouse(mouse) => app.handle_mouse(mouse.kind, mouse.column, mouse.row),
                _ => {}
            }
        }
    }
    Ok(())
}
