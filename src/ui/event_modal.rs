use crate::data::event::{Event, date_key};
use crate::ui::{centered_rect, hex_color};
use chrono::{NaiveDate, NaiveTime};
use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Color,
    Hour,
}

impl Field {
    const ALL: [Field; 4] = [Field::Title, Field::Description, Field::Color, Field::Hour];

    fn next(self) -> Self {
        match self {
            Field::Title => Field::Description,
            Field::Description => Field::Color,
            Field::Color => Field::Hour,
            Field::Hour => Field::Title,
        }
    }

    fn prev(self) -> Self {
        match self {
            Field::Title => Field::Hour,
            Field::Description => Field::Title,
            Field::Color => Field::Description,
            Field::Hour => Field::Color,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Description => "Description",
            Field::Color => "Color",
            Field::Hour => "Time",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalMode {
    Browsing,
    Adding,
    Editing(String),
    ConfirmDelete(String),
}

/// What the dialog asks its owner to do with the event list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalAction {
    Add(Event),
    Update(Event),
    Delete(String),
    Close,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct EventForm {
    title: String,
    description: String,
    color: String,
    hour: String,
    focus: Field,
    error: Option<String>,
}

impl EventForm {
    fn blank(color: &str) -> Self {
        EventForm {
            title: String::new(),
            description: String::new(),
            color: color.to_string(),
            hour: String::new(),
            focus: Field::Title,
            error: None,
        }
    }

    fn from_event(event: &Event) -> Self {
        EventForm {
            title: event.title.clone(),
            description: event.description.clone(),
            color: event.color.clone(),
            hour: event.hour.clone(),
            focus: Field::Title,
            error: None,
        }
    }

    fn value(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Description => &self.description,
            Field::Color => &self.color,
            Field::Hour => &self.hour,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Title => &mut self.title,
            Field::Description => &mut self.description,
            Field::Color => &mut self.color,
            Field::Hour => &mut self.hour,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        if hex_color(&self.color).is_none() {
            return Err(format!("Color must look like #3b82f6, got '{}'", self.color));
        }
        let hour = self.hour.trim();
        if !hour.is_empty() && NaiveTime::parse_from_str(hour, "%H:%M").is_err() {
            return Err(format!("Time must be HH:MM, got '{hour}'"));
        }
        Ok(())
    }
}

/// Dialog listing the events of one date, with add/edit/delete.
pub struct EventModal {
    date: NaiveDate,
    mode: ModalMode,
    form: EventForm,
    cursor: usize,
    default_color: String,
}

impl EventModal {
    pub fn new(date: NaiveDate, default_color: &str) -> Self {
        EventModal {
            date,
            mode: ModalMode::Browsing,
            form: EventForm::blank(default_color),
            cursor: 0,
            default_color: default_color.to_string(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn mode(&self) -> &ModalMode {
        &self.mode
    }

    pub fn start_adding(&mut self) {
        self.form = EventForm::blank(&self.default_color);
        self.mode = ModalMode::Adding;
    }

    fn start_editing(&mut self, event: &Event) {
        self.form = EventForm::from_event(event);
        self.mode = ModalMode::Editing(event.id.clone());
    }

    fn back_to_list(&mut self) {
        self.form = EventForm::blank(&self.default_color);
        self.mode = ModalMode::Browsing;
    }

    /// Handles a key while the dialog is open. `events` are the events on
    /// this dialog's date, in display order.
    pub fn handle_key(&mut self, code: KeyCode, events: &[&Event]) -> Option<ModalAction> {
        if !events.is_empty() && self.cursor >= events.len() {
            self.cursor = events.len() - 1;
        }
        match self.mode.clone() {
            ModalMode::Browsing => match code {
                KeyCode::Esc | KeyCode::Char('q') => Some(ModalAction::Close),
                KeyCode::Up => {
                    self.cursor = self.cursor.saturating_sub(1);
                    None
                }
                KeyCode::Down => {
                    if self.cursor + 1 < events.len() {
                        self.cursor += 1;
                    }
                    None
                }
                KeyCode::Char('a') => {
                    self.start_adding();
                    None
                }
                KeyCode::Char('e') | KeyCode::Enter => {
                    if let Some(event) = events.get(self.cursor) {
                        self.start_editing(event);
                    }
                    None
                }
                KeyCode::Char('d') | KeyCode::Delete => {
                    if let Some(event) = events.get(self.cursor) {
                        self.mode = ModalMode::ConfirmDelete(event.id.clone());
                    }
                    None
                }
                _ => None,
            },

            ModalMode::ConfirmDelete(id) => {
                self.mode = ModalMode::Browsing;
                match code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => {
                        if self.cursor > 0 && self.cursor + 1 >= events.len() {
                            self.cursor -= 1;
                        }
                        Some(ModalAction::Delete(id))
                    }
                    _ => {
                        debug!(id, "delete cancelled");
                        None
                    }
                }
            }

            ModalMode::Adding | ModalMode::Editing(_) => match code {
                KeyCode::Esc => {
                    self.back_to_list();
                    None
                }
                KeyCode::Tab => {
                    self.form.focus = self.form.focus.next();
                    None
                }
                KeyCode::BackTab => {
                    self.form.focus = self.form.focus.prev();
                    None
                }
                KeyCode::Backspace => {
                    self.form.focused_mut().pop();
                    None
                }
                KeyCode::Char(c) => {
                    self.form.focused_mut().push(c);
                    None
                }
                KeyCode::Enter => self.submit(),
                _ => None,
            },
        }
    }

    fn submit(&mut self) -> Option<ModalAction> {
        if let Err(msg) = self.form.validate() {
            self.form.error = Some(msg);
            return None;
        }
        let title = self.form.title.trim();
        let hour = self.form.hour.trim();
        let action = match &self.mode {
            ModalMode::Adding => ModalAction::Add(Event::new(
                self.date,
                title,
                &self.form.description,
                hour,
                &self.form.color,
            )),
            ModalMode::Editing(id) => ModalAction::Update(Event {
                id: id.clone(),
                title: title.to_string(),
                description: self.form.description.clone(),
                date: date_key(self.date),
                hour: hour.to_string(),
                color: self.form.color.clone(),
            }),
            _ => return None,
        };
        self.back_to_list();
        Some(action)
    }

    pub fn render(&self, f: &mut Frame, area: Rect, events: &[&Event]) {
        let popup = centered_rect(70, 70, area);
        f.render_widget(Clear, popup);

        let title = format!(" {} ", self.date.format("%A, %B %-d, %Y"));
        let mut lines: Vec<Line> = Vec::new();

        if events.is_empty() {
            lines.push(Line::from(Span::styled(
                "No events for this day.",
                Style::default().add_modifier(Modifier::DIM),
            )));
        }
        for (i, e) in events.iter().enumerate() {
            let selected = i == self.cursor && self.mode == ModalMode::Browsing;
            let prefix = if selected { "> " } else { "  " };
            let color = hex_color(&e.color).unwrap_or(Color::Blue);
            let mut spans = vec![
                Span::raw(prefix),
                Span::styled("● ", Style::default().fg(color)),
            ];
            if !e.hour.is_empty() {
                spans.push(Span::styled(
                    format!("{} ", e.hour),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            let title_style = if selected {
                Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            spans.push(Span::styled(e.title.clone(), title_style));
            if !e.description.is_empty() {
                spans.push(Span::raw(format!(" - {}", e.description)));
            }
            lines.push(Line::from(spans));
        }
        lines.push(Line::from(""));

        match &self.mode {
            ModalMode::Browsing => {
                lines.push(Line::from(Span::styled(
                    "a add   e/Enter edit   d delete   ↑↓ select   Esc close",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            ModalMode::ConfirmDelete(id) => {
                let name = events
                    .iter()
                    .find(|e| &e.id == id)
                    .map(|e| e.title.as_str())
                    .unwrap_or("this event");
                lines.push(Line::from(Span::styled(
                    format!("Are you sure you want to delete \"{name}\"?  y = yes, any other key = no"),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )));
            }
            ModalMode::Adding | ModalMode::Editing(_) => {
                let heading = if self.mode == ModalMode::Adding {
                    "New event"
                } else {
                    "Edit event"
                };
                lines.push(Line::from(Span::styled(
                    heading,
                    Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                )));
                for field in Field::ALL {
                    let focused = field == self.form.focus;
                    let value = self.form.value(field);
                    let cursor = if focused { "_" } else { "" };
                    let mut spans = vec![Span::styled(
                        format!("{:<12}", field.label()),
                        if focused {
                            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
                        } else {
                            Style::default()
                        },
                    )];
                    spans.push(Span::raw(format!("{value}{cursor}")));
                    if field == Field::Color {
                        if let Some(c) = hex_color(value) {
                            spans.push(Span::styled("  ■", Style::default().fg(c)));
                        }
                    }
                    lines.push(Line::from(spans));
                }
                if let Some(err) = &self.form.error {
                    lines.push(Line::from(Span::styled(
                        err.clone(),
                        Style::default().fg(Color::Red),
                    )));
                }
                let submit = if self.mode == ModalMode::Adding {
                    "Create Event"
                } else {
                    "Update Event"
                };
                lines.push(Line::from(Span::styled(
                    format!("Tab next field   Enter {submit}   Esc cancel"),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }

        let widget = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(widget, popup);
    }
}
