use crate::calc::year_grid::{DayKind, YearGrid};
use crate::data::persistence::Persistable;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

pub const DEFAULT_EVENT_COLOR: &str = "#3b82f6";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, may be empty.
    #[serde(default)]
    pub hour: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    DEFAULT_EVENT_COLOR.to_string()
}

impl Event {
    pub fn new(date: NaiveDate, title: &str, description: &str, hour: &str, color: &str) -> Self {
        Event {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: description.to_string(),
            date: date_key(date),
            hour: hour.to_string(),
            color: color.to_string(),
        }
    }

    /// `(year, month1, day)` parsed from `date`; `None` when malformed.
    pub fn ymd(&self) -> Option<(i32, u32, u32)> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .ok()
            .map(|d| (d.year(), d.month(), d.day()))
    }

    pub fn is_on(&self, year: i32, month: u32, day: u32) -> bool {
        self.ymd() == Some((year, month, day))
    }
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct EventData {
    pub events: Vec<Event>,
}

impl Persistable for EventData {
    fn filename() -> &'static str {
        "events.json"
    }
    fn is_json() -> bool {
        true
    }
}

impl EventData {
    pub fn add(&mut self, event: Event) {
        info!(id = %event.id, date = %event.date, "event added");
        self.events.push(event);
    }

    /// Replaces the event with the same id. Unknown ids are ignored.
    pub fn update(&mut self, event: Event) {
        match self.events.iter_mut().find(|e| e.id == event.id) {
            Some(slot) => {
                info!(id = %event.id, date = %event.date, "event updated");
                *slot = event;
            }
            None => debug!(id = %event.id, "update for unknown event ignored"),
        }
    }

    pub fn delete(&mut self, id: &str) {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);
        if self.events.len() != before {
            info!(id, "event deleted");
        }
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Events on the given date, `month` one-based.
    pub fn on_date(&self, year: i32, month: u32, day: u32) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.is_on(year, month, day))
            .collect()
    }

    /// Events of the grid's year keyed by `(month0, day)`. Padding cells never
    /// get markers, so only in-year dates appear.
    pub fn markers_for(&self, grid: &YearGrid) -> HashMap<(u32, u32), Vec<&Event>> {
        let year = grid.year();
        let mut map: HashMap<(u32, u32), Vec<&Event>> = HashMap::new();
        for event in &self.events {
            if let Some((y, m, d)) = event.ymd() {
                if y == year {
                    map.entry((m - 1, d)).or_default().push(event);
                }
            }
        }
        map
    }

    /// Markers for a single cell, from a map keyed like `markers_for`.
    pub fn markers_on<T>(
        markers: &HashMap<(u32, u32), Vec<T>>,
        kind: DayKind,
        month: i32,
        day: u32,
    ) -> &[T] {
        if kind != DayKind::InYear || month < 0 {
            return &[];
        }
        markers
            .get(&(month as u32, day))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Case-insensitive match on title or description, or a date substring.
    pub fn search(&self, query: &str) -> Vec<&Event> {
        let q = query.to_lowercase();
        let mut found: Vec<&Event> = self
            .events
            .iter()
            .filter(|e| {
                e.title.to_lowercase().contains(&q)
                    || e.description.to_lowercase().contains(&q)
                    || e.date.contains(query)
            })
            .collect();
        found.sort_by(|a, b| (&a.date, &a.hour).cmp(&(&b.date, &b.hour)));
        found
    }
}
