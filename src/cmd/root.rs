use crate::data::{AppSettings, EventData, Persistable};
use crate::ui::calendar_view::{App, run_app};
use crate::ui::{restore_terminal, setup_terminal};
use anyhow::Result;
use chrono::{Datelike, Local};
use std::path::Path;
use tracing::info;

pub fn run(year: Option<i32>, events_file: Option<&Path>) -> Result<()> {
    let settings = AppSettings::load()?;
    let events = load_events(events_file)?;
    let today = Local::now().date_naive();
    let year = year.unwrap_or(today.year());
    info!(year, events = events.events.len(), "starting calendar");

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::event::DisableMouseCapture
        );
        original_hook(info);
    }));

    let mut terminal = setup_terminal()?;

    let mut app = App::new(events, settings, today, year);
    app.set_on_day_click(Box::new(|click| info!(%click, "day clicked")));

    let result = run_app(&mut terminal, &mut app);

    app.unmount();
    restore_terminal(&mut terminal)?;

    // Events are a session-only seed; nothing is written back.
    result
}

/// Events from `--events`, or `events.json` in the config directory.
pub(crate) fn load_events(events_file: Option<&Path>) -> Result<EventData> {
    match events_file {
        Some(path) => EventData::load_path(path),
        None => EventData::load(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_events_from_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("seed.json");
        fs::write(
            &path,
            r##"{"events":[{"id":"1","title":"Launch","date":"2024-05-02"}]}"##,
        )
        .unwrap();
        let data = load_events(Some(&path)).unwrap();
        assert_eq!(data.events.len(), 1);
        assert_eq!(data.events[0].title, "Launch");
        assert_eq!(data.events[0].color, "#3b82f6");
    }

    #[test]
    fn test_load_events_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let data = load_events(Some(&tmp.path().join("none.json"))).unwrap();
        assert!(data.events.is_empty());
    }

    #[test]
    fn test_load_events_bad_json_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let err = load_events(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("failed to parse JSON"));
    }
}
