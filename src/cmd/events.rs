use crate::cmd::root::load_events;
use crate::data::{Event, EventData};
use anyhow::Result;
use std::path::Path;

pub fn run(year: Option<i32>, events_file: Option<&Path>) -> Result<()> {
    let data = load_events(events_file)?;
    write_events(&data, year, &mut std::io::stdout())
}

pub(crate) fn write_events<W: std::io::Write>(
    data: &EventData,
    year: Option<i32>,
    out: &mut W,
) -> Result<()> {
    let mut events: Vec<&Event> = data
        .events
        .iter()
        .filter(|e| match year {
            Some(y) => e.ymd().is_some_and(|(ey, _, _)| ey == y),
            None => true,
        })
        .collect();
    events.sort_by(|a, b| (&a.date, &a.hour).cmp(&(&b.date, &b.hour)));

    match year {
        Some(y) => writeln!(out, "Events in {y}")?,
        None => writeln!(out, "Events")?,
    }
    writeln!(out, "---")?;
    writeln!(out, "  {:<12} {:<6} {:<8} {}", "Date", "Time", "Color", "Title")?;
    for e in &events {
        writeln!(out, "  {:<12} {:<6} {:<8} {}", e.date, e.hour, e.color, e.title)?;
    }
    writeln!(out, "---")?;
    writeln!(out, "Total: {} event(s)", events.len())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(date: &str, hour: &str, title: &str) -> Event {
        Event {
            id: title.to_string(),
            title: title.to_string(),
            description: String::new(),
            date: date.to_string(),
            hour: hour.to_string(),
            color: "#3b82f6".to_string(),
        }
    }

    fn render(data: &EventData, year: Option<i32>) -> String {
        let mut buf = Vec::new();
        write_events(data, year, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_events_empty() {
        let out = render(&EventData::default(), None);
        assert!(out.starts_with("Events\n"));
        assert!(out.contains("Total: 0 event(s)"));
    }

    #[test]
    fn test_write_events_sorted_by_date_and_time() {
        let data = EventData {
            events: vec![
                ev("2024-06-01", "", "Later"),
                ev("2024-01-05", "14:00", "Afternoon"),
                ev("2024-01-05", "09:00", "Morning"),
            ],
        };
        let out = render(&data, None);
        let morning = out.find("Morning").unwrap();
        let afternoon = out.find("Afternoon").unwrap();
        let later = out.find("Later").unwrap();
        assert!(morning < afternoon && afternoon < later);
        assert!(out.contains("Total: 3 event(s)"));
    }

    #[test]
    fn test_write_events_filters_by_year() {
        let data = EventData {
            events: vec![
                ev("2023-12-31", "", "Eve"),
                ev("2024-01-01", "", "New Year"),
                ev("bad-date", "", "Broken"),
            ],
        };
        let out = render(&data, Some(2024));
        assert!(out.starts_with("Events in 2024"));
        assert!(out.contains("New Year"));
        assert!(!out.contains("Eve"));
        assert!(!out.contains("Broken"));
        assert!(out.contains("Total: 1 event(s)"));
    }
}
