use crate::calc::year_grid::{WEEKDAY_LABELS, month_name};
use crate::calc::{YearGrid, generate};
use anyhow::Result;

pub fn run(year: i32) -> Result<()> {
    let grid = generate(year);
    write_grid(&grid, &mut std::io::stdout())
}

/// Prints the grid one week per line. Padding days are shown in brackets and
/// the first day of each month puts the month name at the end of its line.
pub(crate) fn write_grid<W: std::io::Write>(grid: &YearGrid, out: &mut W) -> Result<()> {
    writeln!(out, "{}", grid.year())?;
    writeln!(out, "---")?;
    let header: Vec<String> = WEEKDAY_LABELS.iter().map(|l| format!("{l:>4}")).collect();
    writeln!(out, "{}", header.join(" "))?;
    for (row, week) in grid.weeks().iter().enumerate() {
        let cells: Vec<String> = week
            .iter()
            .map(|cell| {
                if cell.is_padding() {
                    format!("[{:>2}]", cell.day)
                } else {
                    format!(" {:>2} ", cell.day)
                }
            })
            .collect();
        let label = (0..7)
            .map(|col| row * 7 + col)
            .filter(|&i| grid.starts_month(i))
            .filter_map(|i| grid.get(i))
            .find(|cell| !cell.is_padding())
            .map(|cell| format!("  {}", month_name(cell.month as u32)))
            .unwrap_or_default();
        writeln!(out, "{}{}", cells.join(" "), label)?;
    }
    writeln!(out, "---")?;
    writeln!(
        out,
        "Weeks: {}  Leading padding: {}  Trailing padding: {}",
        grid.weeks().len(),
        grid.leading_padding(),
        grid.trailing_padding()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(year: i32) -> String {
        let mut buf = Vec::new();
        write_grid(&generate(year), &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_grid_2024_starts_monday() {
        let out = render(2024);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "2024");
        assert!(lines[2].starts_with(" Mon"));
        assert!(lines[3].starts_with("  1 "));
        assert!(lines[3].ends_with("January"));
        assert!(out.contains("Weeks: 53  Leading padding: 0  Trailing padding: 5"));
    }

    #[test]
    fn test_write_grid_brackets_padding() {
        let out = render(2025);
        let first_week = out.lines().nth(3).unwrap();
        assert!(first_week.starts_with("[30] [31]   1 "));
        assert!(out.contains("Leading padding: 2"));
    }

    #[test]
    fn test_write_grid_labels_every_month() {
        let out = render(2023);
        for m in 0..12 {
            assert!(out.contains(month_name(m)), "missing {}", month_name(m));
        }
    }
}
