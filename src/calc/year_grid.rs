use std::rc::Rc;
use tracing::debug;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// The day of the month used as the "this month is in view" proxy.
pub const SENTINEL_DAY: u32 = 15;

/// Which year a grid cell belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DayKind {
    /// Tail of December of the previous year.
    Leading,
    InYear,
    /// Head of January of the next year.
    Trailing,
}

/// One cell of the year grid.
///
/// `month` is zero-based. Leading padding carries `-1`, trailing padding
/// carries `0`; `kind` tells trailing January apart from the real one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CalendarDay {
    pub month: i32,
    pub day: u32,
    pub kind: DayKind,
}

impl CalendarDay {
    fn in_year(month: u32, day: u32) -> Self {
        CalendarDay {
            month: month as i32,
            day,
            kind: DayKind::InYear,
        }
    }

    pub fn is_padding(&self) -> bool {
        self.kind != DayKind::InYear
    }

    /// Returns `(day, month0, year)` for the real calendar date this cell shows
    /// when the grid is rendered for `year`.
    pub fn normalized(&self, year: i32) -> (u32, u32, i32) {
        match self.kind {
            DayKind::Leading => (self.day, 11, year.saturating_sub(1)),
            DayKind::Trailing => (self.day, 0, year.saturating_add(1)),
            DayKind::InYear => (self.day, self.month as u32, year),
        }
    }
}

pub type WeekRow = [CalendarDay; 7];

/// Every day of one year laid out Monday..Sunday, padded to whole weeks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct YearGrid {
    year: i32,
    weeks: Vec<WeekRow>,
}

impl YearGrid {
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn weeks(&self) -> &[WeekRow] {
        &self.weeks
    }

    /// Flattened cells in calendar order.
    pub fn days(&self) -> impl Iterator<Item = &CalendarDay> + '_ {
        self.weeks.iter().flat_map(|w| w.iter())
    }

    pub fn len(&self) -> usize {
        self.weeks.len() * 7
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CalendarDay> {
        self.weeks.get(index / 7).map(|w| &w[index % 7])
    }

    pub fn leading_padding(&self) -> usize {
        self.days().take_while(|d| d.kind == DayKind::Leading).count()
    }

    pub fn trailing_padding(&self) -> usize {
        self.days().filter(|d| d.kind == DayKind::Trailing).count()
    }

    /// Index of the in-year cell showing `(month0, day)`, if the year has one.
    pub fn position(&self, month: u32, day: u32) -> Option<usize> {
        self.days()
            .position(|d| d.kind == DayKind::InYear && d.month == month as i32 && d.day == day)
    }

    pub fn row_of(index: usize) -> usize {
        index / 7
    }

    /// True for the first cell of the grid and wherever the month changes.
    pub fn starts_month(&self, index: usize) -> bool {
        if index == 0 {
            return true;
        }
        match (self.get(index - 1), self.get(index)) {
            (Some(prev), Some(cur)) => prev.month != cur.month,
            _ => false,
        }
    }

    /// `(month0, row)` of each month's sentinel day, in month order.
    pub fn sentinel_rows(&self) -> Vec<(u32, usize)> {
        (0..12u32)
            .filter_map(|m| self.position(m, SENTINEL_DAY).map(|i| (m, Self::row_of(i))))
            .collect()
    }
}

/// Gregorian leap-year rule.
pub fn is_leap_year(year: i32) -> bool {
    year.rem_euclid(4) == 0 && (year.rem_euclid(100) != 0 || year.rem_euclid(400) == 0)
}

/// Length of the zero-based `month` of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 if is_leap_year(year) => 29,
        1 => 28,
        3 | 5 | 8 | 10 => 30,
        _ => 31,
    }
}

/// Weekday of January 1 with Monday = 0 .. Sunday = 6.
///
/// Gauss's closed form over the proleptic Gregorian calendar, so any `i32`
/// year works without a date library's range limits.
pub fn weekday_of_jan1(year: i32) -> u32 {
    let y = i64::from(year) - 1;
    let sunday_based =
        (1 + 5 * y.rem_euclid(4) + 4 * y.rem_euclid(100) + 6 * y.rem_euclid(400)).rem_euclid(7);
    ((sunday_based + 6) % 7) as u32
}

/// Builds the padded week grid for `year`.
pub fn generate(year: i32) -> YearGrid {
    let lead = weekday_of_jan1(year);
    let mut days: Vec<CalendarDay> = Vec::with_capacity(378);

    // December has 31 days, so the tail of the previous year ends at 31.
    for i in 0..lead {
        days.push(CalendarDay {
            month: -1,
            day: 32 - lead + i,
            kind: DayKind::Leading,
        });
    }

    for month in 0..12 {
        for day in 1..=days_in_month(year, month) {
            days.push(CalendarDay::in_year(month, day));
        }
    }

    let rem = days.len() % 7;
    if rem > 0 {
        for day in 1..=(7 - rem) as u32 {
            days.push(CalendarDay {
                month: 0,
                day,
                kind: DayKind::Trailing,
            });
        }
    }

    let weeks: Vec<WeekRow> = days
        .chunks_exact(7)
        .filter_map(|chunk| <WeekRow>::try_from(chunk).ok())
        .collect();

    debug!(year, rows = weeks.len(), lead, "generated year grid");
    YearGrid { year, weeks }
}

/// Keeps the last generated grid and only regenerates when the year changes.
#[derive(Default)]
pub struct GridCache {
    grid: Option<Rc<YearGrid>>,
}

impl GridCache {
    pub fn get(&mut self, year: i32) -> Rc<YearGrid> {
        match &self.grid {
            Some(grid) if grid.year() == year => Rc::clone(grid),
            _ => {
                let grid = Rc::new(generate(year));
                self.grid = Some(Rc::clone(&grid));
                grid
            }
        }
    }
}

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES.get(month as usize).copied().unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn flat(grid: &YearGrid) -> Vec<CalendarDay> {
        grid.days().copied().collect()
    }

    #[test]
    fn test_leap_year_rule() {
        assert!(is_leap_year(2024));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
        assert!(is_leap_year(-4));
        assert!(is_leap_year(0));
    }

    #[test]
    fn test_days_in_month_february() {
        assert_eq!(days_in_month(2024, 1), 29);
        assert_eq!(days_in_month(2023, 1), 28);
        assert_eq!(days_in_month(2023, 3), 30);
        assert_eq!(days_in_month(2023, 11), 31);
    }

    #[test]
    fn test_weekday_of_jan1_matches_chrono() {
        for year in 1583..2600 {
            let expected = NaiveDate::from_ymd_opt(year, 1, 1)
                .unwrap()
                .weekday()
                .num_days_from_monday();
            assert_eq!(weekday_of_jan1(year), expected, "year {year}");
        }
    }

    #[test]
    fn test_2024_layout() {
        // Jan 1 2024 is a Monday and the year has 366 days.
        let grid = generate(2024);
        assert_eq!(grid.leading_padding(), 0);
        assert_eq!(grid.trailing_padding(), 5);
        assert_eq!(grid.len(), 371);
        assert_eq!(grid.weeks().len(), 53);
        assert!(grid.position(1, 29).is_some());
    }

    #[test]
    fn test_2023_has_no_feb_29() {
        let grid = generate(2023);
        assert!(grid.position(1, 29).is_none());
        assert!(grid.position(1, 28).is_some());
    }

    #[test]
    fn test_leading_padding_counts_down_to_dec_31() {
        // Jan 1 2025 is a Wednesday.
        let grid = generate(2025);
        let days = flat(&grid);
        assert_eq!(grid.leading_padding(), 2);
        assert_eq!(days[0], CalendarDay { month: -1, day: 30, kind: DayKind::Leading });
        assert_eq!(days[1], CalendarDay { month: -1, day: 31, kind: DayKind::Leading });
        assert_eq!(days[2], CalendarDay::in_year(0, 1));
    }

    #[test]
    fn test_sunday_start_pads_six_days() {
        // Jan 1 2023 is a Sunday.
        let grid = generate(2023);
        let days = flat(&grid);
        assert_eq!(grid.leading_padding(), 6);
        let numbers: Vec<u32> = days[..6].iter().map(|d| d.day).collect();
        assert_eq!(numbers, vec![26, 27, 28, 29, 30, 31]);
    }

    #[test]
    fn test_every_date_once_in_order_across_years() {
        for year in (1890..2110).chain([-400, -1, 0, 1, 9999]) {
            let grid = generate(year);
            assert_eq!(grid.len() % 7, 0, "year {year}");
            let in_year: Vec<(i32, u32)> = grid
                .days()
                .filter(|d| d.kind == DayKind::InYear)
                .map(|d| (d.month, d.day))
                .collect();
            let expected: Vec<(i32, u32)> = (0..12u32)
                .flat_map(|m| (1..=days_in_month(year, m)).map(move |d| (m as i32, d)))
                .collect();
            assert_eq!(in_year, expected, "year {year}");
        }
    }

    #[test]
    fn test_padding_matches_formula_and_is_contiguous() {
        for year in 1990..2040 {
            let grid = generate(year);
            let days = flat(&grid);
            let lead = weekday_of_jan1(year) as usize;
            let total_days = if is_leap_year(year) { 366 } else { 365 };
            assert_eq!(grid.leading_padding(), lead);
            assert_eq!(grid.trailing_padding(), (7 - (lead + total_days) % 7) % 7);
            assert!(grid.leading_padding() <= 6 && grid.trailing_padding() <= 6);

            let first_in = days.iter().position(|d| !d.is_padding()).unwrap();
            let last_in = days.iter().rposition(|d| !d.is_padding()).unwrap();
            assert!(days[first_in..=last_in].iter().all(|d| !d.is_padding()));
            assert!(days[last_in + 1..].iter().all(|d| d.kind == DayKind::Trailing && d.month == 0));
        }
    }

    #[test]
    fn test_trailing_padding_numbered_from_one() {
        let grid = generate(2024);
        let tail: Vec<u32> = grid.days().filter(|d| d.kind == DayKind::Trailing).map(|d| d.day).collect();
        assert_eq!(tail, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_position_ignores_trailing_january() {
        let grid = generate(2024);
        assert_eq!(grid.position(0, 1), Some(0));
        assert_eq!(grid.position(12, 1), None);
        assert_eq!(grid.position(3, 31), None);
    }

    #[test]
    fn test_normalized_padding_dates() {
        let lead = CalendarDay { month: -1, day: 31, kind: DayKind::Leading };
        let trail = CalendarDay { month: 0, day: 2, kind: DayKind::Trailing };
        assert_eq!(lead.normalized(2025), (31, 11, 2024));
        assert_eq!(trail.normalized(2025), (2, 0, 2026));
        assert_eq!(CalendarDay::in_year(4, 9).normalized(2025), (9, 4, 2025));
    }

    #[test]
    fn test_starts_month_marks_boundaries() {
        let grid = generate(2025);
        assert!(grid.starts_month(0));
        assert!(!grid.starts_month(1));
        assert!(grid.starts_month(2)); // Jan 1 after two leading days
        let feb1 = grid.position(1, 1).unwrap();
        assert!(grid.starts_month(feb1));
        assert!(!grid.starts_month(feb1 + 1));
    }

    #[test]
    fn test_sentinel_rows_one_per_month() {
        let grid = generate(2024);
        let rows = grid.sentinel_rows();
        assert_eq!(rows.len(), 12);
        // Jan 15 2024 is in the third week.
        assert_eq!(rows[0], (0, 2));
        assert!(rows.windows(2).all(|w| w[0].1 < w[1].1));
    }

    #[test]
    fn test_grid_cache_reuses_same_year() {
        let mut cache = GridCache::default();
        let a = cache.get(2024);
        let b = cache.get(2024);
        assert!(Rc::ptr_eq(&a, &b));
        let c = cache.get(2025);
        assert_eq!(c.year(), 2025);
        assert!(!Rc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_month_name_bounds() {
        assert_eq!(month_name(0), "January");
        assert_eq!(month_name(11), "December");
        assert_eq!(month_name(12), "Unknown");
    }
}
