pub mod scroll;
pub mod viewport;
pub mod year_grid;

pub use scroll::{ScrollRatios, SmoothScroll, index_target, max_scroll, scroll_target};
pub use viewport::{Viewport, ViewportBand, ViewSynchronizer};
pub use year_grid::{CalendarDay, DayKind, GridCache, YearGrid, generate};
