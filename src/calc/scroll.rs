use crate::calc::viewport::Viewport;
use crate::calc::year_grid::YearGrid;
use tracing::debug;

/// How far down the pane a scroll-to-day target lands: `height / ratio`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollRatios {
    pub standard: f64,
    pub large: f64,
    /// Pane width (columns) from which `large` applies.
    pub large_viewport_width: u16,
}

impl Default for ScrollRatios {
    fn default() -> Self {
        ScrollRatios {
            standard: 2.5,
            large: 3.0,
            large_viewport_width: 200,
        }
    }
}

impl ScrollRatios {
    pub fn for_width(&self, width: u16) -> f64 {
        if width >= self.large_viewport_width {
            self.large
        } else {
            self.standard
        }
    }
}

/// Total content height of `grid` in lines.
pub fn content_height(grid: &YearGrid, row_height: u32) -> u32 {
    grid.weeks().len() as u32 * row_height
}

/// Largest valid `scroll_top` for a pane of `height` lines.
pub fn max_scroll(grid: &YearGrid, row_height: u32, height: u16) -> u32 {
    content_height(grid, row_height).saturating_sub(u32::from(height))
}

/// Scroll position that brings the cell for `(month0, day)` near the middle of
/// the pane. `None` when the year has no such day.
pub fn scroll_target(
    grid: &YearGrid,
    month: u32,
    day: u32,
    row_height: u32,
    viewport: &Viewport,
    ratios: &ScrollRatios,
) -> Option<u32> {
    let index = grid.position(month, day)?;
    Some(index_target(grid, index, row_height, viewport, ratios))
}

/// Scroll position that brings the cell at `index` near the middle of the pane.
pub fn index_target(
    grid: &YearGrid,
    index: usize,
    row_height: u32,
    viewport: &Viewport,
    ratios: &ScrollRatios,
) -> u32 {
    let cell_top = f64::from(YearGrid::row_of(index) as u32 * row_height);
    let ratio = ratios.for_width(viewport.width);
    let target =
        cell_top - f64::from(viewport.height) / ratio + f64::from(row_height) / 2.0;
    let max = f64::from(max_scroll(grid, row_height, viewport.height));
    target.clamp(0.0, max).round() as u32
}

/// Frame-driven smooth scrolling. A new target redirects an animation that is
/// already running.
#[derive(Clone, Debug, PartialEq)]
pub struct SmoothScroll {
    position: f64,
    target: f64,
    smoothing: f64,
}

impl SmoothScroll {
    pub fn new(smoothing: f64) -> Self {
        SmoothScroll {
            position: 0.0,
            target: 0.0,
            smoothing: smoothing.clamp(0.05, 1.0),
        }
    }

    pub fn scroll_to(&mut self, target: u32) {
        debug!(from = self.position(), to = target, "smooth scroll");
        self.target = f64::from(target);
    }

    /// Moves immediately, dropping any running animation.
    pub fn jump_to(&mut self, position: u32) {
        self.position = f64::from(position);
        self.target = self.position;
    }

    pub fn position(&self) -> u32 {
        self.position.max(0.0).round() as u32
    }

    pub fn target(&self) -> u32 {
        self.target.max(0.0).round() as u32
    }

    pub fn is_animating(&self) -> bool {
        self.position != self.target
    }

    /// Advances one frame. Returns false when there was nothing to do.
    pub fn tick(&mut self) -> bool {
        if !self.is_animating() {
            return false;
        }
        let delta = self.target - self.position;
        if delta.abs() <= 1.0 {
            self.position = self.target;
        } else {
            self.position += delta * self.smoothing;
        }
        true
    }

    /// Keeps position and target within `[0, max]` after a resize.
    pub fn clamp_to(&mut self, max: u32) {
        let max = f64::from(max);
        self.position = self.position.clamp(0.0, max);
        self.target = self.target.clamp(0.0, max);
    }
}
