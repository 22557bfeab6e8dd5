use crate::calc::year_grid::YearGrid;
use tracing::{debug, trace};

/// Visible window of the grid pane, in content lines and terminal cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub scroll_top: u32,
    pub height: u16,
    pub width: u16,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            scroll_top: 0,
            height: 24,
            width: 80,
        }
    }
}

/// Margins cut from the top and bottom of the pane, as fractions of its height.
/// What remains is the band a sentinel has to touch to count as "current".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportBand {
    pub top_margin: f64,
    pub bottom_margin: f64,
}

impl Default for ViewportBand {
    fn default() -> Self {
        ViewportBand {
            top_margin: 0.75,
            bottom_margin: 0.25,
        }
    }
}

impl ViewportBand {
    /// Band bounds in content lines for the given viewport.
    pub fn bounds(&self, viewport: &Viewport) -> (f64, f64) {
        let top = f64::from(viewport.scroll_top);
        let h = f64::from(viewport.height);
        let start = top + h * self.top_margin;
        let end = top + h * (1.0 - self.bottom_margin);
        (start, end.max(start))
    }
}

/// A month's 15th as laid out in the pane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sentinel {
    pub month: u32,
    pub top: u32,
    pub height: u32,
}

impl Sentinel {
    fn intersects(&self, band: (f64, f64)) -> bool {
        let top = f64::from(self.top);
        let bottom = f64::from(self.top + self.height);
        top <= band.1 && bottom >= band.0
    }

    /// Lines between this sentinel and the band; zero when they touch.
    fn distance(&self, band: (f64, f64)) -> f64 {
        let top = f64::from(self.top);
        let bottom = f64::from(self.top + self.height);
        if bottom < band.0 {
            band.0 - bottom
        } else if top > band.1 {
            top - band.1
        } else {
            0.0
        }
    }
}

#[derive(Debug, PartialEq)]
enum SyncState {
    Idle,
    Observing {
        sentinels: Vec<Sentinel>,
        inside: Vec<bool>,
        /// Band at the previous poll or settle.
        last_band: Option<(f64, f64)>,
    },
}

/// Keeps the "current month" in step with what is scrolled into view.
///
/// Visibility is polled from the scroll position rather than pushed by the
/// host; only sentinels that newly enter the band report their month.
pub struct ViewSynchronizer {
    state: SyncState,
    band: ViewportBand,
    current_month: u32,
}

impl ViewSynchronizer {
    pub fn new(band: ViewportBand, current_month: u32) -> Self {
        ViewSynchronizer {
            state: SyncState::Idle,
            band,
            current_month,
        }
    }

    /// Registers the sentinels of `grid`. Replaces any previous registration.
    pub fn observe(&mut self, grid: &YearGrid, row_height: u32) {
        let sentinels: Vec<Sentinel> = grid
            .sentinel_rows()
            .into_iter()
            .map(|(month, row)| Sentinel {
                month,
                top: row as u32 * row_height,
                height: row_height,
            })
            .collect();
        debug!(year = grid.year(), count = sentinels.len(), "observing month sentinels");
        let inside = vec![false; sentinels.len()];
        self.state = SyncState::Observing {
            sentinels,
            inside,
            last_band: None,
        };
    }

    /// Releases all sentinels.
    pub fn disconnect(&mut self) {
        if self.is_observing() {
            debug!("sentinel observer disconnected");
        }
        self.state = SyncState::Idle;
    }

    pub fn is_observing(&self) -> bool {
        matches!(self.state, SyncState::Observing { .. })
    }

    pub fn current_month(&self) -> u32 {
        self.current_month
    }

    pub fn set_current_month(&mut self, month: u32) {
        self.current_month = month.min(11);
    }

    /// Records which sentinels are inside the band without reporting any.
    /// Used while a programmatic scroll is moving the pane.
    pub fn settle(&mut self, viewport: &Viewport) {
        if let SyncState::Observing {
            sentinels,
            inside,
            last_band,
        } = &mut self.state
        {
            let band = self.band.bounds(viewport);
            for (sentinel, flag) in sentinels.iter().zip(inside.iter_mut()) {
                *flag = sentinel.intersects(band);
            }
            *last_band = Some(band);
        }
    }

    /// Checks sentinel visibility against `viewport`. Each sentinel entering
    /// the band sets the current month, later ones overriding earlier ones.
    /// Sentinels the band swept over since the last poll count as entering,
    /// the one crossed last (nearest the band now) winning.
    /// Returns the new month when it changed.
    pub fn poll(&mut self, viewport: &Viewport) -> Option<u32> {
        let SyncState::Observing {
            sentinels,
            inside,
            last_band,
        } = &mut self.state
        else {
            return None;
        };
        let band = self.band.bounds(viewport);
        let swept = match *last_band {
            Some(prev) => (prev.0.min(band.0), prev.1.max(band.1)),
            None => band,
        };
        *last_band = Some(band);

        let mut entered: Option<(u32, f64)> = None;
        for (sentinel, was_inside) in sentinels.iter().zip(inside.iter_mut()) {
            if !*was_inside && sentinel.intersects(swept) {
                trace!(month = sentinel.month, "sentinel entered band");
                let distance = sentinel.distance(band);
                if entered.is_none_or(|(_, best)| distance <= best) {
                    entered = Some((sentinel.month, distance));
                }
            }
            *was_inside = sentinel.intersects(band);
        }
        match entered.map(|(month, _)| month) {
            Some(month) if month != self.current_month => {
                self.current_month = month;
                Some(month)
            }
            _ => None,
        }
    }
}
