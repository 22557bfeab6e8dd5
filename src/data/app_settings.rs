use crate::calc::{ScrollRatios, ViewportBand};
use crate::data::event::DEFAULT_EVENT_COLOR;
use crate::data::persistence::Persistable;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Lines per week row in the grid pane.
    pub row_height: u16,
    /// Pane width (columns) from which the large centering ratio applies.
    pub large_viewport_width: u16,
    pub standard_center_ratio: f64,
    pub large_center_ratio: f64,
    pub band_top_margin: f64,
    pub band_bottom_margin: f64,
    /// Fraction of the remaining distance covered per frame.
    pub scroll_smoothing: f64,
    pub default_event_color: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            row_height: 3,
            large_viewport_width: 200,
            standard_center_ratio: 2.5,
            large_center_ratio: 3.0,
            band_top_margin: 0.75,
            band_bottom_margin: 0.25,
            scroll_smoothing: 0.35,
            default_event_color: DEFAULT_EVENT_COLOR.to_string(),
        }
    }
}

/// Wrapper that reads the `settings` key from config.yaml.
#[derive(Serialize, Deserialize, Default, Debug)]
struct SettingsWrapper {
    #[serde(default)]
    settings: AppSettings,
}

impl Persistable for SettingsWrapper {
    fn filename() -> &'static str {
        "config.yaml"
    }
    fn is_json() -> bool {
        false
    }
}

impl AppSettings {
    pub fn load() -> Result<Self> {
        Ok(SettingsWrapper::load()?.settings.sanitized())
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        Ok(SettingsWrapper::load_from(dir)?.settings.sanitized())
    }

    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        let wrapper = SettingsWrapper {
            settings: self.clone(),
        };
        wrapper.save_to(dir)
    }

    /// Replaces out-of-range values with usable ones.
    pub fn sanitized(mut self) -> Self {
        let defaults = AppSettings::default();
        if self.row_height < 2 {
            warn!(row_height = self.row_height, "row_height below 2, using 2");
            self.row_height = 2;
        }
        if self.standard_center_ratio.is_nan() || self.standard_center_ratio <= 1.0 {
            self.standard_center_ratio = defaults.standard_center_ratio;
        }
        if self.large_center_ratio.is_nan() || self.large_center_ratio <= 1.0 {
            self.large_center_ratio = defaults.large_center_ratio;
        }
        self.band_top_margin = clamp_unit(self.band_top_margin, defaults.band_top_margin);
        self.band_bottom_margin =
            clamp_unit(self.band_bottom_margin, defaults.band_bottom_margin);
        if self.band_top_margin + self.band_bottom_margin > 1.0 {
            warn!(
                top = self.band_top_margin,
                bottom = self.band_bottom_margin,
                "viewport band margins overlap, using defaults"
            );
            self.band_top_margin = defaults.band_top_margin;
            self.band_bottom_margin = defaults.band_bottom_margin;
        }
        if self.scroll_smoothing.is_nan() || self.scroll_smoothing <= 0.0 || self.scroll_smoothing > 1.0 {
            self.scroll_smoothing = defaults.scroll_smoothing;
        }
        if self.default_event_color.trim().is_empty() {
            self.default_event_color = defaults.default_event_color;
        }
        self
    }

    pub fn band(&self) -> ViewportBand {
        ViewportBand {
            top_margin: self.band_top_margin,
            bottom_margin: self.band_bottom_margin,
        }
    }

    pub fn ratios(&self) -> ScrollRatios {
        ScrollRatios {
            standard: self.standard_center_ratio,
            large: self.large_center_ratio,
            large_viewport_width: self.large_viewport_width,
        }
    }
}

fn clamp_unit(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_settings_default_values() {
        let settings = AppSettings::default();
        assert_eq!(settings.row_height, 3);
        assert_eq!(settings.band(), ViewportBand::default());
        assert_eq!(settings.ratios(), ScrollRatios::default());
        assert_eq!(settings.default_event_color, "#3b82f6");
    }

    #[test]
    fn test_settings_wrapper_missing_key_uses_default() {
        let wrapper: SettingsWrapper = serde_norway::from_str("other: 1").unwrap();
        assert_eq!(wrapper.settings, AppSettings::default());
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let yaml = "settings:\n  row_height: 4\n";
        let wrapper: SettingsWrapper = serde_norway::from_str(yaml).unwrap();
        assert_eq!(wrapper.settings.row_height, 4);
        assert_eq!(wrapper.settings.large_viewport_width, 200);
    }

    #[test]
    fn test_sanitize_fixes_bad_values() {
        let settings = AppSettings {
            row_height: 0,
            standard_center_ratio: 0.5,
            large_center_ratio: f64::NAN,
            band_top_margin: 0.9,
            band_bottom_margin: 0.5,
            scroll_smoothing: 4.0,
            default_event_color: " ".to_string(),
            ..AppSettings::default()
        }
        .sanitized();
        assert_eq!(settings.row_height, 2);
        assert_eq!(settings.standard_center_ratio, 2.5);
        assert_eq!(settings.large_center_ratio, 3.0);
        assert_eq!(settings.band(), ViewportBand::default());
        assert_eq!(settings.scroll_smoothing, 0.35);
        assert_eq!(settings.default_event_color, "#3b82f6");
    }

    #[test]
    fn test_save_to_and_load_from() {
        let tmp = TempDir::new().unwrap();
        let settings = AppSettings {
            row_height: 5,
            large_viewport_width: 160,
            ..AppSettings::default()
        };
        let path = settings.save_to(tmp.path()).unwrap();
        assert!(path.ends_with("config.yaml"));
        assert_eq!(AppSettings::load_from(tmp.path()).unwrap(), settings);
    }

    #[test]
    fn test_load_from_missing_dir_is_default() {
        let tmp = TempDir::new().unwrap();
        let loaded = AppSettings::load_from(&tmp.path().join("nope")).unwrap();
        assert_eq!(loaded, AppSettings::default());
    }
}
