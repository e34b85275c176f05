// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canvas configuration.
//!
//! Settings are plain data with serde defaults, so a RON file only needs to
//! name the fields it changes:
//!
//! ```ron
//! (
//!     link_render_mode: Straight,
//!     always_snap_to_grid: true,
//! )
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How link paths are routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinkRenderMode {
    /// Cubic bezier curves
    #[default]
    Spline,
    /// Short stubs joined by a straight line
    Linear,
    /// Orthogonal elbows
    Straight,
    /// Links are not drawn or hoverable
    Hidden,
}

impl LinkRenderMode {
    /// Parse a mode name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "spline" | "curved" => Some(Self::Spline),
            "linear" => Some(Self::Linear),
            "straight" | "orthogonal" => Some(Self::Straight),
            "hidden" => Some(Self::Hidden),
            _ => None,
        }
    }
}

/// Marker drawn at the centre of each link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinkMarkerShape {
    /// No marker
    None,
    /// Filled circle
    #[default]
    Circle,
    /// Arrow pointing along the link
    Arrow,
}

/// What releasing a new link over empty canvas does when the host does not
/// handle the release itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinkReleaseAction {
    /// Ask the host to show the link release context menu
    #[default]
    ContextMenu,
    /// Ask the host to open the node search box
    SearchBox,
    /// Drop the link silently
    Nothing,
}

/// Canvas settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    /// Link routing mode
    pub link_render_mode: LinkRenderMode,
    /// Marker at link centres
    pub link_marker: LinkMarkerShape,
    /// Bezier control offset as a fraction of anchor distance
    pub spline_offset_factor: f32,
    /// Link stroke width
    pub connections_width: f32,

    /// Movement (px) after which a press turns into a drag
    pub max_click_drift: f32,
    /// Hold time (ms) after which a press turns into a drag
    pub buffer_time_ms: u64,
    /// Max gap (ms) between clicks of a double click
    pub double_click_time_ms: u64,
    /// Max distance (px) between clicks of a double click
    pub double_click_drift: f32,

    /// Grid pitch for snapping
    pub grid_size: f32,
    /// Snap on every drop, not only with shift held
    pub always_snap_to_grid: bool,

    /// Clicking a connected input removes its link
    pub click_do_break_link_to: bool,
    /// Dragging from a connected input moves its link
    pub allow_reconnect_links: bool,
    /// Disallow every mutation; presses pan
    pub read_only: bool,
    /// Keep a reference count per highlighted link
    pub refcount_highlighted_links: bool,
    /// What an unhandled release over empty canvas does
    pub link_release_on_empty: LinkReleaseAction,

    /// Smallest zoom factor
    pub min_scale: f32,
    /// Largest zoom factor
    pub max_scale: f32,
    /// Zoom multiplier per wheel notch
    pub zoom_speed: f32,

    /// Frame rate cap, 0 for none
    pub max_fps: u32,
    /// Physical pixels per logical pixel
    pub device_pixel_ratio: f32,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            link_render_mode: LinkRenderMode::Spline,
            link_marker: LinkMarkerShape::Circle,
            spline_offset_factor: 0.25,
            connections_width: 3.0,
            max_click_drift: 6.0,
            buffer_time_ms: 150,
            double_click_time_ms: 300,
            double_click_drift: 6.0,
            grid_size: 10.0,
            always_snap_to_grid: false,
            click_do_break_link_to: false,
            allow_reconnect_links: true,
            read_only: false,
            refcount_highlighted_links: false,
            link_release_on_empty: LinkReleaseAction::ContextMenu,
            min_scale: 0.1,
            max_scale: 10.0,
            zoom_speed: 1.1,
            max_fps: 0,
            device_pixel_ratio: 1.0,
        }
    }
}

impl CanvasSettings {
    /// Parse settings from RON text
    pub fn from_ron(text: &str) -> Result<Self> {
        let settings: CanvasSettings = ron::from_str(text)?;
        Ok(settings.sanitized())
    }

    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Save settings to a RON file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Set the render mode by name. Unknown names keep the current mode.
    pub fn set_link_render_mode_by_name(&mut self, name: &str) -> bool {
        match LinkRenderMode::from_name(name) {
            Some(mode) => {
                self.link_render_mode = mode;
                true
            }
            None => {
                tracing::debug!("Unknown link render mode {:?}", name);
                false
            }
        }
    }

    /// Replace out-of-range values with defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.device_pixel_ratio <= 0.0 || !self.device_pixel_ratio.is_finite() {
            self.device_pixel_ratio = defaults.device_pixel_ratio;
        }
        if self.min_scale <= 0.0 || self.min_scale > self.max_scale {
            self.min_scale = defaults.min_scale;
            self.max_scale = defaults.max_scale;
        }
        if self.zoom_speed <= 1.0 {
            self.zoom_speed = defaults.zoom_speed;
        }
        if self.grid_size <= 0.0 {
            self.grid_size = defaults.grid_size;
        }
        self
    }

    /// Minimum time between frames, if capped
    pub fn frame_interval_ms(&self) -> Option<f64> {
        (self.max_fps > 0).then(|| 1000.0 / f64::from(self.max_fps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = CanvasSettings::default();
        assert_eq!(settings.link_render_mode, LinkRenderMode::Spline);
        assert_eq!(settings.max_click_drift, 6.0);
        assert_eq!(settings.buffer_time_ms, 150);
        assert!(!settings.refcount_highlighted_links);
        assert!(settings.frame_interval_ms().is_none());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let settings =
            CanvasSettings::from_ron("(link_render_mode: Straight, max_fps: 50)").unwrap();
        assert_eq!(settings.link_render_mode, LinkRenderMode::Straight);
        assert_eq!(settings.frame_interval_ms(), Some(20.0));
        assert_eq!(settings.connections_width, 3.0);
    }

    #[test]
    fn test_serialization() {
        let mut settings = CanvasSettings::default();
        settings.read_only = true;
        let text = settings.to_ron().unwrap();
        assert_eq!(CanvasSettings::from_ron(&text).unwrap(), settings);
    }

    #[test]
    fn test_unknown_mode_name_keeps_current() {
        let mut settings = CanvasSettings::default();
        assert!(settings.set_link_render_mode_by_name("LINEAR"));
        assert!(!settings.set_link_render_mode_by_name("zigzag"));
        assert_eq!(settings.link_render_mode, LinkRenderMode::Linear);
    }

    #[test]
    fn test_sanitize_bad_values() {
        let ron = "(device_pixel_ratio: 0.0, min_scale: 5.0, max_scale: 1.0)";
        let settings = CanvasSettings::from_ron(ron).unwrap();
        assert_eq!(settings.device_pixel_ratio, 1.0);
        assert!(settings.min_scale < settings.max_scale);
    }
}
