//! Stateless viewport coordinate transforms.
//!
//! Every visual element (waveform, regions, playhead) projects through
//! the same snapshot so they agree on one mapping between virtual time
//! and viewport pixels. The scaler never clamps its input state, only
//! conversions; keeping `position + duration / zoom <= duration` is the
//! caller's job.

use serde::{Deserialize, Serialize};

/// Snapshot of the host's zoom/pan state, passed per call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    /// Virtual offset of the visible window's left edge, `0..duration`.
    pub position: f64,
    /// Magnification factor, `>= 1`.
    pub zoom: f64,
    /// Total virtual range (e.g. buffer duration in seconds).
    pub duration: f64,
    /// Pixel origin of the viewport within the host surface.
    pub viewport_offset: f64,
    /// Viewport width in pixels.
    pub viewport_size: f64,
}

/// A clamped on-screen projection of a virtual interval.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenExtent {
    pub offset: f64,
    pub size: f64,
}

impl ScreenExtent {
    /// Off-screen intervals clamp to zero size; hosts skip drawing them.
    pub fn is_visible(&self) -> bool {
        self.size > 0.0
    }
}

impl ViewportState {
    /// Scale a virtual value into total (possibly off-screen) pixel space
    /// at the current zoom.
    pub fn to_pixels(&self, virtual_position: f64) -> f64 {
        if self.duration == 0.0 {
            return 0.0;
        }
        (virtual_position / self.duration) * (self.viewport_size * self.zoom)
    }

    /// Pixel coordinate relative to the visible viewport's left edge.
    pub fn to_screen_offset(&self, virtual_position: f64) -> f64 {
        self.to_pixels(virtual_position) - self.to_pixels(self.position)
    }

    /// Inverse mapping: a pixel coordinate on the host surface back to
    /// virtual time.
    pub fn to_virtual(&self, screen_x: f64) -> f64 {
        if self.viewport_size == 0.0 || self.zoom == 0.0 {
            return self.position;
        }
        let visible_duration = self.duration / self.zoom;
        let percent_x = (screen_x - self.viewport_offset) / self.viewport_size;
        self.position + percent_x * visible_duration
    }

    /// Project a virtual interval to a rectangle clamped to the viewport.
    /// Off-screen intervals come back with zero size rather than negative
    /// or overflowing values.
    pub fn extent_on_screen(&self, virtual_position: f64, virtual_length: f64) -> ScreenExtent {
        if self.viewport_size <= 0.0 {
            return ScreenExtent::default();
        }
        let raw_offset = self.to_screen_offset(virtual_position);
        let scaled_length = self.to_pixels(virtual_length);

        let offset = raw_offset.clamp(0.0, self.viewport_size);
        let size = (scaled_length - (offset - raw_offset)).clamp(0.0, self.viewport_size - offset);

        ScreenExtent { offset, size }
    }
}
