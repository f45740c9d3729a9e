//! Region and playhead entities: identity plus pixel projection.
//!
//! Drag wiring and drawing stay host-side; the core only owns the data
//! shape and the coordinate math that keeps every element on the same
//! projection.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::view::max_position;
use crate::viewport::{ScreenExtent, ViewportState};

/// A selected interval of the buffer, in virtual time units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: Uuid,
    /// `rgba(r,g,b,0.8)` display color, assigned at creation.
    pub color: String,
    pub start: f64,
    pub end: f64,
}

impl Region {
    /// Create a region between two drag points, in either order.
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            color: random_color(),
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Edge-drag update: new bounds in either order, identity kept.
    pub fn resized(&self, a: f64, b: f64) -> Self {
        Self {
            id: self.id,
            color: self.color.clone(),
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Middle-drag update: same length, new left edge.
    pub fn moved_to(&self, start: f64) -> Self {
        Self {
            id: self.id,
            color: self.color.clone(),
            start,
            end: start + self.length(),
        }
    }

    /// Clamped on-screen rectangle under the given viewport.
    pub fn extent(&self, viewport: &ViewportState) -> ScreenExtent {
        viewport.extent_on_screen(self.start, self.length())
    }

    /// Fractional `(left, width)` of the full zoomed scroll strip, the
    /// placement used when the host positions regions with percentages.
    pub fn strip_fraction(&self, duration: f64) -> (f64, f64) {
        if duration == 0.0 {
            return (0.0, 0.0);
        }
        (self.start / duration, self.length() / duration)
    }
}

/// Random `rgba(r,g,b,0.8)` color for a fresh region.
pub fn random_color() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "rgba({},{},{},0.8)",
        rng.gen_range(0..=255u8),
        rng.gen_range(0..=255u8),
        rng.gen_range(0..=255u8)
    )
}

/// Playhead pixel offset within a scroll strip `range_px` wide.
pub fn playhead_left(position: f64, duration: f64, range_px: f64) -> f64 {
    if duration == 0.0 {
        return 0.0;
    }
    position / duration * range_px
}

/// Pan position that keeps a synced playhead centered in the visible
/// window, clamped to the valid range.
pub fn center_on_playhead(playhead: f64, duration: f64, zoom: f64) -> f64 {
    let limit = max_position(duration, zoom).max(0.0);
    (playhead - duration / zoom / 2.0).clamp(0.0, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_bounds() {
        let region = Region::new(3.0, 1.0);
        assert_eq!(region.start, 1.0);
        assert_eq!(region.end, 3.0);
        assert_eq!(region.length(), 2.0);
    }

    #[test]
    fn test_new_assigns_identity() {
        let a = Region::new(0.0, 1.0);
        let b = Region::new(0.0, 1.0);
        assert_ne!(a.id, b.id);
        assert!(a.color.starts_with("rgba(") && a.color.ends_with(",0.8)"));
    }

    #[test]
    fn test_resized_keeps_identity() {
        let region = Region::new(1.0, 2.0);
        let resized = region.resized(4.0, 0.5);
        assert_eq!(resized.id, region.id);
        assert_eq!(resized.color, region.color);
        assert_eq!(resized.start, 0.5);
        assert_eq!(resized.end, 4.0);
    }

    #[test]
    fn test_moved_keeps_length() {
        let region = Region::new(1.0, 3.0);
        let moved = region.moved_to(5.0);
        assert_eq!(moved.id, region.id);
        assert_eq!(moved.start, 5.0);
        assert_eq!(moved.end, 7.0);
    }

    #[test]
    fn test_extent_matches_viewport_projection() {
        let vp = ViewportState {
            position: 0.0,
            zoom: 1.0,
            duration: 10.0,
            viewport_offset: 0.0,
            viewport_size: 100.0,
        };
        let region = Region::new(8.0, 13.0);
        let extent = region.extent(&vp);
        assert_eq!(extent.offset, 80.0);
        assert_eq!(extent.size, 20.0);
    }

    #[test]
    fn test_strip_fraction() {
        let region = Region::new(2.5, 5.0);
        let (left, width) = region.strip_fraction(10.0);
        assert_eq!(left, 0.25);
        assert_eq!(width, 0.25);
        assert_eq!(region.strip_fraction(0.0), (0.0, 0.0));
    }

    #[test]
    fn test_playhead_left() {
        assert_eq!(playhead_left(5.0, 10.0, 198.0), 99.0);
        assert_eq!(playhead_left(5.0, 0.0, 198.0), 0.0);
    }

    #[test]
    fn test_center_on_playhead_clamps() {
        // Centered in the middle of the track.
        let position = center_on_playhead(5.0, 10.0, 2.0);
        assert_eq!(position, 2.5);
        // Near the edges the pan pins to the valid range.
        assert_eq!(center_on_playhead(0.0, 10.0, 2.0), 0.0);
        assert_eq!(center_on_playhead(10.0, 10.0, 2.0), 5.0);
        // At 1x zoom there is nowhere to pan.
        assert_eq!(center_on_playhead(7.0, 10.0, 1.0), 0.0);
    }
}
