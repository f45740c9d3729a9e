//! Visible-window query math shared by hosts and the peak cache.
//!
//! Hosts derive the pixel-column range for the current zoom/pan from the
//! same formulas the drawing side uses, so the cache query and the drawn
//! geometry always describe the same slice of audio.

use serde::{Deserialize, Serialize};

/// The cache query implied by one view configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnRange {
    /// Downsampling ratio for this window.
    pub samples_per_px: f64,
    /// First visible pixel column.
    pub start: u32,
    /// Last visible pixel column.
    pub end: u32,
}

/// Column range covering the visible window of a buffer with `data_len`
/// samples at the given pan/zoom, drawn `width` pixels wide.
///
/// Returns `None` when there is nothing to draw (no audio loaded yet, or
/// a degenerate surface).
pub fn visible_columns(
    data_len: usize,
    duration: f64,
    position: f64,
    zoom: f64,
    width: f64,
) -> Option<ColumnRange> {
    if data_len == 0 || duration <= 0.0 || zoom <= 0.0 || width <= 0.0 {
        return None;
    }

    let visible_len = (data_len as f64 / zoom).min(data_len as f64);
    let samples_per_px = visible_len / width;
    if samples_per_px <= 0.0 {
        return None;
    }

    let start = (position / duration * (data_len as f64 / samples_per_px)).floor() as u32;
    let end = start + visible_len.min(width.floor()) as u32;

    Some(ColumnRange {
        samples_per_px,
        start,
        end,
    })
}

/// Crossfade factor between curve and peak-bar drawing, rising with the
/// downsampling ratio.
pub fn peaks_opacity(samples_per_px: f64) -> f64 {
    if samples_per_px <= 0.0 {
        return 0.0;
    }
    ((samples_per_px / 96.0).ln() - 0.5).clamp(0.0, 1.0)
}

/// Largest pan position at which the visible window still ends at the
/// buffer's end.
pub fn max_position(duration: f64, zoom: f64) -> f64 {
    duration - duration / zoom
}

/// Zoom while keeping the sample under the pointer at the same pixel.
///
/// `pointer_pct` is the pointer's horizontal fraction of the viewport;
/// the new zoom is clamped to `1..=max_zoom` and the new position to the
/// valid pan range. Returns `(position, zoom)`.
pub fn zoom_about(
    position: f64,
    zoom: f64,
    duration: f64,
    pointer_pct: f64,
    factor: f64,
    max_zoom: f64,
) -> (f64, f64) {
    let zoomed_length = duration / zoom;
    let pointer_position = position + zoomed_length * pointer_pct;

    let new_zoom = (zoom * factor).clamp(1.0, max_zoom.max(1.0));
    let new_zoomed_length = duration / new_zoom;

    let new_position = (pointer_position - pointer_pct * new_zoomed_length)
        .clamp(0.0, max_position(duration, new_zoom).max(0.0));

    (new_position, new_zoom)
}
