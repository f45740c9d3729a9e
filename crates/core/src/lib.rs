//! Peakline core: multi-resolution waveform peak cache and viewport math
//! for zoomable, pannable audio visualizations.
//!
//! The host owns rendering, playback and input handling; this crate turns
//! a dense single-channel sample buffer into the small sequences of
//! (min, max) pairs a drawing surface needs at any zoom level, and maps
//! between virtual time and viewport pixels so waveform, regions and
//! playhead agree on one projection.

pub mod audio;
pub mod peaks;
pub mod region;
pub mod view;
pub mod viewport;

pub use peaks::{aggregate, PeakCache, PeakPair, ReductionMode};
pub use viewport::{ScreenExtent, ViewportState};
