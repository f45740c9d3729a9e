//! Waveform downsampling: per-column aggregation and the resolution cache.

pub mod aggregate;
pub mod cache;

pub use aggregate::{aggregate, PeakPair, ReductionMode};
pub use cache::{PeakCache, ProgressFn};
