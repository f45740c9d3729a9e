//! Pure per-column peak aggregation.

use serde::{Deserialize, Serialize};

/// How the samples under one pixel column are reduced to a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReductionMode {
    /// Keep the signed extremes (min and max independently).
    Peak,
    /// Sign-partitioned running accumulation of `v^2 / samples_per_px`.
    ///
    /// Not a true windowed RMS: a sample contributes to an accumulator
    /// only while it extends the running extremity on its side, so the
    /// result depends on the ascending scan order. This is the
    /// compatibility-mandated behavior and must stay bit-for-bit.
    Rms,
}

/// A (min, max) pair summarizing the samples under one pixel column.
///
/// `min <= 0 <= max` holds for every aggregated pair; a silent or fully
/// out-of-range column degenerates to `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PeakPair {
    pub min: f32,
    pub max: f32,
}

impl PeakPair {
    pub const ZERO: Self = Self { min: 0.0, max: 0.0 };

    /// Split a single sample into a pair where only the sign-matching
    /// side is non-zero: `0.3 -> (0, 0.3)`, `-0.2 -> (-0.2, 0)`.
    pub fn from_sample(value: f32) -> Self {
        if value < 0.0 {
            Self { min: value, max: 0.0 }
        } else {
            Self { min: 0.0, max: value }
        }
    }

    /// Widen this pair so it also covers `other`.
    pub fn widen(&mut self, other: PeakPair) {
        if other.max > self.max {
            self.max = other.max;
        }
        if other.min < self.min {
            self.min = other.min;
        }
    }
}

/// Aggregate the samples under pixel column `x` at the given ratio.
///
/// Ratios above 1 scan `samples_per_px` raw samples starting at
/// `floor(x * samples_per_px)`, stopping early at the buffer end (the
/// partial result stands, rendering stays best-effort at boundaries).
/// Ratios at or below 1 mean the view is zoomed past native resolution:
/// Peak interpolates linearly between the two neighboring samples, Rms
/// snaps to the nearest one.
pub fn aggregate(data: &[f32], samples_per_px: f64, x: u32, mode: ReductionMode) -> PeakPair {
    if samples_per_px <= 1.0 {
        return interpolate(data, samples_per_px, x, mode);
    }

    let start = (x as f64 * samples_per_px).floor() as usize;
    match mode {
        ReductionMode::Peak => {
            let mut pair = PeakPair::ZERO;
            let mut i = 0usize;
            while (i as f64) < samples_per_px {
                let Some(&value) = data.get(start + i) else {
                    break;
                };
                if value > pair.max {
                    pair.max = value;
                } else if value < pair.min {
                    pair.min = value;
                }
                i += 1;
            }
            pair
        }
        ReductionMode::Rms => {
            let mut min_value = 0.0f32;
            let mut max_value = 0.0f32;
            let mut min_acc = 0.0f64;
            let mut max_acc = 0.0f64;
            let mut i = 0usize;
            while (i as f64) < samples_per_px {
                let Some(&value) = data.get(start + i) else {
                    break;
                };
                let energy = (value as f64) * (value as f64) / samples_per_px;
                if value <= min_value {
                    min_value = value;
                    min_acc += energy;
                }
                if value >= max_value {
                    max_value = value;
                    max_acc += energy;
                }
                i += 1;
            }
            PeakPair {
                min: -(min_acc.sqrt() as f32),
                max: max_acc.sqrt() as f32,
            }
        }
    }
}

fn interpolate(data: &[f32], samples_per_px: f64, x: u32, mode: ReductionMode) -> PeakPair {
    let position = x as f64 * samples_per_px;
    let value = match mode {
        ReductionMode::Peak => {
            let lower = sample_at(data, position.floor() as usize);
            let upper = sample_at(data, position.ceil() as usize);
            let fraction = (position - position.floor()) as f32;
            lower + (upper - lower) * fraction
        }
        ReductionMode::Rms => sample_at(data, position.round() as usize),
    };
    PeakPair::from_sample(value)
}

fn sample_at(data: &[f32], index: usize) -> f32 {
    data.get(index).copied().unwrap_or(0.0)
}
