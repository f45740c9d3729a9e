//! Memoized multi-resolution peak cache with cooperative chunking.
//!
//! The cache owns one sample buffer and, per reduction mode, a lazily
//! created map of resolution levels: samples-per-pixel -> pixel column ->
//! cached pair. Entries are computed on demand, either by scanning raw
//! samples or by composing two entries from a coarser cached level, and
//! are never evicted or recomputed; the cache lives and dies with the
//! buffer it wraps.
//!
//! Everything here runs on one logical thread. `&mut self` on the query
//! path makes the no-concurrent-writers precondition a compile-time fact
//! rather than a comment.

use std::collections::HashMap;

use super::aggregate::{aggregate, PeakPair, ReductionMode};

/// Columns processed between progress reports during a long query. The
/// progress callback doubles as the host's suspension point ("wait for
/// next frame"), bounding worst-case blocking to one chunk of work.
pub const CHUNK_COLUMNS: u32 = 10_000;

/// Rough composition levels are quantized to multiples of this many
/// samples per pixel, bounding how many distinct levels get created.
const ROUGH_STEP: f64 = 100.0;

/// Entries fetched from the coarser level when composing a miss.
const COMPOSE_SPAN: u32 = 2;

/// One warmup ladder level is added per this many samples.
const SAMPLES_PER_WARMUP_LEVEL: usize = 20_000_000;

/// Fractional progress sink in `[0, 1]`.
pub type ProgressFn<'a> = &'a mut dyn FnMut(f64);

type LevelMap = HashMap<u32, PeakPair>;

#[derive(Default)]
struct ModeCache {
    /// Keyed by the exact bit pattern of the samples-per-pixel ratio, so
    /// fractional query ratios address their own level just like the
    /// float-keyed map they replace.
    levels: HashMap<u64, LevelMap>,
}

/// Multi-resolution (min, max) cache over a single-channel sample buffer.
pub struct PeakCache {
    data: Vec<f32>,
    peak: ModeCache,
    rms: ModeCache,
    raw_aggregations: u64,
}

impl PeakCache {
    pub fn new(data: Vec<f32>) -> Self {
        Self {
            data,
            peak: ModeCache::default(),
            rms: ModeCache::default(),
            raw_aggregations: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    /// Number of whole columns the full buffer spans at a given ratio.
    pub fn full_width(&self, samples_per_px: f64) -> u32 {
        (self.data.len() as f64 / samples_per_px).ceil() as u32
    }

    /// How many times raw samples have been scanned. A repeated query must
    /// not move this counter; see `get_peaks`.
    pub fn raw_aggregations(&self) -> u64 {
        self.raw_aggregations
    }

    /// Samples-per-pixel ratios that currently own a cached level.
    pub fn cached_levels(&self, mode: ReductionMode) -> Vec<f64> {
        let mut levels: Vec<f64> = self
            .mode_cache(mode)
            .levels
            .keys()
            .map(|&bits| f64::from_bits(bits))
            .collect();
        levels.sort_by(|a, b| a.total_cmp(b));
        levels
    }

    /// Number of columns cached at one resolution level.
    pub fn level_len(&self, samples_per_px: f64, mode: ReductionMode) -> usize {
        self.mode_cache(mode)
            .levels
            .get(&samples_per_px.to_bits())
            .map_or(0, HashMap::len)
    }

    /// Peak pairs for pixel columns `start..=end` at the given ratio.
    ///
    /// Cached entries are returned as-is; misses are computed and stored,
    /// so a second identical call touches no raw samples. Every
    /// `CHUNK_COLUMNS` columns the optional progress sink receives
    /// `x / end`; hosts that need to stay responsive pump their frame
    /// scheduler inside that callback.
    pub fn get_peaks(
        &mut self,
        samples_per_px: f64,
        start: u32,
        end: u32,
        mode: ReductionMode,
        mut progress: Option<ProgressFn<'_>>,
    ) -> Vec<PeakPair> {
        let mut peaks = Vec::with_capacity(end.saturating_sub(start) as usize + 1);
        for x in start..=end {
            peaks.push(self.peak_at(samples_per_px, x, mode));
            if x % CHUNK_COLUMNS == 0 && end > 0 {
                if let Some(on_progress) = progress.as_mut() {
                    on_progress(x as f64 / end as f64);
                }
            }
        }
        peaks
    }

    /// Proactively populate the coarse cache ladder for the whole buffer.
    ///
    /// Emits an initial `1.0` pulse before any work (long-standing host
    /// contract: the loading indicator hides until real progress starts),
    /// then sweeps `ceil(len / 20M)` levels at `(i + 2) * 100` samples per
    /// pixel sequentially, scaling each level's progress into
    /// `(i + level_progress) / total`, and finishes with another `1.0`.
    pub fn warmup(&mut self, mode: ReductionMode, on_progress: ProgressFn<'_>) {
        on_progress(1.0);

        let total_levels = self.data.len().div_ceil(SAMPLES_PER_WARMUP_LEVEL);
        log::debug!(
            "warmup: {} level(s) for {} samples",
            total_levels,
            self.data.len()
        );

        for level in 0..total_levels {
            let samples_per_px = ((level + 2) * 100) as f64;
            let end = self.full_width(samples_per_px);
            self.get_peaks(
                samples_per_px,
                0,
                end,
                mode,
                Some(&mut |level_progress| {
                    on_progress((level as f64 + level_progress) / total_levels as f64)
                }),
            );
            log::debug!("warmup: level {} ({} samples/px) done", level, samples_per_px);
        }

        on_progress(1.0);
    }

    /// One column, cached.
    fn peak_at(&mut self, samples_per_px: f64, x: u32, mode: ReductionMode) -> PeakPair {
        if samples_per_px == 1.0 {
            // Exact native resolution bypasses the cache and the mode.
            // This disagrees with `aggregate`, which still branches on the
            // mode for ratios <= 1; the discontinuity at exactly 1.0 is
            // preserved for compatibility.
            let value = self.data.get(x as usize).copied().unwrap_or(0.0);
            return PeakPair { min: value, max: value };
        }

        if let Some(cached) = self.lookup(samples_per_px, x, mode) {
            return cached;
        }

        let rough = (samples_per_px / COMPOSE_SPAN as f64 / ROUGH_STEP).ceil() * ROUGH_STEP;
        let pair = if rough > ROUGH_STEP {
            // Compose from the coarser quantized level instead of
            // rescanning raw samples. Recursion depth is bounded by the
            // repeated halving towards ROUGH_STEP.
            let rough_start = (x as f64 * samples_per_px / rough).round() as u32;
            let mut pair = PeakPair::ZERO;
            for i in 0..COMPOSE_SPAN {
                pair.widen(self.peak_at(rough, rough_start + i, mode));
            }
            pair
        } else {
            self.raw_aggregations += 1;
            aggregate(&self.data, samples_per_px, x, mode)
        };

        self.mode_cache_mut(mode)
            .levels
            .entry(samples_per_px.to_bits())
            .or_default()
            .insert(x, pair);
        pair
    }

    fn lookup(&self, samples_per_px: f64, x: u32, mode: ReductionMode) -> Option<PeakPair> {
        self.mode_cache(mode)
            .levels
            .get(&samples_per_px.to_bits())?
            .get(&x)
            .copied()
    }

    fn mode_cache(&self, mode: ReductionMode) -> &ModeCache {
        match mode {
            ReductionMode::Peak => &self.peak,
            ReductionMode::Rms => &self.rms,
        }
    }

    fn mode_cache_mut(&mut self, mode: ReductionMode) -> &mut ModeCache {
        match mode {
            ReductionMode::Peak => &mut self.peak,
            ReductionMode::Rms => &mut self.rms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_buffer(len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| ((i * 37 % 101) as f32 / 50.0 - 1.0).clamp(-1.0, 1.0))
            .collect()
    }

    #[test]
    fn test_scenario_columns() {
        let data = vec![0.1, -0.2, 0.3, -0.4, 0.5, -0.6, 0.7, -0.8];
        let mut cache = PeakCache::new(data);
        let peaks = cache.get_peaks(4.0, 0, 1, ReductionMode::Peak, None);
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0], PeakPair { min: -0.4, max: 0.3 });
        assert_eq!(peaks[1], PeakPair { min: -0.8, max: 0.7 });
    }

    #[test]
    fn test_empty_buffer_yields_silence() {
        let mut cache = PeakCache::new(Vec::new());
        for mode in [ReductionMode::Peak, ReductionMode::Rms] {
            let peaks = cache.get_peaks(100.0, 0, 5, mode, None);
            assert_eq!(peaks, vec![PeakPair::ZERO; 6]);
            let raw = cache.get_peaks(1.0, 0, 3, mode, None);
            assert_eq!(raw, vec![PeakPair::ZERO; 4]);
        }
    }

    #[test]
    fn test_idempotent_and_no_rescan() {
        let mut cache = PeakCache::new(test_buffer(4096));
        let first = cache.get_peaks(32.0, 0, 100, ReductionMode::Peak, None);
        let scans = cache.raw_aggregations();
        assert!(scans > 0);

        let second = cache.get_peaks(32.0, 0, 100, ReductionMode::Peak, None);
        assert_eq!(first, second);
        assert_eq!(
            cache.raw_aggregations(),
            scans,
            "second identical query must not rescan raw samples"
        );
    }

    #[test]
    fn test_modes_cached_independently() {
        let mut cache = PeakCache::new(test_buffer(4096));
        cache.get_peaks(32.0, 0, 10, ReductionMode::Peak, None);
        let scans = cache.raw_aggregations();
        cache.get_peaks(32.0, 0, 10, ReductionMode::Rms, None);
        assert!(cache.raw_aggregations() > scans);
    }

    #[test]
    fn test_one_sample_per_px_bypass_ignores_mode() {
        // Known boundary discontinuity: at exactly 1.0 samples/px the raw
        // sample is doubled into the pair regardless of mode, while ratios
        // below 1.0 still branch on it in the aggregator.
        let mut cache = PeakCache::new(vec![0.5, -0.5]);
        let peak = cache.get_peaks(1.0, 0, 1, ReductionMode::Peak, None);
        let rms = cache.get_peaks(1.0, 0, 1, ReductionMode::Rms, None);
        assert_eq!(peak, rms);
        assert_eq!(peak[1], PeakPair { min: -0.5, max: -0.5 });
        assert_eq!(cache.raw_aggregations(), 0);
        assert!(cache.cached_levels(ReductionMode::Peak).is_empty());
    }

    #[test]
    fn test_hierarchical_composition_matches_direct_scan() {
        let data = test_buffer(4000);
        let mut cache = PeakCache::new(data.clone());

        // 400 samples/px composes two cached 200 samples/px entries that
        // span exactly the same raw range as a direct scan.
        let composed = cache.get_peaks(400.0, 0, 9, ReductionMode::Peak, None);
        for (x, pair) in composed.iter().enumerate() {
            let direct = aggregate(&data, 400.0, x as u32, ReductionMode::Peak);
            assert!(
                (pair.min - direct.min).abs() < 1e-6 && (pair.max - direct.max).abs() < 1e-6,
                "column {}: composed {:?} vs direct {:?}",
                x,
                pair,
                direct
            );
        }

        // Both the queried level and the rough level it leaned on exist.
        let levels = cache.cached_levels(ReductionMode::Peak);
        assert!(levels.contains(&400.0));
        assert!(levels.contains(&200.0));
    }

    #[test]
    fn test_query_past_buffer_end() {
        let mut cache = PeakCache::new(test_buffer(100));
        let peaks = cache.get_peaks(40.0, 0, 10, ReductionMode::Peak, None);
        assert_eq!(peaks.len(), 11);
        // Columns fully past the data are silent, no panic.
        assert_eq!(peaks[10], PeakPair::ZERO);
    }

    #[test]
    fn test_progress_chunking() {
        let mut cache = PeakCache::new(test_buffer(64));
        let mut reports = Vec::new();
        cache.get_peaks(
            2.0,
            0,
            25_000,
            ReductionMode::Peak,
            Some(&mut |p| reports.push(p)),
        );
        assert_eq!(reports.len(), 3); // x = 0, 10_000, 20_000
        assert_eq!(reports[0], 0.0);
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert!(reports.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_warmup_ladder_short_buffer() {
        let mut cache = PeakCache::new(test_buffer(10_000));
        let mut reports = Vec::new();
        cache.warmup(ReductionMode::Peak, &mut |p| reports.push(p));

        assert_eq!(reports.first(), Some(&1.0));
        assert_eq!(reports.last(), Some(&1.0));

        // A short buffer produces exactly one level at 200 samples/px,
        // fully populated (inclusive column range).
        let levels = cache.cached_levels(ReductionMode::Peak);
        assert_eq!(levels, vec![200.0]);
        let width = cache.full_width(200.0);
        assert_eq!(cache.level_len(200.0, ReductionMode::Peak), width as usize + 1);
    }

    #[test]
    fn test_warmup_ladder_large_buffer() {
        // 25M samples: two ladder levels, 200 and 300 samples/px.
        let mut cache = PeakCache::new(vec![0.0f32; 25_000_000]);
        let mut reports = Vec::new();
        cache.warmup(ReductionMode::Peak, &mut |p| reports.push(p));

        let levels = cache.cached_levels(ReductionMode::Peak);
        assert_eq!(levels, vec![200.0, 300.0]);
        for &level in &levels {
            let width = cache.full_width(level);
            assert_eq!(
                cache.level_len(level, ReductionMode::Peak),
                width as usize + 1,
                "level {} not fully populated",
                level
            );
        }

        // Initial done-pulse, then non-decreasing progress up to the
        // final 1.0.
        assert_eq!(reports.first(), Some(&1.0));
        assert_eq!(reports.last(), Some(&1.0));
        let body = &reports[1..];
        assert!(body.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_warmup_empty_buffer() {
        let mut cache = PeakCache::new(Vec::new());
        let mut reports = Vec::new();
        cache.warmup(ReductionMode::Rms, &mut |p| reports.push(p));
        assert_eq!(reports, vec![1.0, 1.0]);
        assert!(cache.cached_levels(ReductionMode::Rms).is_empty());
    }
}
