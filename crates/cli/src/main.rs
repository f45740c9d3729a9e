//! Peakline CLI — inspect, query, and pre-render waveform peaks.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use peakline_core::audio::decode_audio;
use peakline_core::peaks::{PeakCache, PeakPair, ReductionMode};
use peakline_core::view;

// ─── Top-level CLI ───────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "peakline",
    about = "Waveform peak cache inspector and terminal renderer",
    version,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print sample count, sample rate and duration
    Info { file: PathBuf },
    /// Print the visible window's peak pairs (text or JSON)
    Peaks(PeaksArgs),
    /// Draw the visible window as an ASCII waveform
    Render(RenderArgs),
    /// Pre-populate the coarse cache ladder and report stats
    Warmup {
        file: PathBuf,
        #[arg(long, value_enum, default_value = "peak")]
        mode: ModeArg,
    },
}

// ─── Shared arguments ────────────────────────────────────────────

#[derive(Parser, Debug)]
struct ViewArgs {
    file: PathBuf,
    /// Viewport width in pixel columns
    #[arg(long, default_value_t = 80)]
    width: u32,
    /// Magnification factor (1 = whole file visible)
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,
    /// Left edge of the visible window in seconds
    #[arg(long, default_value_t = 0.0)]
    position: f64,
    #[arg(long, value_enum, default_value = "peak")]
    mode: ModeArg,
}

#[derive(Parser, Debug)]
struct PeaksArgs {
    #[command(flatten)]
    view: ViewArgs,
    /// Emit a JSON array instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    view: ViewArgs,
    /// Rendered height in terminal rows (even numbers center best)
    #[arg(long, default_value_t = 16)]
    height: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Peak,
    Rms,
}

impl From<ModeArg> for ReductionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Peak => ReductionMode::Peak,
            ModeArg::Rms => ReductionMode::Rms,
        }
    }
}

// ─── Commands ────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Info { file } => cmd_info(&file),
        Command::Peaks(args) => cmd_peaks(args),
        Command::Render(args) => cmd_render(args),
        Command::Warmup { file, mode } => cmd_warmup(&file, mode.into()),
    }
}

fn load(file: &PathBuf) -> Result<(PeakCache, u32)> {
    let (samples, sample_rate) = decode_audio(file)
        .with_context(|| format!("Failed to decode {}", file.display()))?;
    Ok((PeakCache::new(samples), sample_rate))
}

fn cmd_info(file: &PathBuf) -> Result<()> {
    let (cache, sample_rate) = load(file)?;
    let duration = cache.len() as f64 / sample_rate as f64;
    println!("file:        {}", file.display());
    println!("samples:     {}", cache.len());
    println!("sample rate: {} Hz", sample_rate);
    println!("duration:    {:.3} s", duration);
    Ok(())
}

/// Query the peaks for the window described by `args`.
fn visible_peaks(args: &ViewArgs) -> Result<(Vec<PeakPair>, view::ColumnRange)> {
    let (mut cache, sample_rate) = load(&args.file)?;
    let duration = cache.len() as f64 / sample_rate as f64;

    let position = args
        .position
        .clamp(0.0, view::max_position(duration, args.zoom).max(0.0));
    let range = view::visible_columns(
        cache.len(),
        duration,
        position,
        args.zoom,
        args.width as f64,
    )
    .context("Nothing to draw: empty file or degenerate view")?;

    log::info!(
        "querying columns {}..={} at {:.2} samples/px",
        range.start,
        range.end,
        range.samples_per_px
    );

    let peaks = cache.get_peaks(
        range.samples_per_px,
        range.start,
        range.end,
        args.mode.into(),
        Some(&mut |progress| log::debug!("query progress {:.0}%", progress * 100.0)),
    );
    Ok((peaks, range))
}

fn cmd_peaks(args: PeaksArgs) -> Result<()> {
    let (peaks, range) = visible_peaks(&args.view)?;

    if args.json {
        println!("{}", serde_json::to_string(&peaks)?);
    } else {
        for (i, pair) in peaks.iter().enumerate() {
            println!("{}\t{:+.5}\t{:+.5}", range.start + i as u32, pair.min, pair.max);
        }
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let (peaks, _) = visible_peaks(&args.view)?;
    print!("{}", render_ascii(&peaks, args.height.max(2)));
    Ok(())
}

fn cmd_warmup(file: &PathBuf, mode: ReductionMode) -> Result<()> {
    let (mut cache, _) = load(file)?;

    let started = Instant::now();
    cache.warmup(mode, &mut |progress| {
        log::info!("warmup progress {:.0}%", progress * 100.0);
    });
    let elapsed = started.elapsed();

    println!("warmed up in {:.2?}", elapsed);
    println!("raw scans: {}", cache.raw_aggregations());
    for level in cache.cached_levels(mode) {
        println!(
            "level {:>8.0} samples/px: {} columns",
            level,
            cache.level_len(level, mode)
        );
    }
    Ok(())
}

// ─── Terminal drawing ────────────────────────────────────────────

/// Render peak pairs as a block of text, one column per pair. Each row
/// covers an amplitude band; a cell is filled when the pair's bar crosses
/// the band.
fn render_ascii(peaks: &[PeakPair], height: usize) -> String {
    let half = height as f32 / 2.0;
    let mut out = String::with_capacity((peaks.len() + 1) * height);

    for row in 0..height {
        let band_hi = 1.0 - row as f32 / half;
        let band_lo = 1.0 - (row + 1) as f32 / half;
        for pair in peaks {
            let filled = pair.min <= band_hi && pair.max >= band_lo;
            let center = band_lo <= 0.0 && band_hi >= 0.0;
            out.push(match (filled, center) {
                (true, _) => '█',
                (false, true) => '─',
                (false, false) => ' ',
            });
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_ascii_shape() {
        let peaks = vec![
            PeakPair { min: -1.0, max: 1.0 },
            PeakPair::ZERO,
            PeakPair { min: 0.0, max: 0.5 },
        ];
        let drawn = render_ascii(&peaks, 4);
        let rows: Vec<&str> = drawn.lines().collect();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.chars().count() == 3));
        // Full-scale bar fills its column top to bottom.
        assert!(rows.iter().all(|r| r.starts_with('█')));
    }
}
