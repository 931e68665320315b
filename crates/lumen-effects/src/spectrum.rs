//! Spectrum visualizer.
//!
//! Each tick the last `n_overlaps + 1` audio blocks are windowed and run
//! through an FFT. The power spectrum is gathered into `fft_bins` bands spaced
//! evenly on the Bark scale, once for the bass range and once for the melody
//! range, and each band line is stretched over the strip. Both lines are
//! normalized by the loudest frame seen over the last six seconds (at
//! `chunk_rate` frames per second), so quiet passages still move the display.

use std::collections::VecDeque;
use std::fmt;

use lumen_core::param::{param_map, resolve, validate_partial};
use lumen_core::{
    Effect, ParamDescriptor, ParamError, ParamLookup, ParamMap, ParamUnit, ParamValue, Pixels, ProcessError, Rgb,
    Signal,
};
use rustfft::{FftPlanner, num_complex::Complex};

use crate::blend::{BlendMode, blend};
use crate::dsp::{convolve_same, hamming, hz_to_bark, interpolate};
use crate::{audio_input, pixels_input};

/// Lower edge of the bass range (C1).
const BASS_LOW_HZ: f32 = 32.7;
/// Split between bass and melody (C4).
const MELODY_LOW_HZ: f32 = 261.0;
/// Seconds of frame maxima kept for normalization.
const NORMALIZATION_SECONDS: usize = 6;
/// Width of the smoothing window applied along the strip.
const SMOOTHING_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Settings {
    n_overlaps: usize,
    chunk_rate: usize,
    fft_bins: usize,
    col_blend: BlendMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            n_overlaps: 4,
            chunk_rate: 60,
            fft_bins: 64,
            col_blend: BlendMode::LightenOnly,
        }
    }
}

impl Settings {
    fn from_lookup(p: &ParamMap, base: Settings) -> Result<Self, ParamError> {
        let col_blend = match p.get("col_blend").and_then(ParamValue::as_str) {
            Some(name) => name.parse()?,
            None => base.col_blend,
        };
        Ok(Self {
            n_overlaps: p.usize_or("n_overlaps", base.n_overlaps),
            chunk_rate: p.usize_or("chunk_rate", base.chunk_rate),
            fft_bins: p.usize_or("fft_bins", base.fft_bins),
            col_blend,
        })
    }

    fn to_map(self) -> ParamMap {
        param_map([
            ("n_overlaps", ParamValue::from(self.n_overlaps)),
            ("chunk_rate", ParamValue::from(self.chunk_rate)),
            ("fft_bins", ParamValue::from(self.fft_bins)),
            ("col_blend", ParamValue::from(self.col_blend.name())),
        ])
    }

    fn history_len(self) -> usize {
        self.chunk_rate * NORMALIZATION_SECONDS
    }
}

/// FFT visualizer for bass and melody.
///
/// Inputs: `0` audio (absent in, absent out), `1` melody color, `2` bass
/// color (both read as white when absent or shorter than the strip).
/// Outputs: `0` pixels.
pub struct Spectrum {
    num_pixels: usize,
    fs: f32,
    fmax: f32,
    initial: Settings,
    settings: Settings,
    blocks: VecDeque<Vec<f32>>,
    frame_peaks: VecDeque<f32>,
    planner: FftPlanner<f32>,
    smoothing: Vec<f32>,
}

impl Spectrum {
    /// Registry name.
    pub const TYPE_NAME: &'static str = "audioreactive.Spectrum";

    /// Creates the visualizer with default tunables.
    pub fn new(num_pixels: usize, fs: f32, fmax: f32) -> Self {
        Self::with_settings(num_pixels, fs, fmax, Settings::default())
    }

    fn with_settings(num_pixels: usize, fs: f32, fmax: f32, settings: Settings) -> Self {
        let window = hamming(SMOOTHING_LEN);
        let total: f32 = window.iter().sum();
        Self {
            num_pixels,
            fs,
            fmax: fmax.clamp(MELODY_LOW_HZ * 2.0, fs / 2.0),
            initial: settings,
            settings,
            blocks: VecDeque::new(),
            frame_peaks: VecDeque::new(),
            planner: FftPlanner::new(),
            smoothing: window.into_iter().map(|w| w / total).collect(),
        }
    }

    /// Sets the number of frames per second the normalization history spans.
    pub fn with_chunk_rate(mut self, chunk_rate: usize) -> Self {
        self.settings.chunk_rate = chunk_rate.clamp(30, 100);
        self.initial = self.settings;
        self
    }

    /// Sets how the bass and melody layers are blended.
    pub fn with_blend(mut self, mode: BlendMode) -> Self {
        self.settings.col_blend = mode;
        self.initial = self.settings;
        self
    }

    fn tunable_schema() -> Vec<ParamDescriptor> {
        let d = Settings::default();
        vec![
            ParamDescriptor::int("n_overlaps", d.n_overlaps as i64, 0, 20)
                .with_description("Previous blocks included in each FFT"),
            ParamDescriptor::int("chunk_rate", d.chunk_rate as i64, 30, 100)
                .with_description("Frames per second assumed by the normalization history"),
            ParamDescriptor::int("fft_bins", d.fft_bins as i64, 32, 128).with_description("Bands per range"),
            ParamDescriptor::choice("col_blend", BlendMode::NAMES, "lightenOnly")
                .with_description("How bass and melody layers combine"),
        ]
    }

    /// Construction parameters.
    pub fn constructor_schema() -> Vec<ParamDescriptor> {
        let mut schema = vec![
            ParamDescriptor::num_pixels(300),
            ParamDescriptor::sample_rate("fs", 48000.0),
            ParamDescriptor::float("fmax", 6000.0, 1000.0, 20000.0, 100.0)
                .with_unit(ParamUnit::Hertz)
                .with_description("Upper edge of the melody range"),
        ];
        schema.extend(Self::tunable_schema());
        schema
    }

    /// Builds from construction parameters; missing ones take defaults.
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        let p = resolve(&Self::constructor_schema(), params)?;
        Ok(Self::with_settings(
            p.usize_or("num_pixels", 300),
            p.f32_or("fs", 48000.0),
            p.f32_or("fmax", 6000.0),
            Settings::from_lookup(&p, Settings::default())?,
        ))
    }

    /// Number of audio blocks currently buffered.
    pub fn buffered_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Number of frame maxima in the normalization history.
    pub fn history_len(&self) -> usize {
        self.frame_peaks.len()
    }

    fn push_block(&mut self, samples: &[f32]) {
        self.blocks.push_back(samples.to_vec());
        while self.blocks.len() > self.settings.n_overlaps + 1 {
            self.blocks.pop_front();
        }
    }

    fn power_spectrum(&mut self, samples: &[f32]) -> Vec<f32> {
        let window = hamming(samples.len());
        let mut buffer: Vec<Complex<f32>> = samples
            .iter()
            .zip(&window)
            .map(|(s, w)| Complex::new(s * w, 0.0))
            .collect();
        self.planner.plan_fft_forward(buffer.len()).process(&mut buffer);
        buffer[..=samples.len() / 2].iter().map(|c| c.norm_sqr()).collect()
    }

    fn push_frame_peak(&mut self, peak: f32) -> f32 {
        self.frame_peaks.push_back(peak);
        while self.frame_peaks.len() > self.settings.history_len() {
            self.frame_peaks.pop_front();
        }
        self.frame_peaks.iter().copied().fold(0.0, f32::max)
    }

    fn render_line(&self, bands: &[f32], scale: f32) -> Vec<f32> {
        let stretched = interpolate(bands, self.num_pixels);
        convolve_same(&stretched, &self.smoothing)
            .into_iter()
            .map(|v| v * scale * 255.0)
            .collect()
    }
}

/// Averages `power` into `bins` bands evenly spaced in Bark between `low_hz`
/// and `high_hz`. Bands too narrow to contain an FFT bin take the spectrum
/// interpolated at their center.
fn warped_bands(power: &[f32], bin_hz: f32, low_hz: f32, high_hz: f32, bins: usize) -> Vec<f32> {
    let low = hz_to_bark(low_hz);
    let high = hz_to_bark(high_hz);
    let width = (high - low) / bins as f32;
    let mut sums = vec![0.0f32; bins];
    let mut counts = vec![0usize; bins];
    for (k, p) in power.iter().enumerate() {
        let bark = hz_to_bark(k as f32 * bin_hz);
        if bark < low || bark >= high {
            continue;
        }
        let band = (((bark - low) / width) as usize).min(bins - 1);
        sums[band] += p;
        counts[band] += 1;
    }
    (0..bins)
        .map(|band| {
            if counts[band] > 0 {
                sums[band] / counts[band] as f32
            } else {
                let center = bark_to_hz(low + width * (band as f32 + 0.5));
                power_at(power, center / bin_hz)
            }
        })
        .collect()
}

/// Linear interpolation of `power` at fractional bin `pos`.
fn power_at(power: &[f32], pos: f32) -> f32 {
    let Some(last) = power.len().checked_sub(1) else {
        return 0.0;
    };
    let lo = (pos.floor().max(0.0) as usize).min(last);
    let hi = (lo + 1).min(last);
    let frac = (pos - lo as f32).clamp(0.0, 1.0);
    power[lo] + (power[hi] - power[lo]) * frac
}

/// Inverse of [`hz_to_bark`] by bisection.
fn bark_to_hz(bark: f32) -> f32 {
    let (mut lo, mut hi) = (0.0f32, 24_000.0f32);
    for _ in 0..40 {
        let mid = 0.5 * (lo + hi);
        if hz_to_bark(mid) < bark {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

fn color_at(table: Option<&Pixels>, index: usize) -> Rgb {
    table.and_then(|t| t.get(index).copied()).unwrap_or(Rgb::WHITE)
}

impl fmt::Debug for Spectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spectrum")
            .field("num_pixels", &self.num_pixels)
            .field("fs", &self.fs)
            .field("fmax", &self.fmax)
            .field("settings", &self.settings)
            .field("buffered_blocks", &self.blocks.len())
            .finish_non_exhaustive()
    }
}

impl Effect for Spectrum {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn num_inputs(&self) -> usize {
        3
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn constructor_params(&self) -> ParamMap {
        let mut map = self.initial.to_map();
        map.insert("num_pixels".into(), ParamValue::from(self.num_pixels));
        map.insert("fs".into(), ParamValue::from(self.fs));
        map.insert("fmax".into(), ParamValue::from(self.fmax));
        map
    }

    fn parameter_schema(&self) -> Vec<ParamDescriptor> {
        Self::tunable_schema()
    }

    fn parameter_values(&self) -> ParamMap {
        self.settings.to_map()
    }

    fn apply_parameters(&mut self, values: &ParamMap) -> Result<(), ParamError> {
        let v = validate_partial(&Self::tunable_schema(), values)?;
        self.settings = Settings::from_lookup(&v, self.settings)?;
        Ok(())
    }

    fn process(&mut self, inputs: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
        let Some(audio) = audio_input(inputs, 0)? else {
            return Ok(());
        };
        let melody_color = pixels_input(inputs, 1)?;
        let bass_color = pixels_input(inputs, 2)?;

        self.push_block(audio.samples());
        let samples: Vec<f32> = self.blocks.iter().flatten().copied().collect();
        if samples.len() < 2 {
            outputs[0] = Some(Signal::Pixels(Pixels::filled(self.num_pixels, Rgb::BLACK)));
            return Ok(());
        }
        let power = self.power_spectrum(&samples);
        let bin_hz = self.fs / samples.len() as f32;
        let bins = self.settings.fft_bins;
        let bass = warped_bands(&power, bin_hz, BASS_LOW_HZ, MELODY_LOW_HZ, bins);
        let melody = warped_bands(&power, bin_hz, MELODY_LOW_HZ, self.fmax, bins);

        let frame_peak = bass.iter().chain(&melody).copied().fold(0.0, f32::max);
        let norm = self.push_frame_peak(frame_peak);
        let scale = if norm > 0.0 { norm.recip() } else { 0.0 };
        let bass = self.render_line(&bass, scale);
        let melody = self.render_line(&melody, scale);

        let bass_layer: Vec<Rgb> = bass
            .iter()
            .enumerate()
            .map(|(i, v)| color_at(bass_color, i).scale(v / 255.0))
            .collect();
        let melody_layer: Vec<Rgb> = melody
            .iter()
            .enumerate()
            .map(|(i, v)| color_at(melody_color, i).scale(v / 255.0))
            .collect();
        let pixels: Vec<Rgb> = blend(&bass_layer, &melody_layer, self.settings.col_blend)
            .into_iter()
            .map(Rgb::clamped)
            .collect();
        outputs[0] = Some(Signal::Pixels(Pixels::new(pixels)));
        Ok(())
    }
}
