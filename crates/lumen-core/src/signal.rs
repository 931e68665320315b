//! Channel values exchanged between nodes.
//!
//! Every output channel of a node carries at most one [`Signal`] per tick.
//! Absence is modeled as `Option::<Signal>::None` rather than a zero payload:
//! an unwired input, a node that failed this tick, or a source that has not
//! produced anything yet all look the same to a consumer.
//!
//! Payloads are reference counted. Cloning a signal shares the underlying
//! buffer, so every consumer of a fanned-out channel observes the identical
//! value produced upstream.

use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One RGB triple with channels in the `0.0..=255.0` range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
}

impl Rgb {
    /// All channels off.
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    /// All channels at full intensity.
    pub const WHITE: Rgb = Rgb::new(255.0, 255.0, 255.0);
    /// Pure red.
    pub const RED: Rgb = Rgb::new(255.0, 0.0, 0.0);
    /// Pure green.
    pub const GREEN: Rgb = Rgb::new(0.0, 255.0, 0.0);
    /// Pure blue.
    pub const BLUE: Rgb = Rgb::new(0.0, 0.0, 255.0);

    /// Creates a color from raw channel values.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Multiplies every channel by `factor`.
    #[inline]
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    /// Clamps every channel into `0.0..=255.0`, mapping NaN to zero.
    #[inline]
    pub fn clamped(self) -> Self {
        fn clamp(v: f32) -> f32 {
            if v.is_nan() { 0.0 } else { v.clamp(0.0, 255.0) }
        }
        Self::new(clamp(self.r), clamp(self.g), clamp(self.b))
    }

    /// Largest of the three channels.
    #[inline]
    pub fn max_channel(self) -> f32 {
        self.r.max(self.g).max(self.b)
    }

    /// Applies `f` channel-wise to `self` and `other`.
    #[inline]
    pub fn zip_with(self, other: Rgb, f: impl Fn(f32, f32) -> f32) -> Self {
        Self::new(f(self.r, other.r), f(self.g, other.g), f(self.b, other.b))
    }

    /// Builds a color from hue, saturation and value, each in `0.0..=1.0`.
    ///
    /// Hue wraps, so `1.25` is the same as `0.25`.
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let h = hue.rem_euclid(1.0) * 6.0;
        let s = saturation.clamp(0.0, 1.0);
        let v = value.clamp(0.0, 1.0);
        let sector = h.floor();
        let f = h - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        let (r, g, b) = match sector as u32 % 6 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Self::new(r * 255.0, g * 255.0, b * 255.0)
    }

    /// Converts to `(hue, saturation, value)`, each in `0.0..=1.0`.
    pub fn to_hsv(self) -> (f32, f32, f32) {
        let r = self.r / 255.0;
        let g = self.g / 255.0;
        let b = self.b / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;
        if max <= 0.0 {
            return (0.0, 0.0, 0.0);
        }
        let s = delta / max;
        if delta <= f32::EPSILON {
            return (0.0, s, max);
        }
        let h = if max == r {
            ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        (h / 6.0, s, max)
    }
}

/// An immutable, shared table of pixel colors.
#[derive(Clone, Debug, PartialEq)]
pub struct Pixels(Arc<[Rgb]>);

impl Pixels {
    /// Wraps a vector of colors.
    pub fn new(pixels: Vec<Rgb>) -> Self {
        Self(pixels.into())
    }

    /// A table of `len` copies of `color`.
    pub fn filled(len: usize, color: Rgb) -> Self {
        Self(vec![color; len].into())
    }

    /// Borrows the colors.
    #[inline]
    pub fn as_slice(&self) -> &[Rgb] {
        &self.0
    }

    /// Copies the colors into an owned, mutable vector.
    pub fn to_vec(&self) -> Vec<Rgb> {
        self.0.to_vec()
    }

    /// True when both tables share the same allocation.
    pub fn ptr_eq(a: &Pixels, b: &Pixels) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Deref for Pixels {
    type Target = [Rgb];

    fn deref(&self) -> &[Rgb] {
        &self.0
    }
}

impl From<Vec<Rgb>> for Pixels {
    fn from(pixels: Vec<Rgb>) -> Self {
        Self::new(pixels)
    }
}

/// One block of mono audio samples.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioFrame {
    sample_rate: f32,
    samples: Arc<[f32]>,
}

impl AudioFrame {
    /// Wraps a block of samples captured at `sample_rate`.
    pub fn new(sample_rate: f32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples: samples.into(),
        }
    }

    /// A block of `len` zero samples.
    pub fn silent(sample_rate: f32, len: usize) -> Self {
        Self::new(sample_rate, vec![0.0; len])
    }

    /// Sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Borrows the samples.
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of samples in the block.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True for an empty block.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Largest sample value (signed, as a meter would read it). Zero when empty.
    pub fn peak(&self) -> f32 {
        self.samples.iter().copied().reduce(f32::max).unwrap_or(0.0)
    }

    /// Root-mean-square level. Zero when empty.
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = self.samples.iter().map(|s| s * s).sum();
        (sum_sq / self.samples.len() as f32).sqrt()
    }

    /// True when both frames share the same allocation.
    pub fn ptr_eq(a: &AudioFrame, b: &AudioFrame) -> bool {
        Arc::ptr_eq(&a.samples, &b.samples)
    }
}

/// A value carried by one channel for one tick.
#[derive(Clone, Debug, PartialEq)]
pub enum Signal {
    /// A block of mono audio.
    Audio(AudioFrame),
    /// A pixel table (also used for color tables).
    Pixels(Pixels),
    /// A single control value.
    Scalar(f32),
}

impl Signal {
    /// Returns the audio payload, if any.
    pub fn as_audio(&self) -> Option<&AudioFrame> {
        match self {
            Signal::Audio(frame) => Some(frame),
            _ => None,
        }
    }

    /// Returns the pixel payload, if any.
    pub fn as_pixels(&self) -> Option<&Pixels> {
        match self {
            Signal::Pixels(pixels) => Some(pixels),
            _ => None,
        }
    }

    /// Returns the scalar payload, if any.
    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            Signal::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// Short name of the payload kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Signal::Audio(_) => "audio",
            Signal::Pixels(_) => "pixels",
            Signal::Scalar(_) => "scalar",
        }
    }

    /// True when both signals carry the very same payload allocation
    /// (or equal scalars).
    pub fn same_payload(&self, other: &Signal) -> bool {
        match (self, other) {
            (Signal::Audio(a), Signal::Audio(b)) => AudioFrame::ptr_eq(a, b),
            (Signal::Pixels(a), Signal::Pixels(b)) => Pixels::ptr_eq(a, b),
            (Signal::Scalar(a), Signal::Scalar(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl From<AudioFrame> for Signal {
    fn from(frame: AudioFrame) -> Self {
        Signal::Audio(frame)
    }
}

impl From<Pixels> for Signal {
    fn from(pixels: Pixels) -> Self {
        Signal::Pixels(pixels)
    }
}

/// Typed accessors over a resolved input vector.
///
/// A wrong payload kind reads as absent, the same as an unwired channel.
pub trait InputsExt {
    /// Audio on input `index`.
    fn audio(&self, index: usize) -> Option<&AudioFrame>;
    /// Pixels on input `index`.
    fn pixels(&self, index: usize) -> Option<&Pixels>;
    /// Scalar on input `index`.
    fn scalar(&self, index: usize) -> Option<f32>;
}

impl InputsExt for [Option<Signal>] {
    fn audio(&self, index: usize) -> Option<&AudioFrame> {
        self.get(index)?.as_ref()?.as_audio()
    }

    fn pixels(&self, index: usize) -> Option<&Pixels> {
        self.get(index)?.as_ref()?.as_pixels()
    }

    fn scalar(&self, index: usize) -> Option<f32> {
        self.get(index)?.as_ref()?.as_scalar()
    }
}
