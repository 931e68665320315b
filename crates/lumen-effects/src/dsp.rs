//! Small signal helpers shared by the audio-reactive effects.
//!
//! Filter coefficients use the RBJ Audio EQ Cookbook formulas. Pixel
//! smoothing works channel-wise on [`Rgb`] tables with mirrored edges.

use std::f32::consts::PI;

use lumen_core::Rgb;

/// Second-order IIR section.
///
/// Implements the Direct Form I structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a section from `(b0, b1, b2, a0, a1, a2)`, normalized by `a0`.
    pub fn from_coefficients((b0, b1, b2, a0, a1, a2): (f32, f32, f32, f32, f32, f32)) -> Self {
        let a0_inv = 1.0 / a0;
        Self {
            b0: b0 * a0_inv,
            b1: b1 * a0_inv,
            b2: b2 * a0_inv,
            a1: a1 * a0_inv,
            a2: a2 * a0_inv,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Processes one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2 - self.a1 * self.y1 - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }

    /// Clears the delay lines, keeping coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

fn rbj_terms(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32) {
    let nyquist = sample_rate * 0.5;
    let frequency = frequency.clamp(1.0, nyquist * 0.99);
    let omega = 2.0 * PI * frequency / sample_rate;
    (omega.cos(), omega.sin() / (2.0 * q))
}

/// Low-pass coefficients `(b0, b1, b2, a0, a1, a2)`.
pub fn lowpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32, f32, f32, f32, f32) {
    let (cos_omega, alpha) = rbj_terms(frequency, q, sample_rate);
    let b1 = 1.0 - cos_omega;
    (b1 / 2.0, b1, b1 / 2.0, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// High-pass coefficients `(b0, b1, b2, a0, a1, a2)`.
pub fn highpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32, f32, f32, f32, f32) {
    let (cos_omega, alpha) = rbj_terms(frequency, q, sample_rate);
    let b0 = (1.0 + cos_omega) / 2.0;
    (b0, -(1.0 + cos_omega), b0, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// Band-pass built from a high-pass at `low_hz` followed by a low-pass at
/// `high_hz`, each a cascade of `order` Butterworth sections.
#[derive(Debug, Clone)]
pub struct BandPass {
    sections: Vec<Biquad>,
}

impl BandPass {
    /// Designs the filter. Cutoffs are clamped below Nyquist.
    pub fn new(low_hz: f32, high_hz: f32, sample_rate: f32, order: usize) -> Self {
        const BUTTERWORTH_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;
        let order = order.max(1);
        let mut sections = Vec::with_capacity(order * 2);
        for _ in 0..order {
            sections.push(Biquad::from_coefficients(highpass_coefficients(
                low_hz,
                BUTTERWORTH_Q,
                sample_rate,
            )));
        }
        for _ in 0..order {
            sections.push(Biquad::from_coefficients(lowpass_coefficients(
                high_hz,
                BUTTERWORTH_Q,
                sample_rate,
            )));
        }
        Self { sections }
    }

    /// Filters `samples`, carrying state across calls.
    pub fn process_block(&mut self, samples: &[f32]) -> Vec<f32> {
        samples
            .iter()
            .map(|&x| self.sections.iter_mut().fold(x, |acc, s| s.process(acc)))
            .collect()
    }

    /// Resets every section's state.
    pub fn clear(&mut self) {
        self.sections.iter_mut().for_each(Biquad::clear);
    }
}

/// Normalized Gaussian kernel truncated at four standard deviations.
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (4.0 * sigma + 0.5) as i32;
    let weights: Vec<f32> = (-radius..=radius)
        .map(|x| (-(x * x) as f32 / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Mirror index into `0..len` the way a half-sample reflect boundary does:
/// `-1 → 0`, `-2 → 1`, `len → len-1`.
fn reflect(index: isize, len: usize) -> usize {
    let len = len as isize;
    let period = 2 * len;
    let mut i = index.rem_euclid(period);
    if i >= len {
        i = period - 1 - i;
    }
    i as usize
}

/// Blurs `pixels` in place with a Gaussian of width `sigma` (in pixels).
pub fn gaussian_blur(pixels: &mut [Rgb], sigma: f32) {
    if pixels.len() < 2 || sigma <= 0.0 {
        return;
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    let source = pixels.to_vec();
    for (i, out) in pixels.iter_mut().enumerate() {
        let mut acc = Rgb::BLACK;
        for (k, w) in kernel.iter().enumerate() {
            let j = reflect(i as isize + k as isize - radius, source.len());
            acc = acc.zip_with(source[j].scale(*w), |a, b| a + b);
        }
        *out = acc;
    }
}

/// Linear resampling of `values` onto `len` evenly spaced points spanning
/// the same range.
pub fn interpolate(values: &[f32], len: usize) -> Vec<f32> {
    match (values.len(), len) {
        (_, 0) => Vec::new(),
        (0, _) => vec![0.0; len],
        (1, _) => vec![values[0]; len],
        (_, 1) => vec![values[0]],
        (n, _) => (0..len)
            .map(|i| {
                let pos = i as f32 * (n - 1) as f32 / (len - 1) as f32;
                let lo = (pos.floor() as usize).min(n - 1);
                let hi = (lo + 1).min(n - 1);
                let frac = pos - lo as f32;
                values[lo] + (values[hi] - values[lo]) * frac
            })
            .collect(),
    }
}

/// Hamming window of `len` points.
pub fn hamming(len: usize) -> Vec<f32> {
    if len < 2 {
        return vec![1.0; len];
    }
    (0..len)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f32 / (len - 1) as f32).cos())
        .collect()
}

/// Convolution of `signal` with `kernel`, truncated to the length of
/// `signal` and centered.
pub fn convolve_same(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    if kernel.is_empty() {
        return signal.to_vec();
    }
    let offset = (kernel.len() - 1) / 2;
    (0..signal.len())
        .map(|i| {
            let n = i + offset;
            kernel
                .iter()
                .enumerate()
                .filter_map(|(k, w)| n.checked_sub(k).and_then(|j| signal.get(j)).map(|s| s * w))
                .sum()
        })
        .collect()
}

/// Root-mean-square of `values`; zero when empty.
pub fn rms(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|v| v * v).sum::<f32>() / values.len() as f32).sqrt()
}

/// Amplitude to decibels with a floor at `1e-16`.
pub fn amplitude_to_db(amplitude: f32) -> f32 {
    20.0 * amplitude.max(1e-16).log10()
}

/// Frequency in Hz to the Bark scale.
pub fn hz_to_bark(hz: f32) -> f32 {
    13.0 * (0.00076 * hz).atan() + 3.5 * (hz / 7500.0).powi(2).atan()
}
