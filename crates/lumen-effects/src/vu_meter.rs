//! VU meter visualizers.
//!
//! A bar grows from the start of the strip with the audio level in decibels.
//! The level is held over the last `n_overlaps + 1` blocks, as an RMS of
//! block RMS values or as the maximum of block peaks.
//!
//! Without a color input the bar uses a built-in gradient: green up to −24 dB
//! below full scale, then an HSV sweep from green to red. The gradient is a
//! derived cache. Changing `db_range` rebuilds it but keeps the level history.

use std::collections::VecDeque;

use lumen_core::param::{param_map, resolve, validate_partial};
use lumen_core::{
    Effect, ParamDescriptor, ParamError, ParamLookup, ParamMap, ParamUnit, ParamValue, Pixels, ProcessError, Rgb,
    Signal,
};

use crate::colors::hsv_gradient;
use crate::dsp::{amplitude_to_db, rms};
use crate::{audio_input, pixels_input};

/// Level below full scale where the default gradient leaves pure green.
const GRADIENT_KNEE_DB: f64 = -24.0;

/// How block levels are measured and held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VuMode {
    /// RMS of each block; the held level is the RMS of those values.
    Rms,
    /// Largest sample of each block; the held level is their maximum.
    Peak,
}

/// Decibel-scaled level bar.
///
/// Inputs: `0` audio (absent in, absent out), `1` color table (absent reads
/// as the built-in gradient). Outputs: `0` pixels.
#[derive(Debug, Clone)]
pub struct VuMeter {
    mode: VuMode,
    num_pixels: usize,
    initial: (f64, usize),
    db_range: f64,
    n_overlaps: usize,
    hold: VecDeque<f32>,
    gradient: Vec<Rgb>,
}

impl VuMeter {
    /// Registry name of the RMS variant.
    pub const RMS_TYPE_NAME: &'static str = "audioreactive.VUMeterRMS";
    /// Registry name of the peak variant.
    pub const PEAK_TYPE_NAME: &'static str = "audioreactive.VUMeterPeak";

    /// Creates a meter.
    pub fn new(mode: VuMode, num_pixels: usize, db_range: f64, n_overlaps: usize) -> Self {
        let db_range = db_range.clamp(20.0, 100.0);
        let n_overlaps = n_overlaps.min(20);
        Self {
            mode,
            num_pixels,
            initial: (db_range, n_overlaps),
            db_range,
            n_overlaps,
            hold: VecDeque::new(),
            gradient: default_gradient(num_pixels, db_range),
        }
    }

    fn tunable_schema() -> Vec<ParamDescriptor> {
        vec![
            ParamDescriptor::float("db_range", 60.0, 20.0, 100.0, 1.0)
                .with_unit(ParamUnit::Decibels)
                .with_description("Level span covered by the full bar"),
            ParamDescriptor::int("n_overlaps", 1, 0, 20).with_description("Extra blocks held in the level"),
        ]
    }

    /// Construction parameters.
    pub fn constructor_schema() -> Vec<ParamDescriptor> {
        let mut schema = vec![ParamDescriptor::num_pixels(300)];
        schema.extend(Self::tunable_schema());
        schema
    }

    /// Builds from construction parameters; missing ones take defaults.
    pub fn from_params(mode: VuMode, params: &ParamMap) -> Result<Self, ParamError> {
        let p = resolve(&Self::constructor_schema(), params)?;
        Ok(Self::new(
            mode,
            p.usize_or("num_pixels", 300),
            p.f64_or("db_range", 60.0),
            p.usize_or("n_overlaps", 1),
        ))
    }

    /// Number of lit pixels for a level of `db` decibels.
    pub fn bar_length(&self, db: f32) -> usize {
        let n = self.num_pixels as f64;
        let scaled = (n * (self.db_range + f64::from(db)) / self.db_range).trunc();
        scaled.clamp(0.0, (n - 1.0).max(0.0)) as usize
    }

    /// The built-in color table.
    pub fn gradient(&self) -> &[Rgb] {
        &self.gradient
    }

    /// Number of block levels currently held.
    pub fn held_levels(&self) -> usize {
        self.hold.len()
    }

    fn held_level(&mut self, block_level: f32) -> f32 {
        while self.hold.len() > self.n_overlaps {
            self.hold.pop_back();
        }
        self.hold.push_front(block_level);
        match self.mode {
            VuMode::Rms => rms(self.hold.make_contiguous()),
            VuMode::Peak => self.hold.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        }
    }
}

/// Green up to the knee, then an inclusive HSV sweep from green to red.
///
/// When `db_range` is narrower than the knee the sweep is longer than the
/// strip and only its start is used.
fn default_gradient(num_pixels: usize, db_range: f64) -> Vec<Rgb> {
    let n = num_pixels as i64;
    let knee = (num_pixels as f64 * (db_range + GRADIENT_KNEE_DB) / db_range) as i64;
    let sweep_len = (n - knee).max(0) as usize;
    let mut table: Vec<Rgb> = std::iter::repeat_n(Rgb::GREEN, knee.clamp(0, n) as usize).collect();
    table.extend(hsv_gradient(Rgb::GREEN, Rgb::RED, sweep_len));
    table.truncate(num_pixels);
    table
}

impl Effect for VuMeter {
    fn type_name(&self) -> &'static str {
        match self.mode {
            VuMode::Rms => Self::RMS_TYPE_NAME,
            VuMode::Peak => Self::PEAK_TYPE_NAME,
        }
    }

    fn num_inputs(&self) -> usize {
        2
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn constructor_params(&self) -> ParamMap {
        param_map([
            ("num_pixels", ParamValue::from(self.num_pixels)),
            ("db_range", ParamValue::Float(self.initial.0)),
            ("n_overlaps", ParamValue::from(self.initial.1)),
        ])
    }

    fn parameter_schema(&self) -> Vec<ParamDescriptor> {
        Self::tunable_schema()
    }

    fn parameter_values(&self) -> ParamMap {
        param_map([
            ("db_range", ParamValue::Float(self.db_range)),
            ("n_overlaps", ParamValue::from(self.n_overlaps)),
        ])
    }

    fn apply_parameters(&mut self, values: &ParamMap) -> Result<(), ParamError> {
        let v = validate_partial(&Self::tunable_schema(), values)?;
        let db_range = v.f64_or("db_range", self.db_range);
        if db_range != self.db_range {
            self.db_range = db_range;
            self.gradient = default_gradient(self.num_pixels, db_range);
        }
        self.n_overlaps = v.usize_or("n_overlaps", self.n_overlaps);
        Ok(())
    }

    fn process(&mut self, inputs: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
        let Some(audio) = audio_input(inputs, 0)? else {
            return Ok(());
        };
        let table = pixels_input(inputs, 1)?;

        let block_level = match self.mode {
            VuMode::Rms => audio.rms(),
            VuMode::Peak => audio.peak(),
        };
        let level = self.held_level(block_level);
        let lit = self.bar_length(amplitude_to_db(level));

        // A color table too short for the bar falls back to the gradient.
        let color = match table {
            Some(table) if table.len() >= lit => table.as_slice(),
            _ => self.gradient.as_slice(),
        };
        let mut bar = vec![Rgb::BLACK; self.num_pixels];
        bar[..lit].copy_from_slice(&color[..lit]);
        outputs[0] = Some(Signal::Pixels(Pixels::new(bar)));
        Ok(())
    }
}
