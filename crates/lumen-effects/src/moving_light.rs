//! Moving light visualizer.
//!
//! Band-passed audio peaks light up the first pixel, and the strip scrolls
//! towards its end at `speed` pixels per second while dimming over
//! `dim_time`. Pixel state persists across ticks; changing the cutoffs
//! redesigns the filter but keeps the trail.

use lumen_core::param::{param_map, resolve, validate_partial};
use lumen_core::{
    Effect, ParamDescriptor, ParamError, ParamLookup, ParamMap, ParamUnit, ParamValue, Pixels, ProcessError, Rgb,
    Signal, UpdateContext,
};

use crate::dsp::{BandPass, gaussian_blur};
use crate::{audio_input, pixels_input};

const FILTER_ORDER: usize = 3;
const SMOOTHING_SIGMA: f32 = 0.5;

/// Tunable settings, kept together so updates can be validated as a whole.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Settings {
    speed: f64,
    dim_time: f64,
    lowcut_hz: f64,
    highcut_hz: f64,
    peak_scale: f64,
    peak_filter: f64,
    highlight: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: 100.0,
            dim_time: 2.5,
            lowcut_hz: 50.0,
            highcut_hz: 300.0,
            peak_scale: 4.0,
            peak_filter: 2.6,
            highlight: 0.6,
        }
    }
}

impl Settings {
    fn from_lookup(p: &ParamMap, base: Settings) -> Self {
        Self {
            speed: p.f64_or("speed", base.speed),
            dim_time: p.f64_or("dim_time", base.dim_time),
            lowcut_hz: p.f64_or("lowcut_hz", base.lowcut_hz),
            highcut_hz: p.f64_or("highcut_hz", base.highcut_hz),
            peak_scale: p.f64_or("peak_scale", base.peak_scale),
            peak_filter: p.f64_or("peak_filter", base.peak_filter),
            highlight: p.f64_or("highlight", base.highlight),
        }
    }

    fn to_map(self) -> ParamMap {
        param_map([
            ("speed", ParamValue::Float(self.speed)),
            ("dim_time", ParamValue::Float(self.dim_time)),
            ("lowcut_hz", ParamValue::Float(self.lowcut_hz)),
            ("highcut_hz", ParamValue::Float(self.highcut_hz)),
            ("peak_scale", ParamValue::Float(self.peak_scale)),
            ("peak_filter", ParamValue::Float(self.peak_filter)),
            ("highlight", ParamValue::Float(self.highlight)),
        ])
    }
}

/// Peaks that travel along the strip.
///
/// Inputs: `0` audio (absent in, absent out), `1` color, of which only the
/// first pixel is used (absent reads as white). Outputs: `0` pixels.
#[derive(Debug, Clone)]
pub struct MovingLight {
    num_pixels: usize,
    sample_rate: f32,
    initial: Settings,
    settings: Settings,
    filter: BandPass,
    state: Vec<Rgb>,
    time: f64,
    last_time: f64,
    last_move_time: f64,
}

impl MovingLight {
    /// Registry name.
    pub const TYPE_NAME: &'static str = "audioreactive.MovingLight";

    /// Creates the effect with default tunables.
    pub fn new(num_pixels: usize, sample_rate: f32) -> Self {
        Self::with_settings(num_pixels, sample_rate, Settings::default())
    }

    fn with_settings(num_pixels: usize, sample_rate: f32, settings: Settings) -> Self {
        Self {
            num_pixels,
            sample_rate,
            initial: settings,
            settings,
            filter: design_filter(settings, sample_rate),
            state: vec![Rgb::BLACK; num_pixels],
            time: 0.0,
            last_time: 0.0,
            last_move_time: 0.0,
        }
    }

    /// Sets the scroll speed in pixels per second.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.settings.speed = speed.clamp(1.0, 200.0);
        self.initial = self.settings;
        self
    }

    /// Sets the time in seconds over which the trail dims out.
    pub fn with_dim_time(mut self, dim_time: f64) -> Self {
        self.settings.dim_time = dim_time.clamp(0.01, 10.0);
        self.initial = self.settings;
        self
    }

    /// Sets the band-pass cutoffs.
    pub fn with_band(mut self, lowcut_hz: f64, highcut_hz: f64) -> Self {
        self.settings.lowcut_hz = lowcut_hz.clamp(0.0, 8000.0);
        self.settings.highcut_hz = highcut_hz.clamp(0.0, 8000.0);
        self.initial = self.settings;
        self.filter = design_filter(self.settings, self.sample_rate);
        self
    }

    fn tunable_schema() -> Vec<ParamDescriptor> {
        let d = Settings::default();
        vec![
            ParamDescriptor::float("speed", d.speed, 1.0, 200.0, 1.0)
                .with_unit(ParamUnit::PixelsPerSecond)
                .with_description("Scroll speed"),
            ParamDescriptor::float("dim_time", d.dim_time, 0.01, 10.0, 0.01)
                .with_unit(ParamUnit::Seconds)
                .with_description("Time for the trail to fade out"),
            ParamDescriptor::float("lowcut_hz", d.lowcut_hz, 0.0, 8000.0, 1.0).with_unit(ParamUnit::Hertz),
            ParamDescriptor::float("highcut_hz", d.highcut_hz, 0.0, 8000.0, 1.0).with_unit(ParamUnit::Hertz),
            ParamDescriptor::float("peak_scale", d.peak_scale, 0.0, 5.0, 0.01),
            ParamDescriptor::float("peak_filter", d.peak_filter, 0.0, 10.0, 0.01)
                .with_description("Exponent applied to the peak"),
            ParamDescriptor::float("highlight", d.highlight, 0.0, 1.0, 0.01)
                .with_unit(ParamUnit::Intensity)
                .with_description("White added on top of the color"),
        ]
    }

    /// Construction parameters.
    pub fn constructor_schema() -> Vec<ParamDescriptor> {
        let mut schema = vec![
            ParamDescriptor::num_pixels(300),
            ParamDescriptor::sample_rate("fs", 48000.0),
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
            Settings::from_lookup(&p, Settings::default()),
        ))
    }

    /// Current pixel state.
    pub fn state(&self) -> &[Rgb] {
        &self.state
    }

    fn scroll(&mut self) {
        let dt_move = self.time - self.last_move_time;
        if dt_move * self.settings.speed <= 1.0 || self.num_pixels < 2 {
            return;
        }
        let shift = ((dt_move * self.settings.speed) as usize).clamp(1, self.num_pixels - 1);
        let origin = self.state[0];
        self.state.rotate_right(shift);
        self.state[..shift].fill(origin);
        let edge = (2 * shift).min(self.num_pixels);
        gaussian_blur(&mut self.state[..edge], SMOOTHING_SIGMA);
        self.last_move_time = self.time;
    }
}

fn design_filter(settings: Settings, sample_rate: f32) -> BandPass {
    BandPass::new(
        settings.lowcut_hz as f32,
        settings.highcut_hz as f32,
        sample_rate,
        FILTER_ORDER,
    )
}

impl Effect for MovingLight {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn num_inputs(&self) -> usize {
        2
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn constructor_params(&self) -> ParamMap {
        let mut map = self.initial.to_map();
        map.insert("num_pixels".into(), ParamValue::from(self.num_pixels));
        map.insert("fs".into(), ParamValue::from(self.sample_rate));
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
        let next = Settings::from_lookup(&v, self.settings);
        if next.lowcut_hz != self.settings.lowcut_hz || next.highcut_hz != self.settings.highcut_hz {
            self.filter = design_filter(next, self.sample_rate);
        }
        self.settings = next;
        Ok(())
    }

    fn advance_time(&mut self, ctx: &UpdateContext) {
        self.time = ctx.time;
    }

    fn process(&mut self, inputs: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
        let Some(audio) = audio_input(inputs, 0)? else {
            return Ok(());
        };
        let color = pixels_input(inputs, 1)?
            .and_then(|p| p.first().copied())
            .unwrap_or(Rgb::WHITE);

        let filtered = self.filter.process_block(audio.samples());
        self.scroll();

        let dt = self.time - self.last_time;
        self.last_time = self.time;
        let dim = (1.0 - dt / self.settings.dim_time) as f32;
        for p in &mut self.state {
            *p = p.scale(dim);
        }
        gaussian_blur(&mut self.state, SMOOTHING_SIGMA);
        gaussian_blur(&mut self.state, SMOOTHING_SIGMA);

        // A negative peak with a fractional exponent is NaN and lands as black.
        let peak = filtered.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let peak = peak.powf(self.settings.peak_filter as f32) * self.settings.peak_scale as f32;
        let white = self.settings.highlight as f32 * peak * 255.0;
        if let Some(origin) = self.state.first_mut() {
            *origin = Rgb::new(
                color.r * peak + white,
                color.g * peak + white,
                color.b * peak + white,
            );
        }
        for p in &mut self.state {
            *p = Rgb::new(sanitize(p.r), sanitize(p.g), sanitize(p.b));
        }

        outputs[0] = Some(Signal::Pixels(Pixels::new(self.state.clone())));
        Ok(())
    }
}

fn sanitize(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 255.0) }
}
