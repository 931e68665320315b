//! Color generators.
//!
//! These produce pixel tables used as color inputs by the visualizers:
//! a fixed color, a slowly rotating hue wheel, and an HSV gradient between
//! two colors.

use std::f64::consts::TAU;

use lumen_core::param::{resolve, validate_partial};
use lumen_core::{
    Effect, ParamDescriptor, ParamError, ParamLookup, ParamMap, ParamUnit, ParamValue, Pixels, ProcessError, Rgb,
    Signal, UpdateContext,
};

use crate::pixels_input;

fn channel(name: &'static str, default: f64) -> ParamDescriptor {
    ParamDescriptor::float(name, default, 0.0, 255.0, 1.0).with_unit(ParamUnit::Intensity)
}

fn rgb_params(color: Rgb) -> [(&'static str, ParamValue); 3] {
    [
        ("r", ParamValue::Float(f64::from(color.r))),
        ("g", ParamValue::Float(f64::from(color.g))),
        ("b", ParamValue::Float(f64::from(color.b))),
    ]
}

// ============================================================================
// StaticRGBColor
// ============================================================================

/// A constant color on every pixel.
///
/// Inputs: none. Outputs: `0` pixels.
#[derive(Debug, Clone)]
pub struct StaticRgbColor {
    num_pixels: usize,
    color: Rgb,
    initial: Rgb,
    table: Pixels,
}

impl StaticRgbColor {
    /// Registry name.
    pub const TYPE_NAME: &'static str = "colors.StaticRGBColor";

    /// Creates the generator.
    pub fn new(num_pixels: usize, color: Rgb) -> Self {
        let color = color.clamped();
        Self {
            num_pixels,
            color,
            initial: color,
            table: Pixels::filled(num_pixels, color),
        }
    }

    /// Construction parameters.
    pub fn constructor_schema() -> Vec<ParamDescriptor> {
        vec![
            ParamDescriptor::num_pixels(300),
            channel("r", 255.0),
            channel("g", 255.0),
            channel("b", 255.0),
        ]
    }

    /// Builds from construction parameters; missing ones take defaults.
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        let p = resolve(&Self::constructor_schema(), params)?;
        Ok(Self::new(
            p.usize_or("num_pixels", 300),
            Rgb::new(p.f32_or("r", 255.0), p.f32_or("g", 255.0), p.f32_or("b", 255.0)),
        ))
    }

    /// Current color.
    pub fn color(&self) -> Rgb {
        self.color
    }
}

impl Effect for StaticRgbColor {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn num_inputs(&self) -> usize {
        0
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn constructor_params(&self) -> ParamMap {
        let mut map: ParamMap = rgb_params(self.initial).into_iter().map(|(k, v)| (k.to_owned(), v)).collect();
        map.insert("num_pixels".into(), ParamValue::from(self.num_pixels));
        map
    }

    fn parameter_schema(&self) -> Vec<ParamDescriptor> {
        vec![channel("r", 255.0), channel("g", 255.0), channel("b", 255.0)]
    }

    fn parameter_values(&self) -> ParamMap {
        rgb_params(self.color).into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }

    fn apply_parameters(&mut self, values: &ParamMap) -> Result<(), ParamError> {
        let v = validate_partial(&self.parameter_schema(), values)?;
        self.color = Rgb::new(
            v.f32_or("r", self.color.r),
            v.f32_or("g", self.color.g),
            v.f32_or("b", self.color.b),
        );
        self.table = Pixels::filled(self.num_pixels, self.color);
        Ok(())
    }

    fn process(&mut self, _: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
        outputs[0] = Some(Signal::Pixels(self.table.clone()));
        Ok(())
    }
}

// ============================================================================
// ColorWheel
// ============================================================================

/// Converts hue, lightness and saturation (all `0..=1`) to RGB.
fn from_hls(hue: f64, lightness: f64, saturation: f64) -> Rgb {
    fn component(m1: f64, m2: f64, hue: f64) -> f64 {
        let hue = hue.rem_euclid(1.0);
        if hue < 1.0 / 6.0 {
            m1 + (m2 - m1) * hue * 6.0
        } else if hue < 0.5 {
            m2
        } else if hue < 2.0 / 3.0 {
            m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
        } else {
            m1
        }
    }
    if saturation <= 0.0 {
        let v = (lightness * 255.0) as f32;
        return Rgb::new(v, v, v);
    }
    let m2 = if lightness <= 0.5 {
        lightness * (1.0 + saturation)
    } else {
        lightness + saturation - lightness * saturation
    };
    let m1 = 2.0 * lightness - m2;
    Rgb::new(
        (component(m1, m2, hue + 1.0 / 3.0) * 255.0) as f32,
        (component(m1, m2, hue) * 255.0) as f32,
        (component(m1, m2, hue - 1.0 / 3.0) * 255.0) as f32,
    )
}

/// Rotates the hue of a uniform color over time.
///
/// One full revolution takes `cycle_time` seconds. An optional sinusoidal
/// wiggle of `wiggle_amplitude` turns with period `wiggle_time` is added on
/// top.
///
/// Inputs: none. Outputs: `0` pixels.
#[derive(Debug, Clone)]
pub struct ColorWheel {
    num_pixels: usize,
    initial_cycle_time: f64,
    cycle_time: f64,
    offset: f64,
    luminocity: f64,
    saturation: f64,
    wiggle_amplitude: f64,
    wiggle_time: f64,
    time: f64,
}

impl ColorWheel {
    /// Registry name.
    pub const TYPE_NAME: &'static str = "colors.ColorWheel";

    /// Creates a wheel with default color settings.
    pub fn new(num_pixels: usize, cycle_time: f64) -> Self {
        let cycle_time = cycle_time.max(0.1);
        Self {
            num_pixels,
            initial_cycle_time: cycle_time,
            cycle_time,
            offset: 0.0,
            luminocity: 0.5,
            saturation: 1.0,
            wiggle_amplitude: 0.0,
            wiggle_time: 0.0,
            time: 0.0,
        }
    }

    /// Construction parameters.
    pub fn constructor_schema() -> Vec<ParamDescriptor> {
        vec![ParamDescriptor::num_pixels(300), Self::cycle_time_param()]
    }

    fn cycle_time_param() -> ParamDescriptor {
        ParamDescriptor::float("cycle_time", 30.0, 0.1, 1000.0, 0.1)
            .with_unit(ParamUnit::Seconds)
            .with_description("Seconds per full hue revolution")
    }

    /// Builds from construction parameters; missing ones take defaults.
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        let p = resolve(&Self::constructor_schema(), params)?;
        Ok(Self::new(p.usize_or("num_pixels", 300), p.f64_or("cycle_time", 30.0)))
    }

    /// Hue in turns at the current clock.
    pub fn hue(&self) -> f64 {
        let mut hue = self.time / self.cycle_time + self.offset;
        if self.wiggle_time > 0.0 {
            hue += (TAU * self.time / self.wiggle_time).sin() * self.wiggle_amplitude;
        }
        hue.rem_euclid(1.0)
    }

    /// Color at the current clock.
    pub fn current_color(&self) -> Rgb {
        from_hls(self.hue(), self.luminocity, self.saturation)
    }
}

impl Effect for ColorWheel {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn num_inputs(&self) -> usize {
        0
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn constructor_params(&self) -> ParamMap {
        lumen_core::param::param_map([
            ("num_pixels", ParamValue::from(self.num_pixels)),
            ("cycle_time", ParamValue::Float(self.initial_cycle_time)),
        ])
    }

    fn parameter_schema(&self) -> Vec<ParamDescriptor> {
        vec![
            Self::cycle_time_param(),
            ParamDescriptor::float("offset", 0.0, 0.0, 1.0, 0.01).with_description("Hue offset in turns"),
            ParamDescriptor::float("luminocity", 0.5, 0.0, 1.0, 0.01),
            ParamDescriptor::float("saturation", 1.0, 0.0, 1.0, 0.01),
            ParamDescriptor::float("wiggle_amplitude", 0.0, 0.0, 1.0, 0.01),
            ParamDescriptor::float("wiggle_time", 0.0, 0.0, 1000.0, 0.1).with_unit(ParamUnit::Seconds),
        ]
    }

    fn parameter_values(&self) -> ParamMap {
        lumen_core::param::param_map([
            ("cycle_time", ParamValue::Float(self.cycle_time)),
            ("offset", ParamValue::Float(self.offset)),
            ("luminocity", ParamValue::Float(self.luminocity)),
            ("saturation", ParamValue::Float(self.saturation)),
            ("wiggle_amplitude", ParamValue::Float(self.wiggle_amplitude)),
            ("wiggle_time", ParamValue::Float(self.wiggle_time)),
        ])
    }

    fn apply_parameters(&mut self, values: &ParamMap) -> Result<(), ParamError> {
        let v = validate_partial(&self.parameter_schema(), values)?;
        self.cycle_time = v.f64_or("cycle_time", self.cycle_time);
        self.offset = v.f64_or("offset", self.offset);
        self.luminocity = v.f64_or("luminocity", self.luminocity);
        self.saturation = v.f64_or("saturation", self.saturation);
        self.wiggle_amplitude = v.f64_or("wiggle_amplitude", self.wiggle_amplitude);
        self.wiggle_time = v.f64_or("wiggle_time", self.wiggle_time);
        Ok(())
    }

    fn advance_time(&mut self, ctx: &UpdateContext) {
        self.time = ctx.time;
    }

    fn process(&mut self, _: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
        outputs[0] = Some(Signal::Pixels(Pixels::filled(self.num_pixels, self.current_color())));
        Ok(())
    }
}

// ============================================================================
// InterpolateHSV
// ============================================================================

/// Gradient from the first color of input 0 to the first color of input 1,
/// interpolated linearly in HSV.
///
/// Inputs: `0` start color (absent reads as red), `1` end color (absent
/// reads as blue). Outputs: `0` pixels.
#[derive(Debug, Clone)]
pub struct InterpolateHsv {
    num_pixels: usize,
}

impl InterpolateHsv {
    /// Registry name.
    pub const TYPE_NAME: &'static str = "colors.InterpolateHSV";

    /// Creates the gradient generator.
    pub fn new(num_pixels: usize) -> Self {
        Self { num_pixels }
    }

    /// Construction parameters.
    pub fn constructor_schema() -> Vec<ParamDescriptor> {
        vec![ParamDescriptor::num_pixels(300)]
    }

    /// Builds from construction parameters; missing ones take defaults.
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        let p = resolve(&Self::constructor_schema(), params)?;
        Ok(Self::new(p.usize_or("num_pixels", 300)))
    }

    /// The gradient between two colors.
    pub fn gradient(&self, start: Rgb, end: Rgb) -> Vec<Rgb> {
        hsv_gradient(start, end, self.num_pixels)
    }
}

/// `len` colors evenly spaced in HSV from `start` to `end`, both inclusive.
pub(crate) fn hsv_gradient(start: Rgb, end: Rgb, len: usize) -> Vec<Rgb> {
    let (h0, s0, v0) = start.to_hsv();
    let (h1, s1, v1) = end.to_hsv();
    (0..len)
        .map(|i| {
            let t = if len > 1 { i as f32 / (len - 1) as f32 } else { 0.0 };
            Rgb::from_hsv(h0 + (h1 - h0) * t, s0 + (s1 - s0) * t, v0 + (v1 - v0) * t)
        })
        .collect()
}

impl Effect for InterpolateHsv {
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
        lumen_core::param::param_map([("num_pixels", ParamValue::from(self.num_pixels))])
    }

    fn process(&mut self, inputs: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
        let start = pixels_input(inputs, 0)?
            .and_then(|p| p.first().copied())
            .unwrap_or(Rgb::RED);
        let end = pixels_input(inputs, 1)?
            .and_then(|p| p.first().copied())
            .unwrap_or(Rgb::BLUE);
        outputs[0] = Some(Signal::Pixels(Pixels::new(self.gradient(start, end))));
        Ok(())
    }
}
