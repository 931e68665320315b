//! Afterglow compositor.

use lumen_core::param::{param_map, validate_partial};
use lumen_core::{
    Effect, ParamDescriptor, ParamError, ParamLookup, ParamMap, ParamUnit, ParamValue, Pixels, ProcessError, Rgb,
    Signal, UpdateContext,
};

use crate::pixels_input;

/// Lets bright pixels fade out instead of switching off.
///
/// Each tick the held trail decays by `exp(-dt / glow_time)` and is then
/// maxed channel-wise with the input. A `glow_time` of zero passes the
/// input straight through.
///
/// Inputs: `0` pixels. While the input is absent the trail keeps fading and
/// is still emitted; the output is absent only if nothing has been seen yet.
/// Outputs: `0` pixels.
#[derive(Debug, Clone)]
pub struct AfterGlow {
    initial_glow_time: f64,
    glow_time: f64,
    dt: f64,
    trail: Vec<Rgb>,
}

impl AfterGlow {
    /// Registry name.
    pub const TYPE_NAME: &'static str = "effects.AfterGlow";

    /// Creates the effect.
    pub fn new(glow_time: f64) -> Self {
        let glow_time = glow_time.clamp(0.0, 5.0);
        Self {
            initial_glow_time: glow_time,
            glow_time,
            dt: 0.0,
            trail: Vec::new(),
        }
    }

    fn glow_time_param() -> ParamDescriptor {
        ParamDescriptor::float("glow_time", 1.0, 0.0, 5.0, 0.01)
            .with_unit(ParamUnit::Seconds)
            .with_description("Time constant of the fade")
    }

    /// Construction parameters.
    pub fn constructor_schema() -> Vec<ParamDescriptor> {
        vec![Self::glow_time_param()]
    }

    /// Builds from construction parameters; missing ones take defaults.
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        let p = lumen_core::param::resolve(&Self::constructor_schema(), params)?;
        Ok(Self::new(p.f64_or("glow_time", 1.0)))
    }

    fn decay(&self) -> f32 {
        if self.glow_time <= 0.0 {
            0.0
        } else {
            (-self.dt / self.glow_time).exp() as f32
        }
    }
}

impl Effect for AfterGlow {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn constructor_params(&self) -> ParamMap {
        param_map([("glow_time", ParamValue::Float(self.initial_glow_time))])
    }

    fn parameter_schema(&self) -> Vec<ParamDescriptor> {
        vec![Self::glow_time_param()]
    }

    fn parameter_values(&self) -> ParamMap {
        param_map([("glow_time", ParamValue::Float(self.glow_time))])
    }

    fn apply_parameters(&mut self, values: &ParamMap) -> Result<(), ParamError> {
        let v = validate_partial(&self.parameter_schema(), values)?;
        self.glow_time = v.f64_or("glow_time", self.glow_time);
        Ok(())
    }

    fn advance_time(&mut self, ctx: &UpdateContext) {
        self.dt = ctx.dt;
    }

    fn process(&mut self, inputs: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
        let decay = self.decay();
        match pixels_input(inputs, 0)? {
            Some(pixels) if pixels.len() == self.trail.len() => {
                for (held, new) in self.trail.iter_mut().zip(pixels.iter()) {
                    *held = held.scale(decay).zip_with(*new, f32::max);
                }
            }
            Some(pixels) => self.trail = pixels.to_vec(),
            None => {
                for held in &mut self.trail {
                    *held = held.scale(decay);
                }
            }
        }
        if !self.trail.is_empty() {
            outputs[0] = Some(Signal::Pixels(Pixels::new(self.trail.clone())));
        }
        Ok(())
    }
}
