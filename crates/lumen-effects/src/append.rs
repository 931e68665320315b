//! Append compositor.

use lumen_core::param::validate_partial;
use lumen_core::{Effect, ParamDescriptor, ParamError, ParamLookup, ParamMap, ParamValue, Pixels, ProcessError, Signal};

use crate::pixels_input;

const MAX_CHANNELS: i64 = 16;

/// Concatenates its pixel inputs in channel order.
///
/// Each input can be reversed before it is appended with a `flip{i}` flag.
/// Absent inputs are skipped; when every input is absent the output is
/// absent.
///
/// Inputs: `0..num_channels` pixels. Outputs: `0` pixels.
#[derive(Debug, Clone)]
pub struct Append {
    flips: Vec<bool>,
}

impl Append {
    /// Registry name.
    pub const TYPE_NAME: &'static str = "effects.Append";

    /// Creates an append over `num_channels` inputs, none flipped.
    pub fn new(num_channels: usize) -> Self {
        Self {
            flips: vec![false; num_channels.max(1)],
        }
    }

    /// Sets the flip flag of one input. Out-of-range indices are ignored.
    pub fn with_flip(mut self, channel: usize, flip: bool) -> Self {
        if let Some(slot) = self.flips.get_mut(channel) {
            *slot = flip;
        }
        self
    }

    fn num_channels_param() -> ParamDescriptor {
        ParamDescriptor::int("num_channels", 2, 1, MAX_CHANNELS).with_description("Number of inputs")
    }

    fn flip_params(n: usize) -> impl Iterator<Item = ParamDescriptor> {
        (0..n).map(|i| ParamDescriptor::boolean(format!("flip{i}"), false))
    }

    /// Construction parameters, listed for the default two inputs.
    ///
    /// `flip{i}` is accepted for every `i < num_channels`.
    pub fn constructor_schema() -> Vec<ParamDescriptor> {
        std::iter::once(Self::num_channels_param()).chain(Self::flip_params(2)).collect()
    }

    /// Builds from construction parameters; missing ones take defaults.
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        let descriptor = Self::num_channels_param();
        let n = match params.get("num_channels") {
            Some(value) => descriptor.validate(value)?.as_i64().unwrap_or(2),
            None => 2,
        } as usize;
        let schema: Vec<ParamDescriptor> = std::iter::once(descriptor).chain(Self::flip_params(n)).collect();
        let p = validate_partial(&schema, params)?;
        let flips = (0..n).map(|i| p.bool_or(&format!("flip{i}"), false)).collect();
        Ok(Self { flips })
    }

    fn flip_map(&self) -> ParamMap {
        self.flips
            .iter()
            .enumerate()
            .map(|(i, f)| (format!("flip{i}"), ParamValue::Bool(*f)))
            .collect()
    }
}

impl Effect for Append {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn num_inputs(&self) -> usize {
        self.flips.len()
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn constructor_params(&self) -> ParamMap {
        let mut map = self.flip_map();
        map.insert("num_channels".into(), ParamValue::from(self.flips.len()));
        map
    }

    fn parameter_schema(&self) -> Vec<ParamDescriptor> {
        Self::flip_params(self.flips.len()).collect()
    }

    fn parameter_values(&self) -> ParamMap {
        self.flip_map()
    }

    fn apply_parameters(&mut self, values: &ParamMap) -> Result<(), ParamError> {
        let v = validate_partial(&self.parameter_schema(), values)?;
        for (i, flip) in self.flips.iter_mut().enumerate() {
            *flip = v.bool_or(&format!("flip{i}"), *flip);
        }
        Ok(())
    }

    fn process(&mut self, inputs: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
        let mut out = Vec::new();
        let mut any = false;
        for (i, flip) in self.flips.iter().enumerate() {
            let Some(pixels) = pixels_input(inputs, i)? else {
                continue;
            };
            any = true;
            if *flip {
                out.extend(pixels.iter().rev());
            } else {
                out.extend(pixels.iter());
            }
        }
        if any {
            outputs[0] = Some(Signal::Pixels(Pixels::new(out)));
        }
        Ok(())
    }
}
