//! Mirror compositor.

use lumen_core::param::{param_map, validate_partial};
use lumen_core::{Effect, ParamDescriptor, ParamError, ParamLookup, ParamMap, ParamValue, Pixels, ProcessError, Rgb, Signal};

use crate::pixels_input;

/// Folds a pixel table onto itself.
///
/// The input is squeezed into half the strip and mirrored into the other
/// half, so the output has the input's length. With `mirror_lower` the
/// input's first pixel lands in the middle of the strip; otherwise it lands
/// on both ends. `recursion` repeats the fold on its own output.
///
/// Inputs: `0` pixels (absent in, absent out). Outputs: `0` pixels.
#[derive(Debug, Clone)]
pub struct Mirror {
    mirror_lower: bool,
    recursion: usize,
}

impl Mirror {
    /// Registry name.
    pub const TYPE_NAME: &'static str = "effects.Mirror";

    /// Creates the mirror.
    pub fn new(mirror_lower: bool, recursion: usize) -> Self {
        Self {
            mirror_lower,
            recursion: recursion.min(8),
        }
    }

    /// Construction parameters.
    pub fn constructor_schema() -> Vec<ParamDescriptor> {
        Self::schema()
    }

    fn schema() -> Vec<ParamDescriptor> {
        vec![
            ParamDescriptor::boolean("mirror_lower", true).with_description("Put the first input pixel in the middle"),
            ParamDescriptor::int("recursion", 0, 0, 8).with_description("Additional folds"),
        ]
    }

    /// Builds from construction parameters; missing ones take defaults.
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        let p = lumen_core::param::resolve(&Self::schema(), params)?;
        Ok(Self::new(p.bool_or("mirror_lower", true), p.usize_or("recursion", 0)))
    }

    /// One fold of `pixels`.
    pub fn fold(&self, pixels: &[Rgb]) -> Vec<Rgb> {
        let len = pixels.len();
        if len < 2 {
            return pixels.to_vec();
        }
        let half = len.div_ceil(2);
        let squeezed: Vec<Rgb> = (0..half).map(|i| pixels[i * len / half]).collect();
        let mut out = Vec::with_capacity(len);
        if self.mirror_lower {
            out.extend(squeezed.iter().rev());
            out.extend(squeezed.iter());
        } else {
            out.extend(squeezed.iter());
            out.extend(squeezed.iter().rev());
        }
        out.truncate(len);
        out
    }
}

impl Effect for Mirror {
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
        self.parameter_values()
    }

    fn parameter_schema(&self) -> Vec<ParamDescriptor> {
        Self::schema()
    }

    fn parameter_values(&self) -> ParamMap {
        param_map([
            ("mirror_lower", ParamValue::Bool(self.mirror_lower)),
            ("recursion", ParamValue::from(self.recursion)),
        ])
    }

    fn apply_parameters(&mut self, values: &ParamMap) -> Result<(), ParamError> {
        let v = validate_partial(&Self::schema(), values)?;
        self.mirror_lower = v.bool_or("mirror_lower", self.mirror_lower);
        self.recursion = v.usize_or("recursion", self.recursion);
        Ok(())
    }

    fn process(&mut self, inputs: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
        let Some(pixels) = pixels_input(inputs, 0)? else {
            return Ok(());
        };
        let mut folded = self.fold(pixels);
        for _ in 0..self.recursion {
            folded = self.fold(&folded);
        }
        outputs[0] = Some(Signal::Pixels(Pixels::new(folded)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<Rgb> {
        (0..len).map(|i| Rgb::new(i as f32, 0.0, 0.0)).collect()
    }

    fn reds(pixels: &[Rgb]) -> Vec<f32> {
        pixels.iter().map(|p| p.r).collect()
    }

    #[test]
    fn fold_lower_is_symmetric() {
        let mirror = Mirror::new(true, 0);
        let out = mirror.fold(&ramp(6));
        assert_eq!(reds(&out), vec![4.0, 2.0, 0.0, 0.0, 2.0, 4.0]);
    }

    #[test]
    fn fold_upper_reverses_layout() {
        let mirror = Mirror::new(false, 0);
        let out = mirror.fold(&ramp(6));
        assert_eq!(reds(&out), vec![0.0, 2.0, 4.0, 4.0, 2.0, 0.0]);
    }

    #[test]
    fn odd_length_preserved() {
        let mirror = Mirror::new(true, 0);
        assert_eq!(mirror.fold(&ramp(7)).len(), 7);
        assert_eq!(mirror.fold(&ramp(1)).len(), 1);
    }

    #[test]
    fn recursion_folds_again() {
        let mut mirror = Mirror::new(true, 1);
        let inputs = vec![Some(Signal::Pixels(Pixels::new(ramp(8))))];
        let mut outputs = vec![None];
        mirror.process(&inputs, &mut outputs).unwrap();
        let out = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        let once = mirror.fold(&ramp(8));
        assert_eq!(out.as_slice(), mirror.fold(&once).as_slice());
    }

    #[test]
    fn absent_input_stays_absent() {
        let mut mirror = Mirror::new(true, 0);
        let mut outputs = vec![None];
        mirror.process(&[None], &mut outputs).unwrap();
        assert!(outputs[0].is_none());
    }

    #[test]
    fn parameters_round_trip() {
        let mut mirror = Mirror::new(true, 0);
        mirror
            .apply_parameters(&param_map([("recursion", ParamValue::Int(20))]))
            .unwrap();
        assert_eq!(mirror.parameter_values()["recursion"], ParamValue::Int(8));
    }
}
