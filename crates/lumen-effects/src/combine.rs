//! Combine compositor.

use lumen_core::param::{param_map, validate_partial};
use lumen_core::{Effect, ParamDescriptor, ParamError, ParamLookup, ParamMap, ParamValue, Pixels, ProcessError, Signal};

use crate::blend::{BlendMode, blend};
use crate::pixels_input;

/// Blends two pixel tables with a [`BlendMode`].
///
/// When exactly one input is present it passes through unchanged; when both
/// are absent the output is absent.
///
/// Inputs: `0`, `1` pixels. Outputs: `0` pixels.
#[derive(Debug, Clone, Default)]
pub struct Combine {
    mode: BlendMode,
}

impl Combine {
    /// Registry name.
    pub const TYPE_NAME: &'static str = "effects.Combine";

    /// Creates the compositor.
    pub fn new(mode: BlendMode) -> Self {
        Self { mode }
    }

    fn schema() -> Vec<ParamDescriptor> {
        vec![ParamDescriptor::choice("mode", BlendMode::NAMES, "lightenOnly").with_description("Blend mode")]
    }

    /// Construction parameters.
    pub fn constructor_schema() -> Vec<ParamDescriptor> {
        Self::schema()
    }

    /// Builds from construction parameters; missing ones take defaults.
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        let p = lumen_core::param::resolve(&Self::schema(), params)?;
        Ok(Self::new(p.str_or("mode", "lightenOnly").parse()?))
    }

    /// Current blend mode.
    pub fn mode(&self) -> BlendMode {
        self.mode
    }
}

impl Effect for Combine {
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
        self.parameter_values()
    }

    fn parameter_schema(&self) -> Vec<ParamDescriptor> {
        Self::schema()
    }

    fn parameter_values(&self) -> ParamMap {
        param_map([("mode", ParamValue::from(self.mode.name()))])
    }

    fn apply_parameters(&mut self, values: &ParamMap) -> Result<(), ParamError> {
        let v = validate_partial(&Self::schema(), values)?;
        if let Some(mode) = v.get("mode").and_then(ParamValue::as_str) {
            self.mode = mode.parse()?;
        }
        Ok(())
    }

    fn process(&mut self, inputs: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
        let a = pixels_input(inputs, 0)?;
        let b = pixels_input(inputs, 1)?;
        outputs[0] = match (a, b) {
            (Some(a), Some(b)) => Some(Signal::Pixels(Pixels::new(blend(a, b, self.mode)))),
            (Some(only), None) | (None, Some(only)) => Some(Signal::Pixels(only.clone())),
            (None, None) => None,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::Rgb;

    fn table(color: Rgb) -> Option<Signal> {
        Some(Signal::Pixels(Pixels::filled(2, color)))
    }

    #[test]
    fn blends_both_inputs() {
        let mut combine = Combine::new(BlendMode::Addition);
        let mut outputs = vec![None];
        combine
            .process(&[table(Rgb::RED), table(Rgb::BLUE)], &mut outputs)
            .unwrap();
        let out = outputs[0].as_ref().unwrap().as_pixels().unwrap();
        assert_eq!(out[0], Rgb::new(255.0, 0.0, 255.0));
    }

    #[test]
    fn single_input_passes_through_same_payload() {
        let mut combine = Combine::default();
        let input = table(Rgb::GREEN);
        let mut outputs = vec![None];
        combine.process(&[None, input.clone()], &mut outputs).unwrap();
        assert!(outputs[0].as_ref().unwrap().same_payload(input.as_ref().unwrap()));

        let mut outputs = vec![None];
        combine.process(&[None, None], &mut outputs).unwrap();
        assert!(outputs[0].is_none());
    }

    #[test]
    fn mode_parameter() {
        let mut combine = Combine::from_params(&param_map([("mode", ParamValue::from("darkenOnly"))])).unwrap();
        assert_eq!(combine.mode(), BlendMode::DarkenOnly);
        let err = combine.apply_parameters(&param_map([("mode", ParamValue::from("overlay"))]));
        assert!(matches!(err, Err(ParamError::InvalidChoice { .. })));
        assert_eq!(combine.mode(), BlendMode::DarkenOnly);
        combine
            .apply_parameters(&param_map([("mode", ParamValue::from("screen"))]))
            .unwrap();
        assert_eq!(combine.parameter_values()["mode"], ParamValue::from("screen"));
    }
}
