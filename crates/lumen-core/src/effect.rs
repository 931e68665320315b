//! Core Effect trait and related types.
//!
//! The [`Effect`] trait is the capability contract every graph node wraps.
//! An effect declares its channel counts, describes its parameters, accepts
//! parameter updates, advances its time-based state in the update pass, and
//! turns resolved inputs into outputs once per tick.
//!
//! ## Design Decisions
//!
//! - **Fixed channel counts**: `num_inputs()`/`num_outputs()` are decided at
//!   construction and never change afterwards. Connections are validated
//!   against them once, at connect time.
//!
//! - **Owned state**: an effect owns all of its derived and accumulated state
//!   (filter memories, rolling histories, color tables). Nothing is shared
//!   between nodes except the signals routed through connections.
//!
//! - **Two passes**: [`advance_time`](Effect::advance_time) is where slow or
//!   clock-driven work happens; [`process`](Effect::process) is the
//!   latency-critical render step and must not block.
//!
//! - **Explicit absence**: inputs arrive as `Option<Signal>`. What an effect
//!   does with an absent input (substitute a default color, stay dark) is part
//!   of that effect's own contract.

use crate::error::{ParamError, ProcessError};
use crate::param::{ParamDescriptor, ParamMap};
use crate::signal::Signal;

/// Clock state handed to [`Effect::advance_time`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UpdateContext {
    /// Graph clock in seconds, after this update.
    pub time: f64,
    /// Seconds advanced by this update.
    pub dt: f64,
    /// Number of updates run so far, including this one.
    pub tick: u64,
}

/// Core trait for all graph effects.
///
/// # Example
///
/// ```rust
/// use lumen_core::{Effect, InputsExt, Pixels, ProcessError, Rgb, Signal};
///
/// /// Dims its input to half brightness.
/// struct Dim;
///
/// impl Effect for Dim {
///     fn type_name(&self) -> &'static str { "demo.Dim" }
///     fn num_inputs(&self) -> usize { 1 }
///     fn num_outputs(&self) -> usize { 1 }
///
///     fn process(
///         &mut self,
///         inputs: &[Option<Signal>],
///         outputs: &mut [Option<Signal>],
///     ) -> Result<(), ProcessError> {
///         if let Some(pixels) = inputs.pixels(0) {
///             let dimmed: Vec<Rgb> = pixels.iter().map(|p| p.scale(0.5)).collect();
///             outputs[0] = Some(Signal::Pixels(Pixels::new(dimmed)));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Effect: Send {
    /// Namespaced registry name, e.g. `"effects.Mirror"`.
    fn type_name(&self) -> &'static str;

    /// Number of input channels.
    fn num_inputs(&self) -> usize;

    /// Number of output channels.
    fn num_outputs(&self) -> usize;

    /// The construction arguments needed to rebuild this effect.
    fn constructor_params(&self) -> ParamMap {
        ParamMap::new()
    }

    /// Schema of the tunable parameters.
    fn parameter_schema(&self) -> Vec<ParamDescriptor> {
        Vec::new()
    }

    /// Current values of the tunable parameters.
    fn parameter_values(&self) -> ParamMap {
        ParamMap::new()
    }

    /// Applies a (possibly partial) set of tunable parameter values.
    ///
    /// Implementations validate the whole map before changing anything, so a
    /// rejected update leaves the effect untouched. Only derived caches may be
    /// rebuilt here; live accumulators (histories, trails) are kept.
    fn apply_parameters(&mut self, values: &ParamMap) -> Result<(), ParamError> {
        match values.keys().next() {
            Some(name) => Err(ParamError::Unknown { name: name.clone() }),
            None => Ok(()),
        }
    }

    /// Advances time-based state. Called once per tick, before any `process`.
    fn advance_time(&mut self, ctx: &UpdateContext) {
        let _ = ctx;
    }

    /// Produces this tick's outputs.
    ///
    /// `inputs` has exactly `num_inputs()` entries; `outputs` has exactly
    /// `num_outputs()` entries, all cleared to `None` beforehand. Returning an
    /// error makes every output of this node absent for the tick.
    fn process(
        &mut self,
        inputs: &[Option<Signal>],
        outputs: &mut [Option<Signal>],
    ) -> Result<(), ProcessError>;
}
