//! Lumen Effects - audio-reactive LED effect implementations
//!
//! This crate provides the effect variants that graph nodes wrap, all built
//! on the [`lumen_core::Effect`] contract:
//!
//! - [`AudioInput`] - multi-channel audio source (synthetic tone, silence, WAV file)
//! - [`StaticRgbColor`], [`ColorWheel`], [`InterpolateHsv`] - color generators
//! - [`Spectrum`] - bark-warped FFT visualizer for bass and melody
//! - [`VuMeter`] - RMS or peak level bar with a decibel-scaled gradient
//! - [`MovingLight`] - band-passed peaks travelling along the strip
//! - [`Mirror`], [`Append`], [`Combine`], [`AfterGlow`] - compositors
//! - [`LedOutput`] - sink effect that writes frames to a [`lumen_core::PixelSink`]
//!
//! Every effect exposes `constructor_schema()` and `from_params()` so a
//! registry can build it from a [`lumen_core::ParamMap`].
//!
//! ## Example
//!
//! ```rust
//! use lumen_core::FilterGraph;
//! use lumen_effects::{ColorWheel, Mirror};
//!
//! let mut graph = FilterGraph::new();
//! let wheel = graph.add_node(Box::new(ColorWheel::new(60, 10.0)));
//! let mirror = graph.add_node(Box::new(Mirror::new(true, 0)));
//! graph.add_connection(wheel, 0, mirror, 0).unwrap();
//! graph.tick(1.0 / 60.0).unwrap();
//! assert_eq!(graph.output_of(mirror, 0).and_then(|s| s.as_pixels()).map(|p| p.len()), Some(60));
//! ```

pub mod afterglow;
pub mod append;
pub mod audio;
pub mod blend;
pub mod colors;
pub mod combine;
pub mod devices;
pub mod dsp;
pub mod led_output;
pub mod mirror;
pub mod moving_light;
pub mod spectrum;
pub mod vu_meter;

pub use afterglow::AfterGlow;
pub use append::Append;
pub use audio::{AudioInput, AudioSource};
pub use blend::{BlendMode, blend};
pub use colors::{ColorWheel, InterpolateHsv, StaticRgbColor};
pub use combine::Combine;
pub use devices::{DeviceKind, MemoryDevice, NullDevice, OpcDevice, TerminalDevice};
pub use led_output::LedOutput;
pub use mirror::Mirror;
pub use moving_light::MovingLight;
pub use spectrum::Spectrum;
pub use vu_meter::{VuMeter, VuMode};

use lumen_core::{InputsExt, Pixels, ProcessError, Signal};

/// Reads input `index` as pixels.
///
/// Absent is `Ok(None)`; any other payload kind is an error.
pub(crate) fn pixels_input(inputs: &[Option<Signal>], index: usize) -> Result<Option<&Pixels>, ProcessError> {
    match inputs.get(index).and_then(Option::as_ref) {
        None => Ok(None),
        Some(Signal::Pixels(_)) => Ok(inputs.pixels(index)),
        Some(other) => Err(ProcessError::UnexpectedInput {
            channel: index,
            expected: "pixels",
            found: other.kind_name(),
        }),
    }
}

/// Reads input `index` as audio, with the same rules as [`pixels_input`].
pub(crate) fn audio_input(
    inputs: &[Option<Signal>],
    index: usize,
) -> Result<Option<&lumen_core::AudioFrame>, ProcessError> {
    match inputs.get(index).and_then(Option::as_ref) {
        None => Ok(None),
        Some(Signal::Audio(_)) => Ok(inputs.audio(index)),
        Some(other) => Err(ProcessError::UnexpectedInput {
            channel: index,
            expected: "audio",
            found: other.kind_name(),
        }),
    }
}
