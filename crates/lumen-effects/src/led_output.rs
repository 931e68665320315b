//! LED output sink.

use std::fmt;

use lumen_core::param::{param_map, resolve};
use lumen_core::{Effect, ParamDescriptor, ParamError, ParamLookup, ParamMap, ParamValue, PixelSink, ProcessError, Signal};

use crate::devices::DeviceKind;
use crate::pixels_input;

const DEFAULT_SERVER: &str = "127.0.0.1:7890";

/// Writes its pixel input to a [`PixelSink`] every tick.
///
/// Inputs: `0` pixels; nothing is written while the input is absent.
/// No outputs. A failed write is reported as [`ProcessError::Device`].
pub struct LedOutput {
    device: DeviceKind,
    server: String,
    channel: u8,
    sink: Box<dyn PixelSink>,
    frames_written: u64,
}

impl LedOutput {
    /// Registry name.
    pub const TYPE_NAME: &'static str = "devices.LEDOutput";

    /// Opens one of the built-in devices.
    pub fn new(device: DeviceKind, server: impl Into<String>, channel: u8) -> Self {
        let server = server.into();
        Self {
            sink: device.open(&server, channel),
            device,
            server,
            channel,
            frames_written: 0,
        }
    }

    /// Writes to a caller-supplied sink instead of a built-in device.
    ///
    /// Snapshots of this node record the `null` device.
    pub fn with_sink(sink: Box<dyn PixelSink>) -> Self {
        Self {
            device: DeviceKind::Null,
            server: DEFAULT_SERVER.to_owned(),
            channel: 0,
            sink,
            frames_written: 0,
        }
    }

    /// Construction parameters.
    pub fn constructor_schema() -> Vec<ParamDescriptor> {
        vec![
            ParamDescriptor::choice("device", DeviceKind::NAMES, "null").with_description("Output device"),
            ParamDescriptor::text("server", DEFAULT_SERVER).with_description("OPC server address"),
            ParamDescriptor::int("channel", 0, 0, 255).with_description("OPC channel"),
        ]
    }

    /// Builds from construction parameters; missing ones take defaults.
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        let p = resolve(&Self::constructor_schema(), params)?;
        let device = p.str_or("device", "null").parse()?;
        let channel = u8::try_from(p.i64_or("channel", 0)).map_err(|_| ParamError::invalid("channel", "out of range"))?;
        Ok(Self::new(device, p.str_or("server", DEFAULT_SERVER), channel))
    }

    /// Name of the sink frames go to.
    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    /// Frames successfully written.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl fmt::Debug for LedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedOutput")
            .field("device", &self.device)
            .field("server", &self.server)
            .field("channel", &self.channel)
            .field("sink", &self.sink.name())
            .finish()
    }
}

impl Effect for LedOutput {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        0
    }

    fn constructor_params(&self) -> ParamMap {
        param_map([
            ("device", ParamValue::from(self.device.name())),
            ("server", ParamValue::from(self.server.as_str())),
            ("channel", ParamValue::Int(i64::from(self.channel))),
        ])
    }

    fn process(&mut self, inputs: &[Option<Signal>], _outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
        let Some(pixels) = pixels_input(inputs, 0)? else {
            return Ok(());
        };
        self.sink.write(pixels)?;
        self.frames_written += 1;
        Ok(())
    }
}
