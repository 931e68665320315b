//! Factory graph presets.
//!
//! Each preset wires an audio input, color generators, one visualizer and
//! the LED output for a strip of `num_pixels`. Most presets render half the
//! strip and append a flipped copy, so odd pixel counts lose one pixel.
//! Every node is built through the registry, exactly as a loaded snapshot
//! would be.

use lumen_core::param::param_map;
use lumen_core::{FilterGraph, NodeId, ParamMap, ParamValue};
use lumen_effects::DeviceKind;
use lumen_registry::EffectRegistry;

use crate::ConfigError;

/// Names accepted by [`build_preset`].
pub const PRESET_NAMES: &[&str] = &["movingLight", "movingLights", "spectrum", "vuPeak", "staticColor"];

/// Returns all preset names.
pub fn preset_names() -> &'static [&'static str] {
    PRESET_NAMES
}

/// True if `name` is a factory preset.
pub fn is_preset(name: &str) -> bool {
    PRESET_NAMES.contains(&name)
}

/// Where the preset's `devices.LEDOutput` sends frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// Device kind.
    pub device: DeviceKind,
    /// OPC server address, used by [`DeviceKind::Opc`].
    pub server: String,
}

impl Default for OutputTarget {
    fn default() -> Self {
        Self {
            device: DeviceKind::Null,
            server: "127.0.0.1:7890".to_owned(),
        }
    }
}

impl OutputTarget {
    /// Target for `device` with the default server.
    pub fn new(device: DeviceKind) -> Self {
        Self {
            device,
            ..Self::default()
        }
    }
}

/// Builds the named preset graph with timing recording enabled.
pub fn build_preset(
    registry: &EffectRegistry,
    name: &str,
    num_pixels: usize,
    output: &OutputTarget,
) -> Result<FilterGraph, ConfigError> {
    let mut b = Builder::new(registry);
    let led = b.node(
        "devices.LEDOutput",
        param_map([
            ("device", ParamValue::from(output.device.name())),
            ("server", ParamValue::from(output.server.as_str())),
        ]),
    )?;
    let half = (num_pixels / 2).max(1);

    match name {
        "movingLight" => {
            let audio = b.audio_input()?;
            let wheel = b.color_wheel(half, None)?;
            let light = b.node(
                "audioreactive.MovingLight",
                param_map([("num_pixels", ParamValue::from(half))]),
            )?;
            // built but left unwired, ready to be patched in
            b.node(
                "effects.Mirror",
                param_map([
                    ("mirror_lower", ParamValue::Bool(true)),
                    ("recursion", ParamValue::Int(0)),
                ]),
            )?;
            let glow = b.afterglow(0.15)?;
            let append = b.append(0)?;
            b.connect(audio, 0, light, 0)?;
            b.connect(wheel, 0, light, 1)?;
            b.connect(light, 0, glow, 0)?;
            b.connect(glow, 0, append, 0)?;
            b.connect(glow, 0, append, 1)?;
            b.connect(append, 0, led, 0)?;
        }
        "movingLights" => {
            let audio = b.audio_input()?;
            let layers = [(0.5, 200.0, 0), (1.0, 500.0, 1)];
            let mut appends = Vec::with_capacity(layers.len());
            for (dim_time, highcut_hz, flip) in layers {
                let wheel = b.color_wheel(half, None)?;
                let light = b.node(
                    "audioreactive.MovingLight",
                    param_map([
                        ("num_pixels", ParamValue::from(half)),
                        ("speed", ParamValue::Float(150.0)),
                        ("dim_time", ParamValue::Float(dim_time)),
                        ("highcut_hz", ParamValue::Float(highcut_hz)),
                    ]),
                )?;
                let glow = b.afterglow(1.0)?;
                let append = b.append(flip)?;
                b.connect(audio, 0, light, 0)?;
                b.connect(wheel, 0, light, 1)?;
                b.connect(light, 0, glow, 0)?;
                b.connect(glow, 0, append, 0)?;
                b.connect(glow, 0, append, 1)?;
                appends.push(append);
            }
            let combine = b.node(
                "effects.Combine",
                param_map([("mode", ParamValue::from("lightenOnly"))]),
            )?;
            for (channel, append) in appends.into_iter().enumerate() {
                b.connect(append, 0, combine, channel)?;
            }
            b.connect(combine, 0, led, 0)?;
        }
        "spectrum" => {
            let audio = b.audio_input()?;
            let melody = b.color_wheel(half, None)?;
            let bass = b.color_wheel(half, Some(15.0))?;
            let spectrum = b.node(
                "audioreactive.Spectrum",
                param_map([
                    ("num_pixels", ParamValue::from(half)),
                    ("chunk_rate", ParamValue::Int(60)),
                ]),
            )?;
            let append = b.append(0)?;
            let glow = b.afterglow(2.0)?;
            b.connect(audio, 0, spectrum, 0)?;
            b.connect(melody, 0, spectrum, 1)?;
            b.connect(bass, 0, spectrum, 2)?;
            b.connect(spectrum, 0, append, 0)?;
            b.connect(spectrum, 0, append, 1)?;
            b.connect(append, 0, glow, 0)?;
            b.connect(glow, 0, led, 0)?;
        }
        "vuPeak" => {
            let audio = b.audio_input()?;
            let start = b.color_wheel(half, None)?;
            let end = b.color_wheel(half, Some(5.0))?;
            let gradient = b.node(
                "colors.InterpolateHSV",
                param_map([("num_pixels", ParamValue::from(half))]),
            )?;
            let meter = param_map([("num_pixels", ParamValue::from(half))]);
            let left = b.node("audioreactive.VUMeterPeak", meter.clone())?;
            let right = b.node("audioreactive.VUMeterPeak", meter)?;
            let append = b.append(1)?;
            let glow = b.afterglow(0.5)?;
            b.connect(audio, 0, left, 0)?;
            b.connect(start, 0, gradient, 0)?;
            b.connect(end, 0, gradient, 1)?;
            b.connect(gradient, 0, left, 1)?;
            b.connect(audio, 1, right, 0)?;
            b.connect(gradient, 0, right, 1)?;
            b.connect(left, 0, append, 0)?;
            b.connect(right, 0, append, 1)?;
            b.connect(append, 0, glow, 0)?;
            b.connect(glow, 0, led, 0)?;
        }
        "staticColor" => {
            let color = b.node(
                "colors.StaticRGBColor",
                param_map([
                    ("num_pixels", ParamValue::from(num_pixels)),
                    ("r", ParamValue::Float(55.0)),
                    ("g", ParamValue::Float(150.0)),
                    ("b", ParamValue::Float(236.0)),
                ]),
            )?;
            b.connect(color, 0, led, 0)?;
        }
        other => return Err(ConfigError::PresetNotFound(other.to_owned())),
    }

    tracing::debug!(preset = name, num_pixels, nodes = b.graph.node_count(), "preset built");
    Ok(b.graph)
}

/// Registry-backed graph construction shared by the presets.
struct Builder<'a> {
    registry: &'a EffectRegistry,
    graph: FilterGraph,
}

impl<'a> Builder<'a> {
    fn new(registry: &'a EffectRegistry) -> Self {
        let mut graph = FilterGraph::new();
        graph.set_record_timings(true);
        Self { registry, graph }
    }

    fn node(&mut self, type_name: &str, params: ParamMap) -> Result<NodeId, ConfigError> {
        let effect = self.registry.create(type_name, &params)?;
        Ok(self.graph.add_node(effect))
    }

    fn tune(&mut self, node: NodeId, values: ParamMap) -> Result<(), ConfigError> {
        self.graph.update_node_parameters(node, &values)?;
        Ok(())
    }

    fn connect(&mut self, from: NodeId, from_channel: usize, to: NodeId, to_channel: usize) -> Result<(), ConfigError> {
        self.graph.add_connection(from, from_channel, to, to_channel)?;
        Ok(())
    }

    fn audio_input(&mut self) -> Result<NodeId, ConfigError> {
        self.node("audio.AudioInput", param_map([("num_channels", ParamValue::Int(2))]))
    }

    fn color_wheel(&mut self, num_pixels: usize, cycle_time: Option<f64>) -> Result<NodeId, ConfigError> {
        let mut params = param_map([("num_pixels", ParamValue::from(num_pixels))]);
        if let Some(cycle_time) = cycle_time {
            params.insert("cycle_time".into(), ParamValue::Float(cycle_time));
        }
        self.node("colors.ColorWheel", params)
    }

    fn afterglow(&mut self, glow_time: f64) -> Result<NodeId, ConfigError> {
        self.node("effects.AfterGlow", param_map([("glow_time", ParamValue::Float(glow_time))]))
    }

    /// Two-input append with input `flip` reversed.
    fn append(&mut self, flip: usize) -> Result<NodeId, ConfigError> {
        let append = self.node("effects.Append", param_map([("num_channels", ParamValue::Int(2))]))?;
        self.tune(append, param_map([(format!("flip{flip}"), ParamValue::Bool(true))]))?;
        Ok(append)
    }
}
