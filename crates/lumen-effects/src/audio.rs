//! Multi-channel audio source.
//!
//! [`AudioInput`] pulls one block per channel in the update pass and emits
//! the most recent completed block from `process`. Until the first update
//! has run its outputs are absent.
//!
//! Three sources are available: a synthetic pulsing tone (handy for demos and
//! tests), silence, and a looping WAV file decoded with `hound`.

use std::f32::consts::TAU;
use std::fmt;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader};
use lumen_core::param::{param_map, resolve, validate_partial};
use lumen_core::{
    AudioFrame, Effect, ParamDescriptor, ParamError, ParamLookup, ParamMap, ParamValue, ProcessError, Signal,
    UpdateContext,
};

/// Where [`AudioInput`] gets its samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Synthetic bass pulse plus a quiet high partial.
    Tone,
    /// All zeros.
    Silence,
    /// A WAV file, looped.
    Wav(PathBuf),
}

impl AudioSource {
    /// Choice names accepted by the `source` parameter.
    pub const NAMES: &'static [&'static str] = &["tone", "silence", "wav"];

    /// Parameter name of this source.
    pub fn name(&self) -> &'static str {
        match self {
            AudioSource::Tone => "tone",
            AudioSource::Silence => "silence",
            AudioSource::Wav(_) => "wav",
        }
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioSource::Wav(path) => write!(f, "wav:{}", path.display()),
            other => f.write_str(other.name()),
        }
    }
}

/// Sample generator state behind an [`AudioSource`].
enum Generator {
    Tone { position: u64 },
    Silence,
    Wav { channels: Vec<Vec<f32>>, position: usize },
}

impl Generator {
    /// Fills one block for `channel` starting at the current position.
    fn block(&self, channel: usize, sample_rate: f32, len: usize, gain: f32) -> Vec<f32> {
        match self {
            Generator::Tone { position } => (0..len)
                .map(|i| {
                    let t = (*position + i as u64) as f32 / sample_rate;
                    let bass_hz = 80.0 * (1.0 + channel as f32 * 0.25);
                    // Two pulses per second with an exponential tail.
                    let envelope = (-(t % 0.5) * 8.0).exp();
                    let bass = (TAU * bass_hz * t).sin() * envelope * 0.8;
                    let high = (TAU * 880.0 * t).sin() * 0.1;
                    (bass + high) * gain
                })
                .collect(),
            Generator::Silence => vec![0.0; len],
            Generator::Wav { channels, position } => {
                let Some(data) = channels.get(channel % channels.len().max(1)) else {
                    return vec![0.0; len];
                };
                if data.is_empty() {
                    return vec![0.0; len];
                }
                (0..len).map(|i| data[(position + i) % data.len()] * gain).collect()
            }
        }
    }

    fn advance(&mut self, len: usize) {
        match self {
            Generator::Tone { position } => *position += len as u64,
            Generator::Silence => {}
            Generator::Wav { channels, position } => {
                let total = channels.first().map_or(0, Vec::len);
                if total > 0 {
                    *position = (*position + len) % total;
                }
            }
        }
    }
}

/// Decodes a WAV file into per-channel sample vectors in `-1.0..=1.0`.
fn read_wav(path: &Path) -> Result<(f32, Vec<Vec<f32>>), ParamError> {
    let reader = WavReader::open(path).map_err(|e| ParamError::invalid("path", format!("{}: {e}", path.display())))?;
    let spec = reader.spec();
    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>(),
        SampleFormat::Int => {
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
        }
    }
    .map_err(|e| ParamError::invalid("path", e.to_string()))?;

    let num_channels = usize::from(spec.channels.max(1));
    let mut channels = vec![Vec::with_capacity(interleaved.len() / num_channels); num_channels];
    for frame in interleaved.chunks_exact(num_channels) {
        for (ch, sample) in frame.iter().enumerate() {
            channels[ch].push(*sample);
        }
    }
    Ok((spec.sample_rate as f32, channels))
}

/// Audio source node.
///
/// Inputs: none. Outputs: one mono [`AudioFrame`] per channel.
///
/// # Example
///
/// ```rust
/// use lumen_core::{Effect, UpdateContext};
/// use lumen_effects::{AudioInput, AudioSource};
///
/// let mut input = AudioInput::new(2, 48000.0, 800, AudioSource::Tone).unwrap();
/// input.advance_time(&UpdateContext { time: 0.016, dt: 0.016, tick: 1 });
/// let mut outputs = vec![None, None];
/// input.process(&[], &mut outputs).unwrap();
/// assert_eq!(outputs[0].as_ref().and_then(|s| s.as_audio()).map(|f| f.len()), Some(800));
/// ```
pub struct AudioInput {
    num_channels: usize,
    requested_rate: f32,
    sample_rate: f32,
    block_size: usize,
    source: AudioSource,
    generator: Generator,
    gain: f32,
    latest: Vec<AudioFrame>,
}

impl AudioInput {
    /// Registry name.
    pub const TYPE_NAME: &'static str = "audio.AudioInput";

    /// Creates the source. A WAV source is decoded here, and its sample rate
    /// replaces `sample_rate`.
    pub fn new(num_channels: usize, sample_rate: f32, block_size: usize, source: AudioSource) -> Result<Self, ParamError> {
        if num_channels == 0 {
            return Err(ParamError::invalid("num_channels", "must be at least 1"));
        }
        let (rate, generator) = match &source {
            AudioSource::Tone => (sample_rate, Generator::Tone { position: 0 }),
            AudioSource::Silence => (sample_rate, Generator::Silence),
            AudioSource::Wav(path) => {
                let (rate, channels) = read_wav(path)?;
                tracing::debug!(path = %path.display(), rate, channels = channels.len(), "audio_input: loaded wav");
                (rate, Generator::Wav { channels, position: 0 })
            }
        };
        Ok(Self {
            num_channels,
            requested_rate: sample_rate,
            sample_rate: rate,
            block_size: block_size.max(1),
            source,
            generator,
            gain: 1.0,
            latest: Vec::new(),
        })
    }

    /// Construction parameters.
    pub fn constructor_schema() -> Vec<ParamDescriptor> {
        vec![
            ParamDescriptor::int("num_channels", 2, 1, 8).with_description("Number of audio channels"),
            ParamDescriptor::sample_rate("sample_rate", 48_000.0),
            ParamDescriptor::int("block_size", 800, 16, 16_384).with_description("Samples per channel per tick"),
            ParamDescriptor::choice("source", AudioSource::NAMES, "tone"),
            ParamDescriptor::text("path", "").with_description("WAV file for the wav source"),
        ]
    }

    /// Builds from construction parameters; missing ones take defaults.
    pub fn from_params(params: &ParamMap) -> Result<Self, ParamError> {
        let p = resolve(&Self::constructor_schema(), params)?;
        let source = match p.str_or("source", "tone") {
            "silence" => AudioSource::Silence,
            "wav" => {
                let path = p.str_or("path", "");
                if path.is_empty() {
                    return Err(ParamError::invalid("path", "required for the wav source"));
                }
                AudioSource::Wav(PathBuf::from(path))
            }
            _ => AudioSource::Tone,
        };
        Self::new(
            p.usize_or("num_channels", 2),
            p.f32_or("sample_rate", 48_000.0),
            p.usize_or("block_size", 800),
            source,
        )
    }

    /// Effective sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// The configured source.
    pub fn source(&self) -> &AudioSource {
        &self.source
    }
}

impl Effect for AudioInput {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn num_inputs(&self) -> usize {
        0
    }

    fn num_outputs(&self) -> usize {
        self.num_channels
    }

    fn constructor_params(&self) -> ParamMap {
        let path = match &self.source {
            AudioSource::Wav(path) => path.display().to_string(),
            _ => String::new(),
        };
        param_map([
            ("num_channels", ParamValue::from(self.num_channels)),
            ("sample_rate", ParamValue::Float(f64::from(self.requested_rate))),
            ("block_size", ParamValue::from(self.block_size)),
            ("source", ParamValue::from(self.source.name())),
            ("path", ParamValue::Text(path)),
        ])
    }

    fn parameter_schema(&self) -> Vec<ParamDescriptor> {
        vec![ParamDescriptor::float("gain", 1.0, 0.0, 4.0, 0.01).with_description("Linear input gain")]
    }

    fn parameter_values(&self) -> ParamMap {
        param_map([("gain", ParamValue::Float(f64::from(self.gain)))])
    }

    fn apply_parameters(&mut self, values: &ParamMap) -> Result<(), ParamError> {
        let v = validate_partial(&self.parameter_schema(), values)?;
        self.gain = v.f32_or("gain", self.gain);
        Ok(())
    }

    fn advance_time(&mut self, _ctx: &UpdateContext) {
        self.latest = (0..self.num_channels)
            .map(|ch| {
                AudioFrame::new(
                    self.sample_rate,
                    self.generator.block(ch, self.sample_rate, self.block_size, self.gain),
                )
            })
            .collect();
        self.generator.advance(self.block_size);
    }

    fn process(&mut self, _: &[Option<Signal>], outputs: &mut [Option<Signal>]) -> Result<(), ProcessError> {
        for (out, frame) in outputs.iter_mut().zip(&self.latest) {
            *out = Some(Signal::Audio(frame.clone()));
        }
        Ok(())
    }
}

impl fmt::Debug for AudioInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioInput")
            .field("num_channels", &self.num_channels)
            .field("sample_rate", &self.sample_rate)
            .field("block_size", &self.block_size)
            .field("source", &self.source)
            .field("gain", &self.gain)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(input: &mut AudioInput, tick: u64) -> Vec<Option<Signal>> {
        input.advance_time(&UpdateContext { time: tick as f64 / 60.0, dt: 1.0 / 60.0, tick });
        let mut outputs = vec![None; input.num_outputs()];
        input.process(&[], &mut outputs).unwrap();
        outputs
    }

    #[test]
    fn outputs_absent_before_first_update() {
        let mut input = AudioInput::new(2, 48000.0, 64, AudioSource::Tone).unwrap();
        let mut outputs = vec![None, None];
        input.process(&[], &mut outputs).unwrap();
        assert!(outputs.iter().all(Option::is_none));
    }

    #[test]
    fn tone_blocks_advance() {
        let mut input = AudioInput::new(2, 48000.0, 64, AudioSource::Tone).unwrap();
        let first = tick(&mut input, 1);
        let second = tick(&mut input, 2);
        let a = first[0].as_ref().unwrap().as_audio().unwrap();
        let b = second[0].as_ref().unwrap().as_audio().unwrap();
        assert_eq!(a.len(), 64);
        assert_ne!(a.samples(), b.samples());
        assert!(a.peak() > 0.0);
    }

    #[test]
    fn gain_scales_output() {
        let mut loud = AudioInput::new(1, 48000.0, 128, AudioSource::Tone).unwrap();
        let mut quiet = AudioInput::new(1, 48000.0, 128, AudioSource::Tone).unwrap();
        quiet
            .apply_parameters(&param_map([("gain", ParamValue::Float(0.5))]))
            .unwrap();
        let l = tick(&mut loud, 1)[0].clone().unwrap();
        let q = tick(&mut quiet, 1)[0].clone().unwrap();
        let (l, q) = (l.as_audio().unwrap().rms(), q.as_audio().unwrap().rms());
        assert!((q - l * 0.5).abs() < 1e-5);
    }

    #[test]
    fn silence_is_zero() {
        let mut input = AudioInput::from_params(&param_map([("source", ParamValue::from("silence"))])).unwrap();
        let out = tick(&mut input, 1);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].as_ref().unwrap().as_audio().unwrap().peak(), 0.0);
    }

    #[test]
    fn wav_source_requires_path() {
        let err = AudioInput::from_params(&param_map([("source", ParamValue::from("wav"))]));
        assert!(matches!(err, Err(ParamError::Invalid { .. })));
        let missing = AudioInput::new(1, 48000.0, 64, AudioSource::Wav(PathBuf::from("/nonexistent/x.wav")));
        assert!(missing.is_err());
    }

    #[test]
    fn wav_source_loops_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..10i16 {
            writer.write_sample(i * 1000).unwrap();
        }
        writer.finalize().unwrap();

        let mut input = AudioInput::new(2, 48000.0, 6, AudioSource::Wav(path.clone())).unwrap();
        assert_eq!(input.sample_rate(), 8000.0);
        let first = tick(&mut input, 1);
        let second = tick(&mut input, 2);
        let a = first[0].as_ref().unwrap().as_audio().unwrap().samples().to_vec();
        let b = second[1].as_ref().unwrap().as_audio().unwrap().samples().to_vec();
        assert!((a[1] - 1000.0 / 32768.0).abs() < 1e-6);
        // Second block wraps: samples 6..9 then 0..1.
        assert!((b[0] - 6000.0 / 32768.0).abs() < 1e-6);
        assert_eq!(b[4], 0.0);
        assert_eq!(input.constructor_params()["path"], ParamValue::Text(path.display().to_string()));
    }

    #[test]
    fn zero_channels_rejected() {
        assert!(AudioInput::new(0, 48000.0, 64, AudioSource::Silence).is_err());
    }
}
