//! Effect registry and factory for lumen graph nodes.
//!
//! This crate maps namespaced effect type names (`"effects.Mirror"`,
//! `"audioreactive.Spectrum"`, ...) to factories, so graphs can be built and
//! restored from data. It is the only place that knows the full set of
//! built-in effects.
//!
//! # Features
//!
//! - **Effect Discovery**: list all effect types with metadata
//! - **Factory Pattern**: create effects by type name from a [`ParamMap`]
//! - **Category System**: sources, colors, audio-reactive, compositors, outputs
//! - **Constructor Schemas**: parameter descriptors for building UIs and validating input
//!
//! # Example
//!
//! ```rust
//! use lumen_core::{ParamValue, param::param_map};
//! use lumen_registry::{EffectCategory, EffectRegistry};
//!
//! let registry = EffectRegistry::new();
//!
//! for effect in registry.effects_in_category(EffectCategory::Compositor) {
//!     println!("{}: {}", effect.type_name, effect.description);
//! }
//!
//! let wheel = registry
//!     .create("colors.ColorWheel", &param_map([("num_pixels", ParamValue::Int(60))]))
//!     .unwrap();
//! assert_eq!(wheel.num_outputs(), 1);
//! ```

use lumen_core::{Effect, ErrorKind, ParamDescriptor, ParamError, ParamMap};
use lumen_effects::{
    AfterGlow, Append, AudioInput, ColorWheel, Combine, InterpolateHsv, LedOutput, Mirror, MovingLight, Spectrum,
    StaticRgbColor, VuMeter, VuMode,
};
use serde::Serialize;
use thiserror::Error;

/// Category of effect for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectCategory {
    /// Audio sources
    Source,
    /// Color generators
    Color,
    /// Visualizers driven by audio
    AudioReactive,
    /// Pixel compositors (mirror, append, combine, afterglow)
    Compositor,
    /// Device sinks
    Output,
}

impl EffectCategory {
    /// Every category, in display order.
    pub const ALL: [EffectCategory; 5] = [
        EffectCategory::Source,
        EffectCategory::Color,
        EffectCategory::AudioReactive,
        EffectCategory::Compositor,
        EffectCategory::Output,
    ];

    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            EffectCategory::Source => "Source",
            EffectCategory::Color => "Color",
            EffectCategory::AudioReactive => "Audio-Reactive",
            EffectCategory::Compositor => "Compositor",
            EffectCategory::Output => "Output",
        }
    }

    /// Returns a description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            EffectCategory::Source => "Audio inputs feeding the graph",
            EffectCategory::Color => "Static colors, color wheels and gradients",
            EffectCategory::AudioReactive => "Spectrum, VU meter and moving-light visualizers",
            EffectCategory::Compositor => "Mirror, append, combine and afterglow stages",
            EffectCategory::Output => "LED devices",
        }
    }

    /// Parses a category from its name, ignoring case and separators.
    pub fn parse(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL.into_iter().find(|c| {
            c.name()
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .map(|c| c.to_ascii_lowercase())
                .eq(key.chars())
        })
    }
}

/// Describes an effect type in the registry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectDescriptor {
    /// Namespaced registry key.
    #[serde(rename = "type")]
    pub type_name: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Brief description of the effect.
    pub description: &'static str,
    /// Category for organization.
    pub category: EffectCategory,
    /// Input channels with default construction.
    pub inputs: usize,
    /// Output channels with default construction.
    pub outputs: usize,
}

/// Builds an effect from (possibly partial) construction parameters.
pub type EffectFactory = fn(&ParamMap) -> Result<Box<dyn Effect>, ParamError>;

/// Errors from registry lookups and construction.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No effect is registered under this name.
    #[error("unknown effect type '{0}'")]
    UnknownEffectType(String),

    /// The construction parameters were rejected.
    #[error("invalid constructor parameters for '{type_name}': {source}")]
    InvalidConstructor {
        /// Effect type being built.
        type_name: String,
        /// Underlying parameter error.
        #[source]
        source: ParamError,
    },
}

impl RegistryError {
    /// Always [`ErrorKind::Configuration`].
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}

/// Internal entry in the registry.
struct RegistryEntry {
    descriptor: EffectDescriptor,
    schema: Vec<ParamDescriptor>,
    factory: EffectFactory,
}

/// Registry of all available effect types.
///
/// All built-in effects are registered by [`EffectRegistry::new`]; custom
/// effects can be added with [`EffectRegistry::register`].
pub struct EffectRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.descriptor.type_name))
            .finish()
    }
}

fn boxed<E: Effect + 'static>(effect: Result<E, ParamError>) -> Result<Box<dyn Effect>, ParamError> {
    effect.map(|e| Box::new(e) as Box<dyn Effect>)
}

impl EffectRegistry {
    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Create a new registry with all built-in effects registered.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(14),
        };
        registry.register_builtin_effects();
        registry
    }

    /// Register all built-in effects.
    fn register_builtin_effects(&mut self) {
        // Sources
        self.register(
            EffectDescriptor {
                type_name: AudioInput::TYPE_NAME,
                name: "Audio Input",
                description: "Multi-channel audio blocks from a tone, silence or a WAV file",
                category: EffectCategory::Source,
                inputs: 0,
                outputs: 2,
            },
            AudioInput::constructor_schema(),
            |p| boxed(AudioInput::from_params(p)),
        );

        // Colors
        self.register(
            EffectDescriptor {
                type_name: StaticRgbColor::TYPE_NAME,
                name: "Static RGB Color",
                description: "One fixed color on every pixel",
                category: EffectCategory::Color,
                inputs: 0,
                outputs: 1,
            },
            StaticRgbColor::constructor_schema(),
            |p| boxed(StaticRgbColor::from_params(p)),
        );
        self.register(
            EffectDescriptor {
                type_name: ColorWheel::TYPE_NAME,
                name: "Color Wheel",
                description: "Hue cycling over time with optional wiggle",
                category: EffectCategory::Color,
                inputs: 0,
                outputs: 1,
            },
            ColorWheel::constructor_schema(),
            |p| boxed(ColorWheel::from_params(p)),
        );
        self.register(
            EffectDescriptor {
                type_name: InterpolateHsv::TYPE_NAME,
                name: "Interpolate HSV",
                description: "HSV gradient between the colors of two inputs",
                category: EffectCategory::Color,
                inputs: 2,
                outputs: 1,
            },
            InterpolateHsv::constructor_schema(),
            |p| boxed(InterpolateHsv::from_params(p)),
        );

        // Audio-reactive
        self.register(
            EffectDescriptor {
                type_name: Spectrum::TYPE_NAME,
                name: "Spectrum",
                description: "Bark-scaled FFT of bass and melody in two colors",
                category: EffectCategory::AudioReactive,
                inputs: 3,
                outputs: 1,
            },
            Spectrum::constructor_schema(),
            |p| boxed(Spectrum::from_params(p)),
        );
        self.register(
            EffectDescriptor {
                type_name: VuMeter::RMS_TYPE_NAME,
                name: "VU Meter (RMS)",
                description: "Level bar from the RMS of recent blocks",
                category: EffectCategory::AudioReactive,
                inputs: 2,
                outputs: 1,
            },
            VuMeter::constructor_schema(),
            |p| boxed(VuMeter::from_params(VuMode::Rms, p)),
        );
        self.register(
            EffectDescriptor {
                type_name: VuMeter::PEAK_TYPE_NAME,
                name: "VU Meter (Peak)",
                description: "Level bar from the peak of recent blocks",
                category: EffectCategory::AudioReactive,
                inputs: 2,
                outputs: 1,
            },
            VuMeter::constructor_schema(),
            |p| boxed(VuMeter::from_params(VuMode::Peak, p)),
        );
        self.register(
            EffectDescriptor {
                type_name: MovingLight::TYPE_NAME,
                name: "Moving Light",
                description: "Band-passed peaks that travel along the strip",
                category: EffectCategory::AudioReactive,
                inputs: 2,
                outputs: 1,
            },
            MovingLight::constructor_schema(),
            |p| boxed(MovingLight::from_params(p)),
        );

        // Compositors
        self.register(
            EffectDescriptor {
                type_name: Mirror::TYPE_NAME,
                name: "Mirror",
                description: "Folds the strip onto itself",
                category: EffectCategory::Compositor,
                inputs: 1,
                outputs: 1,
            },
            Mirror::constructor_schema(),
            |p| boxed(Mirror::from_params(p)),
        );
        self.register(
            EffectDescriptor {
                type_name: Append::TYPE_NAME,
                name: "Append",
                description: "Concatenates inputs, optionally reversing each",
                category: EffectCategory::Compositor,
                inputs: 2,
                outputs: 1,
            },
            Append::constructor_schema(),
            |p| boxed(Append::from_params(p)),
        );
        self.register(
            EffectDescriptor {
                type_name: Combine::TYPE_NAME,
                name: "Combine",
                description: "Blends two inputs with a blend mode",
                category: EffectCategory::Compositor,
                inputs: 2,
                outputs: 1,
            },
            Combine::constructor_schema(),
            |p| boxed(Combine::from_params(p)),
        );
        self.register(
            EffectDescriptor {
                type_name: AfterGlow::TYPE_NAME,
                name: "Afterglow",
                description: "Lets bright pixels fade out over time",
                category: EffectCategory::Compositor,
                inputs: 1,
                outputs: 1,
            },
            AfterGlow::constructor_schema(),
            |p| boxed(AfterGlow::from_params(p)),
        );

        // Outputs
        self.register(
            EffectDescriptor {
                type_name: LedOutput::TYPE_NAME,
                name: "LED Output",
                description: "Writes frames to a null, terminal or OPC device",
                category: EffectCategory::Output,
                inputs: 1,
                outputs: 0,
            },
            LedOutput::constructor_schema(),
            |p| boxed(LedOutput::from_params(p)),
        );
    }

    /// Registers an effect type, replacing any entry with the same type name.
    pub fn register(&mut self, descriptor: EffectDescriptor, schema: Vec<ParamDescriptor>, factory: EffectFactory) {
        let entry = RegistryEntry {
            descriptor,
            schema,
            factory,
        };
        match self
            .entries
            .iter_mut()
            .find(|e| e.descriptor.type_name == entry.descriptor.type_name)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    fn entry(&self, type_name: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.descriptor.type_name == type_name)
    }

    /// Returns descriptors for all registered effects.
    pub fn all_effects(&self) -> Vec<&EffectDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// Returns descriptors for effects in a specific category.
    pub fn effects_in_category(&self, category: EffectCategory) -> Vec<&EffectDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.category == category)
            .map(|e| &e.descriptor)
            .collect()
    }

    /// Get a descriptor by type name.
    pub fn get(&self, type_name: &str) -> Option<&EffectDescriptor> {
        self.entry(type_name).map(|e| &e.descriptor)
    }

    /// True if `type_name` is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.entry(type_name).is_some()
    }

    /// Construction parameters accepted by `type_name`.
    pub fn constructor_schema(&self, type_name: &str) -> Result<&[ParamDescriptor], RegistryError> {
        self.entry(type_name)
            .map(|e| e.schema.as_slice())
            .ok_or_else(|| RegistryError::UnknownEffectType(type_name.to_owned()))
    }

    /// Create an effect instance by type name.
    ///
    /// Missing construction parameters take their schema defaults; unknown
    /// or invalid ones are rejected.
    pub fn create(&self, type_name: &str, params: &ParamMap) -> Result<Box<dyn Effect>, RegistryError> {
        let entry = self
            .entry(type_name)
            .ok_or_else(|| RegistryError::UnknownEffectType(type_name.to_owned()))?;
        (entry.factory)(params).map_err(|source| RegistryError::InvalidConstructor {
            type_name: type_name.to_owned(),
            source,
        })
    }

    /// Returns the number of registered effects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no effects are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::param::param_map;
    use lumen_core::{ParamValue, Signal};

    #[test]
    fn test_registry_creation() {
        let registry = EffectRegistry::new();
        assert_eq!(registry.len(), 13);
        assert!(!registry.is_empty());
        assert!(EffectRegistry::empty().is_empty());
    }

    #[test]
    fn test_every_effect_builds_with_defaults() {
        let registry = EffectRegistry::new();
        for descriptor in registry.all_effects() {
            let effect = registry
                .create(descriptor.type_name, &ParamMap::new())
                .unwrap_or_else(|e| panic!("{}: {e}", descriptor.type_name));
            assert_eq!(effect.type_name(), descriptor.type_name);
            assert_eq!(effect.num_inputs(), descriptor.inputs, "{}", descriptor.type_name);
            assert_eq!(effect.num_outputs(), descriptor.outputs, "{}", descriptor.type_name);
        }
    }

    #[test]
    fn test_constructor_params_round_trip() {
        let registry = EffectRegistry::new();
        for descriptor in registry.all_effects() {
            let first = registry.create(descriptor.type_name, &ParamMap::new()).unwrap();
            let second = registry
                .create(descriptor.type_name, &first.constructor_params())
                .unwrap();
            assert_eq!(first.constructor_params(), second.constructor_params(), "{}", descriptor.type_name);
        }
    }

    #[test]
    fn test_get_effect() {
        let registry = EffectRegistry::new();
        let mirror = registry.get("effects.Mirror");
        assert_eq!(mirror.map(|d| d.name), Some("Mirror"));
        assert!(registry.get("effects.Nonexistent").is_none());
        assert!(registry.contains("audioreactive.VUMeterPeak"));
    }

    #[test]
    fn test_unknown_type() {
        let registry = EffectRegistry::new();
        let err = registry.create("effects.Nope", &ParamMap::new()).err().unwrap();
        assert!(matches!(err, RegistryError::UnknownEffectType(ref name) if name == "effects.Nope"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(registry.constructor_schema("effects.Nope").is_err());
    }

    #[test]
    fn test_invalid_constructor() {
        let registry = EffectRegistry::new();
        let err = registry
            .create("effects.Mirror", &param_map([("bogus", ParamValue::Int(1))]))
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::InvalidConstructor { .. }));
        let err = registry
            .create("colors.ColorWheel", &param_map([("num_pixels", ParamValue::from("many"))]))
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::InvalidConstructor { .. }));
    }

    #[test]
    fn test_constructor_schema_lists_defaults() {
        let registry = EffectRegistry::new();
        let schema = registry.constructor_schema("audioreactive.MovingLight").unwrap();
        let speed = schema.iter().find(|d| d.name == "speed").unwrap();
        assert_eq!(speed.default, ParamValue::Float(100.0));
        assert!(schema.iter().any(|d| d.name == "num_pixels"));
    }

    #[test]
    fn test_effects_in_category() {
        let registry = EffectRegistry::new();
        let compositors = registry.effects_in_category(EffectCategory::Compositor);
        assert_eq!(compositors.len(), 4);
        let total: usize = EffectCategory::ALL
            .iter()
            .map(|c| registry.effects_in_category(*c).len())
            .sum();
        assert_eq!(total, registry.len());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(EffectCategory::parse("audio-reactive"), Some(EffectCategory::AudioReactive));
        assert_eq!(EffectCategory::parse("OUTPUT"), Some(EffectCategory::Output));
        assert_eq!(EffectCategory::parse("filter"), None);
    }

    struct Solid;

    impl Effect for Solid {
        fn type_name(&self) -> &'static str {
            "custom.Solid"
        }
        fn num_inputs(&self) -> usize {
            0
        }
        fn num_outputs(&self) -> usize {
            1
        }
        fn process(
            &mut self,
            _inputs: &[Option<Signal>],
            outputs: &mut [Option<Signal>],
        ) -> Result<(), lumen_core::ProcessError> {
            outputs[0] = Some(Signal::Scalar(1.0));
            Ok(())
        }
    }

    #[test]
    fn test_register_custom_and_replace() {
        let mut registry = EffectRegistry::new();
        let descriptor = EffectDescriptor {
            type_name: "custom.Solid",
            name: "Solid",
            description: "Test effect",
            category: EffectCategory::Color,
            inputs: 0,
            outputs: 1,
        };
        registry.register(descriptor.clone(), Vec::new(), |_| Ok(Box::new(Solid) as Box<dyn Effect>));
        assert_eq!(registry.len(), 14);
        registry.register(
            EffectDescriptor {
                description: "Replaced",
                ..descriptor
            },
            Vec::new(),
            |_| Ok(Box::new(Solid) as Box<dyn Effect>),
        );
        assert_eq!(registry.len(), 14);
        assert_eq!(registry.get("custom.Solid").unwrap().description, "Replaced");
        assert!(registry.create("custom.Solid", &ParamMap::new()).is_ok());
    }

    #[test]
    fn test_descriptor_serializes() {
        let registry = EffectRegistry::new();
        let json = serde_json::to_string(registry.get("effects.Combine").unwrap()).unwrap();
        assert!(json.contains("\"type\":\"effects.Combine\""));
        assert!(json.contains("\"category\":\"compositor\""));
    }
}
