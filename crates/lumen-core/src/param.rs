//! Parameter schema and values for discoverable effect configuration.
//!
//! Effects describe two sets of parameters with the same vocabulary:
//!
//! - **Constructor parameters** fix an effect's shape (pixel count, channel
//!   count, sample rate). They are supplied once when the effect is built and
//!   are stored in snapshots so the effect can be rebuilt.
//! - **Tunable parameters** may change while the graph runs. They are applied
//!   through [`Effect::apply_parameters`](crate::Effect::apply_parameters).
//!
//! Each parameter is described by a [`ParamDescriptor`]; values travel as
//! [`ParamValue`] inside an ordered [`ParamMap`], which keeps serialized forms
//! canonical.
//!
//! # Example
//!
//! ```rust
//! use lumen_core::{ParamDescriptor, ParamMap, ParamUnit, ParamValue, param};
//!
//! let schema = vec![
//!     ParamDescriptor::float("speed", 100.0, 1.0, 200.0, 1.0).with_unit(ParamUnit::PixelsPerSecond),
//!     ParamDescriptor::boolean("mirror_lower", true),
//! ];
//!
//! let mut provided = ParamMap::new();
//! provided.insert("speed".into(), ParamValue::Float(500.0));
//!
//! let resolved = param::resolve(&schema, &provided).unwrap();
//! assert_eq!(resolved["speed"], ParamValue::Float(200.0)); // clamped
//! assert_eq!(resolved["mirror_lower"], ParamValue::Bool(true)); // default
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ParamError;

/// Ordered name → value map. Ordering makes serialization deterministic.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// A parameter value.
///
/// Serialized untagged, so JSON `true`, `3`, `2.5` and `"screen"` map to
/// `Bool`, `Int`, `Float` and `Text` respectively.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A flag.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A real number.
    Float(f64),
    /// A string (choices, device names, paths).
    Text(String),
}

impl ParamValue {
    /// Numeric view of `Int` and `Float` values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view of `Int` values and integral `Float` values.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            ParamValue::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Flag view. Integers `0` and `1` are accepted as flags.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            ParamValue::Int(0) => Some(false),
            ParamValue::Int(1) => Some(true),
            _ => None,
        }
    }

    /// String view of `Text` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the value's kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(f64::from(v))
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// Unit of a numeric parameter, for display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamUnit {
    /// Unitless.
    #[default]
    None,
    /// Seconds.
    Seconds,
    /// Hertz.
    Hertz,
    /// Decibels.
    Decibels,
    /// Pixel count.
    Pixels,
    /// Pixels per second.
    PixelsPerSecond,
    /// 8-bit color channel intensity.
    Intensity,
}

impl ParamUnit {
    /// Display suffix for values in this unit.
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::None | ParamUnit::Intensity => "",
            ParamUnit::Seconds => " s",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Decibels => " dB",
            ParamUnit::Pixels => " px",
            ParamUnit::PixelsPerSecond => " px/s",
        }
    }
}

/// Shape and range of a parameter.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ParamKind {
    /// Real number clamped to `[min, max]`.
    Float {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
        /// UI step size.
        step: f64,
    },
    /// Integer clamped to `[min, max]`.
    Int {
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
        /// UI step size.
        step: i64,
    },
    /// On/off flag.
    Bool,
    /// One of a fixed set of strings.
    Choice {
        /// Allowed values.
        options: &'static [&'static str],
    },
    /// Free-form string.
    Text,
}

impl ParamKind {
    fn expected(&self) -> &'static str {
        match self {
            ParamKind::Float { .. } => "float",
            ParamKind::Int { .. } => "int",
            ParamKind::Bool => "bool",
            ParamKind::Choice { .. } => "choice",
            ParamKind::Text => "text",
        }
    }
}

/// Describes one parameter: name, shape, default and display metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParamDescriptor {
    /// Stable name used as the map key.
    pub name: Cow<'static, str>,
    /// One-line explanation for UIs.
    pub description: &'static str,
    /// Value shape and range.
    #[serde(flatten)]
    pub kind: ParamKind,
    /// Display unit.
    pub unit: ParamUnit,
    /// Value used when none is supplied.
    pub default: ParamValue,
}

impl ParamDescriptor {
    /// A real-valued parameter.
    pub fn float(name: impl Into<Cow<'static, str>>, default: f64, min: f64, max: f64, step: f64) -> Self {
        Self {
            name: name.into(),
            description: "",
            kind: ParamKind::Float { min, max, step },
            unit: ParamUnit::None,
            default: ParamValue::Float(default),
        }
    }

    /// An integer parameter.
    pub fn int(name: impl Into<Cow<'static, str>>, default: i64, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            description: "",
            kind: ParamKind::Int { min, max, step: 1 },
            unit: ParamUnit::None,
            default: ParamValue::Int(default),
        }
    }

    /// A flag.
    pub fn boolean(name: impl Into<Cow<'static, str>>, default: bool) -> Self {
        Self {
            name: name.into(),
            description: "",
            kind: ParamKind::Bool,
            unit: ParamUnit::None,
            default: ParamValue::Bool(default),
        }
    }

    /// One of `options`; `default` should be listed.
    pub fn choice(
        name: impl Into<Cow<'static, str>>,
        options: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self {
            name: name.into(),
            description: "",
            kind: ParamKind::Choice { options },
            unit: ParamUnit::None,
            default: ParamValue::Text(default.to_owned()),
        }
    }

    /// A free-form string.
    pub fn text(name: impl Into<Cow<'static, str>>, default: &str) -> Self {
        Self {
            name: name.into(),
            description: "",
            kind: ParamKind::Text,
            unit: ParamUnit::None,
            default: ParamValue::Text(default.to_owned()),
        }
    }

    /// Pixel count, at least one.
    pub fn num_pixels(default: i64) -> Self {
        Self::int("num_pixels", default, 1, 10_000)
            .with_unit(ParamUnit::Pixels)
            .with_description("Number of pixels produced")
    }

    /// Sample rate in Hz.
    pub fn sample_rate(name: &'static str, default: f64) -> Self {
        Self::float(name, default, 8_000.0, 192_000.0, 100.0)
            .with_unit(ParamUnit::Hertz)
            .with_description("Audio sample rate")
    }

    /// Sets the description.
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the display unit.
    pub fn with_unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Checks `value` against this descriptor and returns its normalized form.
    ///
    /// Numbers are clamped into range and coerced to the declared numeric
    /// kind; everything else must match exactly.
    pub fn validate(&self, value: &ParamValue) -> Result<ParamValue, ParamError> {
        let normalized = match &self.kind {
            ParamKind::Float { min, max, .. } => value
                .as_f64()
                .filter(|v| v.is_finite())
                .map(|v| ParamValue::Float(v.clamp(*min, *max))),
            ParamKind::Int { min, max, .. } => value
                .as_i64()
                .map(|v| ParamValue::Int(v.clamp(*min, *max))),
            ParamKind::Bool => value.as_bool().map(ParamValue::Bool),
            ParamKind::Choice { options } => {
                let Some(text) = value.as_str() else {
                    return Err(self.mismatch(value));
                };
                if !options.contains(&text) {
                    return Err(ParamError::InvalidChoice {
                        name: self.name.to_string(),
                        value: text.to_owned(),
                        options: options.join(", "),
                    });
                }
                Some(value.clone())
            }
            ParamKind::Text => value.as_str().map(|s| ParamValue::Text(s.to_owned())),
        };
        normalized.ok_or_else(|| self.mismatch(value))
    }

    fn mismatch(&self, value: &ParamValue) -> ParamError {
        ParamError::TypeMismatch {
            name: self.name.to_string(),
            expected: self.kind.expected(),
            found: value.to_string(),
        }
    }
}

/// Validates a partial update against `schema`.
///
/// Every key must name a parameter in the schema. Returns the normalized
/// values; nothing is returned unless every entry is valid.
pub fn validate_partial(schema: &[ParamDescriptor], provided: &ParamMap) -> Result<ParamMap, ParamError> {
    let mut out = ParamMap::new();
    for (name, value) in provided {
        let descriptor = schema
            .iter()
            .find(|d| d.name == name.as_str())
            .ok_or_else(|| ParamError::Unknown { name: name.clone() })?;
        out.insert(name.clone(), descriptor.validate(value)?);
    }
    Ok(out)
}

/// Resolves a complete parameter set: provided values are validated and
/// every parameter left out takes its default.
pub fn resolve(schema: &[ParamDescriptor], provided: &ParamMap) -> Result<ParamMap, ParamError> {
    let mut out = validate_partial(schema, provided)?;
    for descriptor in schema {
        out.entry(descriptor.name.to_string())
            .or_insert_with(|| descriptor.default.clone());
    }
    Ok(out)
}

/// Typed lookups on a resolved [`ParamMap`], falling back to `default`.
pub trait ParamLookup {
    /// Real value of `name`.
    fn f64_or(&self, name: &str, default: f64) -> f64;
    /// Real value of `name`, narrowed to `f32`.
    fn f32_or(&self, name: &str, default: f32) -> f32 {
        self.f64_or(name, f64::from(default)) as f32
    }
    /// Integer value of `name`.
    fn i64_or(&self, name: &str, default: i64) -> i64;
    /// Non-negative integer value of `name`.
    fn usize_or(&self, name: &str, default: usize) -> usize {
        self.i64_or(name, default as i64).max(0) as usize
    }
    /// Flag value of `name`.
    fn bool_or(&self, name: &str, default: bool) -> bool;
    /// String value of `name`.
    fn str_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str;
}

impl ParamLookup for ParamMap {
    fn f64_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).and_then(ParamValue::as_f64).unwrap_or(default)
    }

    fn i64_or(&self, name: &str, default: i64) -> i64 {
        self.get(name).and_then(ParamValue::as_i64).unwrap_or(default)
    }

    fn bool_or(&self, name: &str, default: bool) -> bool {
        self.get(name).and_then(ParamValue::as_bool).unwrap_or(default)
    }

    fn str_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).and_then(ParamValue::as_str).unwrap_or(default)
    }
}

/// Builds a [`ParamMap`] from `(name, value)` pairs.
///
/// ```rust
/// use lumen_core::{ParamValue, param::param_map};
///
/// let map = param_map([("num_pixels", ParamValue::Int(150))]);
/// assert_eq!(map.len(), 1);
/// ```
pub fn param_map<I, K>(entries: I) -> ParamMap
where
    I: IntoIterator<Item = (K, ParamValue)>,
    K: Into<String>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
