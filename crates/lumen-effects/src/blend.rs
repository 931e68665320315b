//! Per-pixel blend modes used by [`Combine`](crate::Combine) and
//! [`Spectrum`](crate::Spectrum).

use std::fmt;
use std::str::FromStr;

use lumen_core::{ParamError, Rgb};

/// How two colors are merged channel by channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    /// Brighter of the two.
    #[default]
    LightenOnly,
    /// Darker of the two.
    DarkenOnly,
    /// Sum, saturating at full intensity.
    Addition,
    /// Product, normalized to the 0..255 range.
    Multiply,
    /// Inverted product of inverses.
    Screen,
    /// Mean of the two.
    Average,
}

impl BlendMode {
    /// All mode names, in declaration order. Used as a choice list.
    pub const NAMES: &'static [&'static str] =
        &["lightenOnly", "darkenOnly", "addition", "multiply", "screen", "average"];

    /// Parameter name of this mode.
    pub const fn name(self) -> &'static str {
        match self {
            BlendMode::LightenOnly => "lightenOnly",
            BlendMode::DarkenOnly => "darkenOnly",
            BlendMode::Addition => "addition",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Average => "average",
        }
    }

    /// Merges two channel values.
    #[inline]
    pub fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            BlendMode::LightenOnly => a.max(b),
            BlendMode::DarkenOnly => a.min(b),
            BlendMode::Addition => (a + b).min(255.0),
            BlendMode::Multiply => a * b / 255.0,
            BlendMode::Screen => 255.0 - (255.0 - a) * (255.0 - b) / 255.0,
            BlendMode::Average => (a + b) * 0.5,
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlendMode {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lightenOnly" => Ok(BlendMode::LightenOnly),
            "darkenOnly" => Ok(BlendMode::DarkenOnly),
            "addition" => Ok(BlendMode::Addition),
            "multiply" => Ok(BlendMode::Multiply),
            "screen" => Ok(BlendMode::Screen),
            "average" => Ok(BlendMode::Average),
            other => Err(ParamError::InvalidChoice {
                name: "mode".into(),
                value: other.to_owned(),
                options: Self::NAMES.join(", "),
            }),
        }
    }
}

/// Blends two pixel tables.
///
/// The result has the length of the longer table; the shorter one is
/// treated as black past its end.
pub fn blend(a: &[Rgb], b: &[Rgb], mode: BlendMode) -> Vec<Rgb> {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let pa = a.get(i).copied().unwrap_or(Rgb::BLACK);
            let pb = b.get(i).copied().unwrap_or(Rgb::BLACK);
            pa.zip_with(pb, |x, y| mode.apply(x, y))
        })
        .collect()
}
