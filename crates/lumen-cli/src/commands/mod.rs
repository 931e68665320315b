//! CLI command implementations.

pub mod common;
pub mod effects;
pub mod inspect;
pub mod presets;
pub mod render;
pub mod run;
pub mod save;
