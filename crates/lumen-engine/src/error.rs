//! Engine and control-plane errors.

use lumen_config::ConfigError;
use lumen_core::{ErrorKind, GraphError};
use lumen_registry::RegistryError;
use thiserror::Error;

/// Errors from starting or configuring the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The tick thread could not be started.
    #[error("failed to spawn tick thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// Building the initial graph failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The loop is already running.
    #[error("tick loop already running")]
    AlreadyRunning,
}

impl EngineError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Spawn(_) => ErrorKind::RuntimeProcessing,
            EngineError::Config(err) => err.kind(),
            EngineError::AlreadyRunning => ErrorKind::Configuration,
        }
    }
}

/// Rejection reason returned by a control-plane operation.
///
/// The graph is unchanged whenever one of these is returned.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The graph rejected the mutation or lookup.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The effect type is unknown or its constructor arguments are invalid.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A snapshot could not be encoded or decoded.
    #[error(transparent)]
    Snapshot(#[from] ConfigError),
}

impl ControlError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ControlError::Graph(err) => err.kind(),
            ControlError::Registry(err) => err.kind(),
            ControlError::Snapshot(err) => err.kind(),
        }
    }
}
