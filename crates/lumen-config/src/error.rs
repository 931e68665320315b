//! Error types for configuration operations.

use std::path::PathBuf;

use lumen_core::{ErrorKind, GraphError, ParamError};
use lumen_registry::RegistryError;
use thiserror::Error;

/// Errors that can occur while saving, loading or building graphs and
/// engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The snapshot is not well-formed JSON.
    #[error("failed to parse snapshot: {0}")]
    Parse(#[source] serde_json::Error),

    /// The snapshot is valid JSON but a field is missing or has the wrong shape.
    #[error("invalid snapshot: {0}")]
    Schema(String),

    /// Serializing a snapshot failed.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    /// A node's type tag is not in the effect registry.
    #[error("unknown effect type: {0}")]
    UnknownEffectType(String),

    /// Construction or tunable parameters were rejected.
    #[error("invalid parameters for {context}: {source}")]
    InvalidParameter {
        /// Which node or effect type was being configured.
        context: String,
        /// Underlying parameter error.
        #[source]
        source: ParamError,
    },

    /// A connection names a node that the snapshot does not contain.
    #[error("connection {connection} references missing node {node}")]
    DanglingConnection {
        /// Connection uid.
        connection: u64,
        /// Missing node uid.
        node: u64,
    },

    /// The graph rejected a node or connection.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Preset not found
    #[error("preset not found: {0}")]
    PresetNotFound(String),

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Splits a JSON decode failure into syntax problems and shape problems.
    pub(crate) fn from_json(err: serde_json::Error) -> Self {
        match err.classify() {
            serde_json::error::Category::Data => ConfigError::Schema(err.to_string()),
            _ => ConfigError::Parse(err),
        }
    }

    /// Attaches a node context to a registry failure.
    pub(crate) fn from_registry(err: RegistryError, context: impl FnOnce() -> String) -> Self {
        match err {
            RegistryError::UnknownEffectType(name) => ConfigError::UnknownEffectType(name),
            RegistryError::InvalidConstructor { source, .. } => ConfigError::InvalidParameter {
                context: context(),
                source,
            },
        }
    }

    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::Graph(err) => err.kind(),
            ConfigError::DanglingConnection { .. } => ErrorKind::Topology,
            ConfigError::PresetNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Configuration,
        }
    }
}

impl From<RegistryError> for ConfigError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownEffectType(name) => ConfigError::UnknownEffectType(name),
            RegistryError::InvalidConstructor { type_name, source } => ConfigError::InvalidParameter {
                context: format!("'{type_name}'"),
                source,
            },
        }
    }
}
