//! Error types for the DDL generation pipeline.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures raised inside a schema provider, on the worker.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No persistence descriptor found ({0}) in the search locations")]
    DescriptorNotFound(String),

    #[error("Persistence unit not found: {0}")]
    UnitNotFound(String),

    #[error("Mapping file not found: {0}")]
    MappingFileNotFound(String),

    #[error("Malformed metadata in {resource}: {message}")]
    MalformedMetadata { resource: String, message: String },

    #[error("Type not found: {0}")]
    TypeNotFound(String),

    #[error("Unsupported mapping: {0}")]
    UnsupportedMapping(String),

    #[error("Unsupported setting {key}={value}")]
    UnsupportedSetting { key: String, value: String },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Generation worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("Failed to spawn generation worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("Generation worker did not finish within {0:?}")]
    TimedOut(Duration),
}

/// Top-level pipeline errors. Every variant is fatal.
#[derive(Debug, Error)]
pub enum DdlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Environment construction error: {0}")]
    EnvironmentConstruction(String),

    #[error("Generation failed for persistence unit '{unit}': {source}")]
    Generation {
        unit: String,
        #[source]
        source: ProviderError,
    },
}

impl DdlError {
    pub fn generation(unit: impl Into<String>, source: ProviderError) -> Self {
        DdlError::Generation {
            unit: unit.into(),
            source,
        }
    }

    /// Stable name of the error kind, used in CLI and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            DdlError::Configuration(_) => "ConfigurationError",
            DdlError::EnvironmentConstruction(_) => "EnvironmentConstructionError",
            DdlError::Generation { .. } => "GenerationFailure",
        }
    }

    /// Innermost cause in the source chain, rendered as one line.
    pub fn root_cause(&self) -> String {
        let mut current: &dyn std::error::Error = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current.to_string()
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, DdlError::Configuration(_))
    }
}

impl From<config::ConfigError> for DdlError {
    fn from(err: config::ConfigError) -> Self {
        DdlError::Configuration(err.to_string())
    }
}
