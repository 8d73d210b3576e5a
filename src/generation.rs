//! Generation data model
//!
//! Per-invocation values that flow through the pipeline: the unit reference, the
//! merged configuration, the output target and the outcome.

use crate::error::DdlError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub mod keys;
pub mod merge;
pub mod output;

pub use merge::{defaults, merge, MergeOutcome, NamedSettings, PropertyConflict};
pub use output::OutputTarget;

/// Identifies the persistence unit to process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistenceUnitRef {
    name: String,
    search_root: PathBuf,
}

impl PersistenceUnitRef {
    pub fn new(name: impl Into<String>, search_root: impl Into<PathBuf>) -> Result<Self, DdlError> {
        let name = name.into();
        let search_root = search_root.into();
        if name.trim().is_empty() {
            return Err(DdlError::Configuration(
                "Persistence unit name is required".to_string(),
            ));
        }
        if name.contains('\0') {
            return Err(DdlError::Configuration(format!(
                "Persistence unit name contains a NUL byte: {:?}",
                name
            )));
        }
        if search_root.as_os_str().is_empty() {
            return Err(DdlError::Configuration(
                "No search root defined for the persistence unit".to_string(),
            ));
        }
        Ok(Self { name, search_root })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn search_root(&self) -> &Path {
        &self.search_root
    }
}

/// Ordered key/value configuration handed to the provider. A `None` value marks a
/// key that is deliberately unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    entries: BTreeMap<String, Option<String>>,
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites any previous value for `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), Some(value.into()));
    }

    pub fn unset(&mut self, key: impl Into<String>) {
        self.entries.insert(key.into(), None);
    }

    pub(crate) fn put(&mut self, key: String, value: Option<String>) -> Option<Option<String>> {
        self.entries.insert(key, value)
    }

    /// Value for `key`; `None` both when absent and when deliberately unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|v| v.as_deref())
    }

    /// Raw entry, distinguishing an unset key (`Some(None)`) from an absent one.
    pub fn entry(&self, key: &str) -> Option<&Option<String>> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy with secret values replaced, for display and logs.
    pub fn masked(&self) -> GenerationConfig {
        let entries = self
            .entries
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    Some(_) if keys::is_secret(k) => Some("********".to_string()),
                    other => other.clone(),
                };
                (k.clone(), v)
            })
            .collect();
        GenerationConfig { entries }
    }

    /// Absolute output directory recorded under [`keys::APP_LOCATION`].
    pub fn output_dir(&self) -> Result<PathBuf, DdlError> {
        let raw = self.get(keys::APP_LOCATION).ok_or_else(|| {
            DdlError::Configuration(format!(
                "No output directory specified ({} is unset)",
                keys::APP_LOCATION
            ))
        })?;
        let path = PathBuf::from(raw);
        if !path.is_absolute() {
            return Err(DdlError::Configuration(format!(
                "Output directory must be absolute, got {:?}",
                path
            )));
        }
        Ok(path)
    }
}

/// Script files produced by one successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedScripts {
    pub create_script: Option<PathBuf>,
    pub drop_script: Option<PathBuf>,
}

impl GeneratedScripts {
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.create_script.iter().chain(self.drop_script.iter())
    }
}

/// Terminal result of one invocation, produced exactly once.
#[derive(Debug)]
pub enum GenerationOutcome {
    Succeeded(GeneratedScripts),
    Failed(DdlError),
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Succeeded(_))
    }

    pub fn into_result(self) -> Result<GeneratedScripts, DdlError> {
        match self {
            GenerationOutcome::Succeeded(scripts) => Ok(scripts),
            GenerationOutcome::Failed(err) => Err(err),
        }
    }
}
