//! Merge rules: defaults, named settings, override bag, conflict reporting.
//!
//! Precedence is strictly ascending: defaults < named settings < overrides. Every
//! write overwrites. An override that changes an existing value is reported once
//! per key, then applied.

use super::keys;
use super::GenerationConfig;
use crate::error::DdlError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Fixed generation-mode settings: local transactions, no managed data sources,
/// validation off, scripts only and no database action.
pub fn defaults() -> GenerationConfig {
    let mut config = GenerationConfig::new();
    config.set(keys::TRANSACTION_TYPE, keys::RESOURCE_LOCAL);
    config.unset(keys::JTA_DATA_SOURCE);
    config.unset(keys::NON_JTA_DATA_SOURCE);
    config.set(keys::VALIDATION_MODE, keys::VALIDATION_NONE);
    config.set(keys::SCRIPTS_ACTION, keys::ACTION_DROP_AND_CREATE);
    config.set(keys::DATABASE_ACTION, keys::ACTION_NONE);
    config
}

/// Explicit connection and output parameters.
#[derive(Debug, Clone, Default)]
pub struct NamedSettings {
    pub jdbc_driver: Option<String>,
    pub jdbc_url: Option<String>,
    pub jdbc_user: Option<String>,
    pub jdbc_password: Option<String>,
    /// Must already be absolute; see [`super::OutputTarget::prepare`].
    pub output_dir: Option<PathBuf>,
    pub create_filename: Option<String>,
    pub drop_filename: Option<String>,
}

impl NamedSettings {
    fn apply(&self, config: &mut GenerationConfig) -> Result<(), DdlError> {
        set_non_empty(config, keys::JDBC_DRIVER, &self.jdbc_driver);
        set_non_empty(config, keys::JDBC_URL, &self.jdbc_url);
        set_non_empty(config, keys::JDBC_USER, &self.jdbc_user);
        set_non_empty(config, keys::JDBC_PASSWORD, &self.jdbc_password);

        let output_dir = self.output_dir.as_ref().ok_or_else(|| {
            DdlError::Configuration("No output directory specified".to_string())
        })?;
        if !output_dir.is_absolute() {
            return Err(DdlError::Configuration(format!(
                "Output directory must be resolved to an absolute path, got {:?}",
                output_dir
            )));
        }
        config.set(keys::APP_LOCATION, output_dir.to_string_lossy());

        set_non_empty(config, keys::SCRIPTS_CREATE_TARGET, &self.create_filename);
        set_non_empty(config, keys::SCRIPTS_DROP_TARGET, &self.drop_filename);
        Ok(())
    }
}

fn set_non_empty(config: &mut GenerationConfig, key: &str, value: &Option<String>) {
    if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
        config.set(key, v);
    }
}

/// An override that replaced a different, already present value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyConflict {
    pub key: String,
    pub previous: Option<String>,
    pub value: String,
}

/// Merged configuration plus the conflicts observed while applying overrides.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub config: GenerationConfig,
    pub conflicts: Vec<PropertyConflict>,
}

/// Build the authoritative configuration for one invocation.
pub fn merge(
    named: &NamedSettings,
    overrides: &BTreeMap<String, String>,
) -> Result<MergeOutcome, DdlError> {
    let mut config = defaults();
    named.apply(&mut config)?;

    let mut conflicts = Vec::new();
    for (key, value) in overrides {
        if let Some(previous) = config.entry(key) {
            if previous.as_deref() != Some(value.as_str()) {
                let shown = |v: Option<&str>| match v {
                    Some(_) if keys::is_secret(key) => "********".to_string(),
                    Some(v) => v.to_string(),
                    None => "<unset>".to_string(),
                };
                warn!(
                    key = %key,
                    previous = %shown(previous.as_deref()),
                    value = %shown(Some(value)),
                    "property {} will overwrite the existing value",
                    key
                );
                conflicts.push(PropertyConflict {
                    key: key.clone(),
                    previous: previous.clone(),
                    value: value.clone(),
                });
            }
        }
        config.put(key.clone(), Some(value.clone()));
    }

    // An override may have replaced the output directory.
    config.output_dir()?;

    debug!(
        entries = config.len(),
        conflicts = conflicts.len(),
        "Merged generation configuration"
    );
    Ok(MergeOutcome { config, conflicts })
}
