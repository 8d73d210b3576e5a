//! Configuration System
//!
//! Layered configuration for the `ddlgen` command: built-in defaults, a global file,
//! workspace files and `DDLGEN_*` environment variables, with CLI flags applied on top
//! by the caller.

use crate::api::GenerationRequest;
use crate::error::DdlError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;
pub use sources::workspace_file::WORKSPACE_CONFIG_FILE;

pub const DEFAULT_INPUT_DIR: &str = "src/main/resources";
pub const DEFAULT_DRIVER: &str = "h2";
pub const DEFAULT_URL: &str = "h2:mem:ddlgen";
pub const DEFAULT_OUTPUT_DIR: &str = "target/generated/sql";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DdlgenConfig {
    #[serde(default)]
    pub generation: GenerationSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Inputs for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Persistence unit to generate
    #[serde(default)]
    pub unit: Option<String>,

    /// Search root holding META-INF/persistence.xml
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Compiled-output location searched after the input dir
    #[serde(default)]
    pub fallback_dir: Option<PathBuf>,

    #[serde(default = "default_driver")]
    pub driver: String,

    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_create_file")]
    pub create_file: String,

    #[serde(default = "default_drop_file")]
    pub drop_file: String,

    /// Synthesize entity types that exist only in mapping metadata
    #[serde(default = "default_true")]
    pub virtual_access: bool,

    /// Stop waiting for the worker after this many seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Override properties applied last
    #[serde(default, deserialize_with = "deserialize_properties")]
    pub properties: BTreeMap<String, String>,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from(DEFAULT_INPUT_DIR)
}

fn default_driver() -> String {
    DEFAULT_DRIVER.to_string()
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_create_file() -> String {
    crate::generation::keys::DEFAULT_CREATE_FILENAME.to_string()
}

fn default_drop_file() -> String {
    crate::generation::keys::DEFAULT_DROP_FILENAME.to_string()
}

fn default_true() -> bool {
    true
}

/// Accept both quoted dotted keys and nested tables, flattening to dotted keys.
fn deserialize_properties<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    let mut flat = BTreeMap::new();
    for (key, value) in raw {
        flatten_property(key, value, &mut flat);
    }
    Ok(flat)
}

fn flatten_property(key: String, value: serde_json::Value, out: &mut BTreeMap<String, String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (child, value) in map {
                flatten_property(format!("{}.{}", key, child), value, out);
            }
        }
        serde_json::Value::String(s) => {
            out.insert(key, s);
        }
        serde_json::Value::Null => {}
        other => {
            out.insert(key, other.to_string());
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            unit: None,
            input_dir: default_input_dir(),
            fallback_dir: None,
            driver: default_driver(),
            url: default_url(),
            user: None,
            password: None,
            output_dir: default_output_dir(),
            create_file: default_create_file(),
            drop_file: default_drop_file(),
            virtual_access: true,
            timeout_secs: None,
            properties: BTreeMap::new(),
        }
    }
}

impl GenerationSettings {
    /// Check every setting, reporting all problems at once.
    pub fn validate(&self) -> Result<(), DdlError> {
        let mut errors = Vec::new();
        if self.input_dir.as_os_str().is_empty() {
            errors.push("input_dir cannot be empty".to_string());
        }
        if self.output_dir.as_os_str().is_empty() {
            errors.push("output_dir cannot be empty".to_string());
        }
        if self.create_file.trim().is_empty() {
            errors.push("create_file cannot be empty".to_string());
        }
        if self.drop_file.trim().is_empty() {
            errors.push("drop_file cannot be empty".to_string());
        }
        if self.create_file == self.drop_file {
            errors.push(format!(
                "create_file and drop_file must differ (both are '{}')",
                self.create_file
            ));
        }
        if self.timeout_secs == Some(0) {
            errors.push("timeout_secs must be greater than zero".to_string());
        }
        if self.properties.keys().any(|k| k.trim().is_empty()) {
            errors.push("property keys cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DdlError::Configuration(format!(
                "Invalid generation settings: {}",
                errors.join("; ")
            )))
        }
    }

    /// Resolve relative directories against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() && !p.as_os_str().is_empty() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.input_dir);
        resolve(&mut self.output_dir);
        if let Some(fallback) = self.fallback_dir.as_mut() {
            resolve(fallback);
        }
    }

    /// Build a pipeline request; a unit name is required.
    pub fn to_request(&self) -> Result<GenerationRequest, DdlError> {
        self.validate()?;
        let unit = self
            .unit
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                DdlError::Configuration(
                    "No persistence unit given (use --unit or generation.unit)".to_string(),
                )
            })?;

        Ok(GenerationRequest {
            fallback_dir: self.fallback_dir.clone(),
            jdbc_driver: Some(self.driver.clone()),
            jdbc_url: Some(self.url.clone()),
            jdbc_user: self.user.clone(),
            jdbc_password: self.password.clone(),
            create_filename: self.create_file.clone(),
            drop_filename: self.drop_file.clone(),
            overrides: self.properties.clone(),
            virtual_access: self.virtual_access,
            timeout: self.timeout_secs.map(Duration::from_secs),
            ..GenerationRequest::new(unit, &self.input_dir, &self.output_dir)
        })
    }
}
