//! Schema Provider
//!
//! The invoker treats schema generation as a black box behind [`SchemaProvider`].
//! [`MappingProvider`] is the built-in implementation: it reads the unit's persistence
//! descriptor and mapping files through the execution environment, builds a relational
//! model, and writes create and drop scripts for the detected SQL dialect.

use crate::environment::ExecutionEnvironment;
use crate::error::ProviderError;
use crate::generation::{keys, GeneratedScripts, GenerationConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub mod ddl;
pub mod descriptor;
pub mod dialect;
pub mod mapping;
pub mod model;
pub mod xml;

pub use descriptor::{discover_units, find_unit, UnitDescriptor};
pub use dialect::Dialect;

/// Schema generation entry point, called once per invocation on the worker thread.
pub trait SchemaProvider: Send + Sync {
    fn generate_schema(
        &self,
        unit: &str,
        config: &GenerationConfig,
        env: &ExecutionEnvironment,
    ) -> Result<GeneratedScripts, ProviderError>;
}

/// Which scripts to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptsAction {
    None,
    Create,
    Drop,
    DropAndCreate,
}

impl ScriptsAction {
    pub fn parse(value: &str) -> Result<Self, ProviderError> {
        match value.trim().to_ascii_lowercase().as_str() {
            keys::ACTION_NONE => Ok(ScriptsAction::None),
            keys::ACTION_CREATE => Ok(ScriptsAction::Create),
            keys::ACTION_DROP => Ok(ScriptsAction::Drop),
            keys::ACTION_DROP_AND_CREATE => Ok(ScriptsAction::DropAndCreate),
            _ => Err(ProviderError::UnsupportedSetting {
                key: keys::SCRIPTS_ACTION.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn writes_create(self) -> bool {
        matches!(self, ScriptsAction::Create | ScriptsAction::DropAndCreate)
    }

    pub fn writes_drop(self) -> bool {
        matches!(self, ScriptsAction::Drop | ScriptsAction::DropAndCreate)
    }
}

/// Everything decided before any file is written.
#[derive(Debug, Clone)]
pub struct SchemaPlan {
    pub unit: UnitDescriptor,
    pub properties: BTreeMap<String, String>,
    pub dialect: Dialect,
    pub action: ScriptsAction,
    pub scripts: ddl::Scripts,
}

/// Unit properties overlaid with the generation config. Unset config values remove the key.
pub fn effective_properties(
    unit: &UnitDescriptor,
    config: &GenerationConfig,
) -> BTreeMap<String, String> {
    let mut properties = unit.properties.clone();
    for (key, value) in config.iter() {
        match value {
            Some(v) => {
                properties.insert(key.to_string(), v.to_string());
            }
            None => {
                properties.remove(key);
            }
        }
    }
    properties
}

/// Built-in provider driven by persistence descriptors and mapping files.
#[derive(Debug, Clone, Default)]
pub struct MappingProvider;

impl MappingProvider {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the unit, its settings and its model, and render the scripts in memory.
    pub fn plan(
        &self,
        unit: &str,
        config: &GenerationConfig,
        env: &ExecutionEnvironment,
    ) -> Result<SchemaPlan, ProviderError> {
        let descriptor = find_unit(env, unit)?;
        let properties = effective_properties(&descriptor, config);

        if let Some(action) = properties.get(keys::DATABASE_ACTION) {
            if !action.trim().eq_ignore_ascii_case(keys::ACTION_NONE) {
                return Err(ProviderError::UnsupportedSetting {
                    key: keys::DATABASE_ACTION.to_string(),
                    value: action.clone(),
                });
            }
        }
        let action = match properties.get(keys::SCRIPTS_ACTION) {
            Some(value) => ScriptsAction::parse(value)?,
            None => ScriptsAction::DropAndCreate,
        };
        let dialect = dialect::Dialect::detect(&properties)?;

        let mappings = load_mappings(&descriptor, env)?;
        let model = model::build(&descriptor, &mappings, env)?;
        let scripts = ddl::render(&model, dialect);

        debug!(
            unit = %descriptor.name,
            dialect = %dialect,
            action = ?action,
            create_statements = scripts.create.len(),
            drop_statements = scripts.drop.len(),
            "Schema plan ready"
        );

        Ok(SchemaPlan {
            unit: descriptor,
            properties,
            dialect,
            action,
            scripts,
        })
    }
}

fn load_mappings(
    unit: &UnitDescriptor,
    env: &ExecutionEnvironment,
) -> Result<Vec<mapping::EntityMappings>, ProviderError> {
    let mut files = Vec::new();
    for name in &unit.mapping_files {
        let resource = env
            .locate(name)?
            .ok_or_else(|| ProviderError::MappingFileNotFound(name.clone()))?;
        files.push(mapping::parse_mappings(&resource)?);
    }
    if !unit
        .mapping_files
        .iter()
        .any(|f| f == mapping::DEFAULT_MAPPING_RESOURCE)
    {
        if let Some(resource) = env.locate(mapping::DEFAULT_MAPPING_RESOURCE)? {
            files.push(mapping::parse_mappings(&resource)?);
        }
    }
    Ok(files)
}

fn target_path(properties: &BTreeMap<String, String>, key: &str, default: &str) -> PathBuf {
    let target = properties
        .get(key)
        .map(String::as_str)
        .filter(|t| !t.is_empty())
        .unwrap_or(default);
    let target = Path::new(target);
    if target.is_absolute() {
        return target.to_path_buf();
    }
    match properties.get(keys::APP_LOCATION) {
        Some(location) => Path::new(location).join(target),
        None => target.to_path_buf(),
    }
}

impl SchemaProvider for MappingProvider {
    fn generate_schema(
        &self,
        unit: &str,
        config: &GenerationConfig,
        env: &ExecutionEnvironment,
    ) -> Result<GeneratedScripts, ProviderError> {
        let plan = self.plan(unit, config, env)?;
        let terminate = plan
            .properties
            .get(keys::TERMINATE_STATEMENTS)
            .and_then(|v| crate::provider::xml::parse_bool(v))
            .unwrap_or(true);

        let mut generated = GeneratedScripts::default();
        if plan.action.writes_create() {
            let path = target_path(
                &plan.properties,
                keys::SCRIPTS_CREATE_TARGET,
                keys::DEFAULT_CREATE_FILENAME,
            );
            ddl::write_script(&path, &plan.scripts.create, terminate)?;
            generated.create_script = Some(path);
        }
        if plan.action.writes_drop() {
            let path = target_path(
                &plan.properties,
                keys::SCRIPTS_DROP_TARGET,
                keys::DEFAULT_DROP_FILENAME,
            );
            ddl::write_script(&path, &plan.scripts.drop, terminate)?;
            generated.drop_script = Some(path);
        }

        info!(
            unit = %plan.unit.name,
            dialect = %plan.dialect,
            scripts = generated.paths().count(),
            "Schema scripts written"
        );
        Ok(generated)
    }
}
