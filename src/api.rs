//! Pipeline API
//!
//! [`DdlGenerator`] composes the three stages for one request: the configuration
//! merger, the isolated resource resolver and the generation invoker. All validation
//! that can fail with a configuration error happens before a worker is spawned.

use crate::config::{DEFAULT_DRIVER, DEFAULT_URL};
use crate::environment::ExecutionEnvironment;
use crate::error::DdlError;
use crate::generation::{
    keys, merge, GeneratedScripts, GenerationConfig, NamedSettings, OutputTarget, PersistenceUnitRef,
    PropertyConflict,
};
use crate::invoker::GenerationInvoker;
use crate::provider::{discover_units, MappingProvider, SchemaProvider, UnitDescriptor};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span};

/// Caller input for one generation run.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub unit: String,
    pub input_dir: PathBuf,
    pub fallback_dir: Option<PathBuf>,
    pub jdbc_driver: Option<String>,
    pub jdbc_url: Option<String>,
    pub jdbc_user: Option<String>,
    pub jdbc_password: Option<String>,
    pub output_dir: PathBuf,
    pub create_filename: String,
    pub drop_filename: String,
    pub overrides: BTreeMap<String, String>,
    pub virtual_access: bool,
    pub timeout: Option<Duration>,
}

impl GenerationRequest {
    pub fn new(
        unit: impl Into<String>,
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            unit: unit.into(),
            input_dir: input_dir.into(),
            fallback_dir: None,
            jdbc_driver: Some(DEFAULT_DRIVER.to_string()),
            jdbc_url: Some(DEFAULT_URL.to_string()),
            jdbc_user: None,
            jdbc_password: None,
            output_dir: output_dir.into(),
            create_filename: String::new(),
            drop_filename: String::new(),
            overrides: BTreeMap::new(),
            virtual_access: true,
            timeout: None,
        }
    }

    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }
}

/// Merged, validated inputs, ready to hand to a worker.
#[derive(Debug, Clone)]
pub struct PreparedGeneration {
    pub unit: PersistenceUnitRef,
    pub target: OutputTarget,
    pub config: GenerationConfig,
    pub conflicts: Vec<PropertyConflict>,
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub unit: String,
    pub output_dir: PathBuf,
    pub scripts: GeneratedScripts,
    pub conflicts: Vec<PropertyConflict>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl GenerationReport {
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

pub struct DdlGenerator<P: SchemaProvider + 'static = MappingProvider> {
    provider: Arc<P>,
}

impl DdlGenerator<MappingProvider> {
    pub fn new() -> Self {
        Self::with_provider(MappingProvider::new())
    }
}

impl Default for DdlGenerator<MappingProvider> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SchemaProvider + 'static> DdlGenerator<P> {
    pub fn with_provider(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Validate the request and merge its configuration. Creates the output directory.
    pub fn prepare(&self, request: &GenerationRequest) -> Result<PreparedGeneration, DdlError> {
        let unit = PersistenceUnitRef::new(&request.unit, &request.input_dir)?;
        let mut target = OutputTarget::prepare(
            &request.output_dir,
            &request.create_filename,
            &request.drop_filename,
        )?;

        let named = NamedSettings {
            jdbc_driver: request.jdbc_driver.clone(),
            jdbc_url: request.jdbc_url.clone(),
            jdbc_user: request.jdbc_user.clone(),
            jdbc_password: request.jdbc_password.clone(),
            output_dir: Some(target.dir().to_path_buf()),
            create_filename: Some(target.create_filename().to_string()),
            drop_filename: Some(target.drop_filename().to_string()),
        };
        let mut merged = merge(&named, &request.overrides)?;

        // An override may relocate the output; it gets the same checks as the named dir.
        let location = merged.config.output_dir()?;
        if location != target.dir() {
            target = OutputTarget::prepare(
                &location,
                target.create_filename(),
                target.drop_filename(),
            )?;
            merged
                .config
                .set(keys::APP_LOCATION, target.dir().to_string_lossy());
        }

        Ok(PreparedGeneration {
            unit,
            target,
            config: merged.config,
            conflicts: merged.conflicts,
        })
    }

    /// Run the whole pipeline and block until the worker finishes.
    pub fn run(&self, request: &GenerationRequest) -> Result<GenerationReport, DdlError> {
        let started_at = Utc::now();
        let span = info_span!("generate", unit = %request.unit);
        let _guard = span.enter();

        let prepared = self.prepare(request)?;
        let env = ExecutionEnvironment::builder(prepared.unit.search_root())
            .fallback(request.fallback_dir.clone())
            .virtual_access(request.virtual_access)
            .build()?;

        let invoker =
            GenerationInvoker::from_shared(Arc::clone(&self.provider)).with_timeout(request.timeout);
        let scripts = invoker
            .invoke(&prepared.unit, prepared.config, env)
            .into_result()?;

        let report = GenerationReport {
            unit: prepared.unit.name().to_string(),
            output_dir: prepared.target.dir().to_path_buf(),
            scripts,
            conflicts: prepared.conflicts,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            unit = %report.unit,
            scripts = report.scripts.paths().count(),
            duration_ms = report.duration_ms(),
            "Generation completed"
        );
        Ok(report)
    }

    /// Persistence units visible from a search root, without running generation.
    pub fn list_units(
        &self,
        input_dir: &std::path::Path,
        fallback_dir: Option<PathBuf>,
    ) -> Result<Vec<UnitDescriptor>, DdlError> {
        let env = ExecutionEnvironment::builder(input_dir)
            .fallback(fallback_dir)
            .build()?;
        discover_units(&env).map_err(|e| DdlError::generation("*", e))
    }
}
