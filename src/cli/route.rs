//! CLI route: single route table and run context. Dispatches to the pipeline API and
//! presentation.

use crate::api::DdlGenerator;
use crate::cli::parse::{Commands, GenerateArgs, OutputFormat};
use crate::cli::presentation::{
    format_config_json, format_config_text, format_report_json, format_report_text,
    format_units_json, format_units_text,
};
use crate::config::{ConfigLoader, DdlgenConfig, GenerationSettings};
use crate::error::DdlError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Runtime context for CLI execution: workspace root and loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: DdlgenConfig,
    generator: DdlGenerator,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, DdlError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        config.generation.validate()?;
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: DdlgenConfig) -> Self {
        Self {
            workspace_root,
            config,
            generator: DdlGenerator::new(),
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &DdlgenConfig {
        &self.config
    }

    /// Loaded settings with command-line flags applied and paths resolved.
    pub fn settings_for(&self, args: &GenerateArgs) -> GenerationSettings {
        let mut settings = self.config.generation.clone();
        if let Some(unit) = &args.unit {
            settings.unit = Some(unit.clone());
        }
        if let Some(dir) = &args.input_dir {
            settings.input_dir = dir.clone();
        }
        if let Some(dir) = &args.fallback_dir {
            settings.fallback_dir = Some(dir.clone());
        }
        if let Some(driver) = &args.driver {
            settings.driver = driver.clone();
        }
        if let Some(url) = &args.url {
            settings.url = url.clone();
        }
        if let Some(user) = &args.user {
            settings.user = Some(user.clone());
        }
        if let Some(password) = &args.password {
            settings.password = Some(password.clone());
        }
        if let Some(dir) = &args.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(name) = &args.create_file {
            settings.create_file = name.clone();
        }
        if let Some(name) = &args.drop_file {
            settings.drop_file = name.clone();
        }
        for (key, value) in &args.properties {
            settings.properties.insert(key.clone(), value.clone());
        }
        if args.no_virtual {
            settings.virtual_access = false;
        }
        if args.timeout_secs.is_some() {
            settings.timeout_secs = args.timeout_secs;
        }
        settings.resolve_paths(&self.workspace_root);
        settings
    }

    /// Execute a command and return its printable output.
    pub fn execute(&self, command: &Commands) -> Result<String, DdlError> {
        match command {
            Commands::Generate { args, format } => {
                let request = self.settings_for(args).to_request()?;
                debug!(unit = %request.unit, input_dir = %request.input_dir.display(), "Running generate");
                let report = self.generator.run(&request)?;
                match format {
                    OutputFormat::Text => Ok(format_report_text(&report)),
                    OutputFormat::Json => format_report_json(&report),
                }
            }
            Commands::Config { args, format } => {
                let request = self.settings_for(args).to_request()?;
                let prepared = self.generator.prepare(&request)?;
                match format {
                    OutputFormat::Text => Ok(format_config_text(&prepared.config, &prepared.conflicts)),
                    OutputFormat::Json => format_config_json(&prepared.config, &prepared.conflicts),
                }
            }
            Commands::Units {
                input_dir,
                fallback_dir,
                format,
            } => {
                let args = GenerateArgs {
                    input_dir: input_dir.clone(),
                    fallback_dir: fallback_dir.clone(),
                    ..GenerateArgs::default()
                };
                let settings = self.settings_for(&args);
                let units = self
                    .generator
                    .list_units(&settings.input_dir, settings.fallback_dir.clone())?;
                match format {
                    OutputFormat::Text => Ok(format_units_text(&units)),
                    OutputFormat::Json => format_units_json(&units),
                }
            }
        }
    }
}
