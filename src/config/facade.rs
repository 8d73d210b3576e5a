//! Config loading facade: assembles the layered sources and deserializes the result.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::DdlgenConfig;
use crate::error::DdlError;
use config::File;
use std::path::Path;
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): built-in defaults, global file, workspace
    /// files, `DDLGEN_*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<DdlgenConfig, DdlError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder);
        let builder = workspace_file::add_to_builder(builder, workspace_root);
        let builder = environment::add_to_builder(builder);

        let config: DdlgenConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load from one required file instead of the global and workspace files.
    pub fn load_from_file(path: &Path) -> Result<DdlgenConfig, DdlError> {
        if !path.is_file() {
            return Err(DdlError::Configuration(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true));
        let builder = environment::add_to_builder(builder);

        let config: DdlgenConfig = builder.build()?.try_deserialize()?;
        debug!(config_file = %path.display(), "Configuration loaded from file");
        Ok(config)
    }
}
