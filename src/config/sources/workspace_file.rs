//! Workspace config file source: ddlgen.toml and ddlgen.{env}.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, File};
use std::path::{Path, PathBuf};

pub const WORKSPACE_CONFIG_FILE: &str = "ddlgen.toml";

/// Environment-specific file selected by `DDLGEN_ENV`, if set.
pub fn env_config_path(workspace_root: &Path) -> Option<PathBuf> {
    let env_name = std::env::var("DDLGEN_ENV").ok().filter(|v| !v.is_empty())?;
    Some(workspace_root.join(format!("ddlgen.{}.toml", env_name)))
}

/// Add workspace config files to the builder.
/// Precedence: ddlgen.toml (base) then ddlgen.{DDLGEN_ENV}.toml.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> ConfigBuilder<DefaultState> {
    let base = workspace_root.join(WORKSPACE_CONFIG_FILE);
    if base.exists() {
        builder = builder.add_source(File::from(base).required(false));
    }
    if let Some(env_path) = env_config_path(workspace_root) {
        if env_path.exists() {
            builder = builder.add_source(File::from(env_path).required(false));
        }
    }
    builder
}
