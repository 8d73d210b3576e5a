//! Merge rules: built-in defaults below every file and environment source.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with the generation defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("generation.input_dir", crate::config::DEFAULT_INPUT_DIR)?
        .set_default("generation.driver", crate::config::DEFAULT_DRIVER)?
        .set_default("generation.url", crate::config::DEFAULT_URL)?
        .set_default("generation.output_dir", crate::config::DEFAULT_OUTPUT_DIR)?
        .set_default("generation.create_file", crate::generation::keys::DEFAULT_CREATE_FILENAME)?
        .set_default("generation.drop_file", crate::generation::keys::DEFAULT_DROP_FILENAME)?
        .set_default("generation.virtual_access", true)?
        .set_default("logging.level", "info")?
        .set_default("logging.output", "stderr")
}
