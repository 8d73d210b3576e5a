//! Property keys understood by the generation pipeline and the built-in provider.

pub const TRANSACTION_TYPE: &str = "persistence.transaction-type";
pub const JTA_DATA_SOURCE: &str = "persistence.jta-data-source";
pub const NON_JTA_DATA_SOURCE: &str = "persistence.non-jta-data-source";
pub const VALIDATION_MODE: &str = "persistence.validation.mode";

pub const SCRIPTS_ACTION: &str = "persistence.schema-generation.scripts.action";
pub const DATABASE_ACTION: &str = "persistence.schema-generation.database.action";
pub const SCRIPTS_CREATE_TARGET: &str = "persistence.schema-generation.scripts.create-target";
pub const SCRIPTS_DROP_TARGET: &str = "persistence.schema-generation.scripts.drop-target";

pub const JDBC_DRIVER: &str = "persistence.jdbc.driver";
pub const JDBC_URL: &str = "persistence.jdbc.url";
pub const JDBC_USER: &str = "persistence.jdbc.user";
pub const JDBC_PASSWORD: &str = "persistence.jdbc.password";

/// Absolute output directory the scripts are written to.
pub const APP_LOCATION: &str = "persistence.application-location";

pub const TARGET_DATABASE: &str = "persistence.target-database";
pub const TERMINATE_STATEMENTS: &str = "persistence.ddl.terminate-statements";

pub const RESOURCE_LOCAL: &str = "RESOURCE_LOCAL";
pub const VALIDATION_NONE: &str = "NONE";

pub const ACTION_NONE: &str = "none";
pub const ACTION_CREATE: &str = "create";
pub const ACTION_DROP: &str = "drop";
pub const ACTION_DROP_AND_CREATE: &str = "drop-and-create";

pub const DEFAULT_CREATE_FILENAME: &str = "createDDL.sql";
pub const DEFAULT_DROP_FILENAME: &str = "dropDDL.sql";

/// Keys whose values are never printed in clear text.
pub fn is_secret(key: &str) -> bool {
    key == JDBC_PASSWORD || key.ends_with(".password")
}
