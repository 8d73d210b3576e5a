//! Layered configuration loading and conversion into generation requests.

use super::test_utils::with_xdg_env;
use ddlgen::config::{global_config_path, ConfigLoader, DEFAULT_DRIVER, WORKSPACE_CONFIG_FILE};
use ddlgen::generation::keys;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_defaults_without_any_file() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    fs::create_dir_all(&workspace).unwrap();

    let config = with_xdg_env(&test_dir, || ConfigLoader::load(&workspace).unwrap());
    assert_eq!(config.generation.driver, DEFAULT_DRIVER);
    assert_eq!(config.generation.create_file, keys::DEFAULT_CREATE_FILENAME);
    assert!(config.generation.unit.is_none());
    assert!(config.generation.virtual_access);
    assert!(config.logging.enabled);
}

#[test]
fn test_workspace_file_overrides_global_file() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    fs::create_dir_all(&workspace).unwrap();

    let config = with_xdg_env(&test_dir, || {
        let global = global_config_path().unwrap();
        fs::create_dir_all(global.parent().unwrap()).unwrap();
        fs::write(
            &global,
            "[generation]\nunit = \"global-pu\"\ndriver = \"postgresql\"\n",
        )
        .unwrap();
        fs::write(
            workspace.join(WORKSPACE_CONFIG_FILE),
            "[generation]\nunit = \"orders-pu\"\ntimeout_secs = 30\n\n[generation.properties]\n\"persistence.target-database\" = \"sqlite\"\n",
        )
        .unwrap();
        ConfigLoader::load(&workspace).unwrap()
    });

    assert_eq!(config.generation.unit.as_deref(), Some("orders-pu"));
    assert_eq!(config.generation.driver, "postgresql");
    assert_eq!(config.generation.timeout_secs, Some(30));
    assert_eq!(
        config.generation.properties.get(keys::TARGET_DATABASE).map(String::as_str),
        Some("sqlite")
    );
}

#[test]
fn test_environment_variables_take_precedence() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    fs::create_dir_all(&workspace).unwrap();
    fs::write(
        workspace.join(WORKSPACE_CONFIG_FILE),
        "[generation]\nunit = \"orders-pu\"\n",
    )
    .unwrap();

    let config = with_xdg_env(&test_dir, || {
        std::env::set_var("DDLGEN_GENERATION__UNIT", "billing-pu");
        let loaded = ConfigLoader::load(&workspace);
        std::env::remove_var("DDLGEN_GENERATION__UNIT");
        loaded.unwrap()
    });
    assert_eq!(config.generation.unit.as_deref(), Some("billing-pu"));
}

#[test]
fn test_settings_become_request() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("custom.toml");
    fs::write(
        &path,
        "[generation]\nunit = \"orders-pu\"\noutput_dir = \"sql\"\ncreate_file = \"c.sql\"\ndrop_file = \"d.sql\"\ntimeout_secs = 5\nvirtual_access = false\n",
    )
    .unwrap();

    let config = with_xdg_env(&test_dir, || ConfigLoader::load_from_file(&path).unwrap());
    let mut settings = config.generation;
    settings.resolve_paths(test_dir.path());

    let request = settings.to_request().unwrap();
    assert_eq!(request.unit, "orders-pu");
    assert_eq!(request.output_dir, test_dir.path().join("sql"));
    assert_eq!(request.create_filename, "c.sql");
    assert_eq!(request.drop_filename, "d.sql");
    assert_eq!(request.timeout, Some(Duration::from_secs(5)));
    assert!(!request.virtual_access);
    assert_eq!(request.jdbc_driver.as_deref(), Some(DEFAULT_DRIVER));
}

#[test]
fn test_invalid_settings_report_every_problem() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("bad.toml");
    fs::write(
        &path,
        "[generation]\ncreate_file = \"same.sql\"\ndrop_file = \"same.sql\"\ntimeout_secs = 0\n",
    )
    .unwrap();

    let config = with_xdg_env(&test_dir, || ConfigLoader::load_from_file(&path).unwrap());
    let err = config.generation.validate().unwrap_err();
    let message = err.to_string();
    assert!(err.is_configuration());
    assert!(message.contains("must differ"));
    assert!(message.contains("timeout_secs"));
}

#[test]
fn test_missing_explicit_config_file() {
    let test_dir = TempDir::new().unwrap();
    let err = ConfigLoader::load_from_file(&test_dir.path().join("absent.toml")).unwrap_err();
    assert!(err.is_configuration());
}
