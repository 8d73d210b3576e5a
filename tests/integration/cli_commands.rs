//! Command routing through RunContext and the ddlgen binary.

use super::test_utils::{with_xdg_env, write_orders_fixture};
use ddlgen::cli::{Commands, GenerateArgs, OutputFormat, RunContext};
use ddlgen::config::DdlgenConfig;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn generate_args(input: &Path, output: &Path) -> GenerateArgs {
    GenerateArgs {
        unit: Some("orders-pu".to_string()),
        input_dir: Some(input.to_path_buf()),
        output_dir: Some(output.to_path_buf()),
        ..GenerateArgs::default()
    }
}

fn context(workspace: &Path) -> RunContext {
    RunContext::with_config(workspace.to_path_buf(), DdlgenConfig::default())
}

#[test]
fn test_generate_json_reports_script_paths() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("resources");
    write_orders_fixture(&input);

    let output = context(temp.path())
        .execute(&Commands::Generate {
            args: generate_args(&input, Path::new("out")),
            format: OutputFormat::Json,
        })
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["status"], "succeeded");
    assert_eq!(json["unit"], "orders-pu");
    let create = json["create_script"].as_str().unwrap();
    assert!(Path::new(create).is_absolute());
    assert!(fs::read_to_string(create).unwrap().contains("CREATE TABLE \"ORDER\""));
    assert!(temp.path().join("out").join("dropDDL.sql").exists());
}

#[test]
fn test_config_command_masks_password_and_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("resources");
    write_orders_fixture(&input);

    let args = GenerateArgs {
        password: Some("hunter2".to_string()),
        ..generate_args(&input, &temp.path().join("out"))
    };
    let output = context(temp.path())
        .execute(&Commands::Config {
            args,
            format: OutputFormat::Json,
        })
        .unwrap();

    assert!(!output.contains("hunter2"));
    assert!(output.contains("persistence.application-location"));
    assert!(!temp.path().join("out").join("createDDL.sql").exists());
}

#[test]
fn test_units_command_lists_declared_units() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("resources");
    write_orders_fixture(&input);

    let output = context(temp.path())
        .execute(&Commands::Units {
            input_dir: Some(input.clone()),
            fallback_dir: None,
            format: OutputFormat::Json,
        })
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    let units = json.as_array().unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0]["name"], "orders-pu");
}

#[test]
fn test_generate_without_unit_is_configuration_error() {
    let temp = TempDir::new().unwrap();
    let args = GenerateArgs {
        unit: None,
        ..generate_args(temp.path(), &temp.path().join("out"))
    };
    let err = context(temp.path())
        .execute(&Commands::Generate {
            args,
            format: OutputFormat::Text,
        })
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_workspace_config_file_drives_generate() {
    let temp = TempDir::new().unwrap();
    let workspace = temp.path().join("ws");
    write_orders_fixture(&workspace.join("src/main/resources"));
    fs::write(
        workspace.join("ddlgen.toml"),
        "[generation]\nunit = \"orders-pu\"\ncreate_file = \"create.sql\"\ndrop_file = \"drop.sql\"\n",
    )
    .unwrap();

    let output = with_xdg_env(&temp, || {
        let ctx = RunContext::new(workspace.clone(), None).unwrap();
        ctx.execute(&Commands::Generate {
            args: GenerateArgs::default(),
            format: OutputFormat::Text,
        })
        .unwrap()
    });

    assert!(output.contains("orders-pu"));
    let out = workspace.join("target/generated/sql");
    assert!(out.join("create.sql").exists());
    assert!(out.join("drop.sql").exists());
}

fn ddlgen_command(temp: &TempDir) -> Command {
    let home = temp.path().join("home");
    let config_home = temp.path().join("config");
    fs::create_dir_all(&home).unwrap();
    fs::create_dir_all(&config_home).unwrap();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ddlgen"));
    cmd.env_clear()
        .env("HOME", &home)
        .env("XDG_CONFIG_HOME", &config_home);
    cmd
}

#[test]
fn test_binary_generates_scripts() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("resources");
    let out = temp.path().join("out");
    write_orders_fixture(&input);

    let output = ddlgen_command(&temp)
        .arg("--quiet")
        .arg("--workspace")
        .arg(temp.path())
        .args(["generate", "--unit", "orders-pu", "--format", "json"])
        .arg("--input-dir")
        .arg(&input)
        .arg("--output-dir")
        .arg(&out)
        .output()
        .expect("run ddlgen");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["unit"], "orders-pu");
    assert!(out.join("createDDL.sql").exists());
    assert!(out.join("dropDDL.sql").exists());
}

#[test]
fn test_binary_failure_exits_nonzero_with_kind() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("empty");
    fs::create_dir_all(&input).unwrap();

    let output = ddlgen_command(&temp)
        .arg("--quiet")
        .arg("--workspace")
        .arg(temp.path())
        .args(["generate", "-u", "orders-pu"])
        .arg("--input-dir")
        .arg(&input)
        .arg("-o")
        .arg(temp.path().join("out"))
        .output()
        .expect("run ddlgen");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GenerationFailure"), "stderr: {}", stderr);
    assert!(!temp.path().join("out").join("createDDL.sql").exists());
}
