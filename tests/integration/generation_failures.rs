//! Failure paths: every error surfaces as a typed result and no scripts are left behind
//! when generation never started writing.

use super::test_utils::{write_orders_fixture, write_persistence_xml, write_resource};
use ddlgen::generation::keys;
use ddlgen::{DdlError, DdlGenerator, GenerationRequest, ProviderError};
use std::fs;
use tempfile::TempDir;

fn request(unit: &str, input: &TempDir, output: &TempDir) -> GenerationRequest {
    GenerationRequest::new(unit, input.path(), output.path().join("out"))
}

fn generation_cause(err: &DdlError) -> &ProviderError {
    match err {
        DdlError::Generation { source, .. } => source,
        other => panic!("expected a generation failure, got {:?}", other),
    }
}

#[test]
fn test_missing_descriptor_fails_without_scripts() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    let err = DdlGenerator::new()
        .run(&request("orders-pu", &input, &output))
        .unwrap_err();

    assert_eq!(err.kind(), "GenerationFailure");
    assert!(matches!(generation_cause(&err), ProviderError::DescriptorNotFound(_)));
    let out = output.path().join("out");
    assert!(!out.join(keys::DEFAULT_CREATE_FILENAME).exists());
    assert!(!out.join(keys::DEFAULT_DROP_FILENAME).exists());
}

#[test]
fn test_unknown_unit_names_the_unit() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_orders_fixture(input.path());

    let err = DdlGenerator::new()
        .run(&request("billing-pu", &input, &output))
        .unwrap_err();
    assert!(matches!(generation_cause(&err), ProviderError::UnitNotFound(u) if u == "billing-pu"));
    assert!(err.to_string().contains("billing-pu"));
}

#[test]
fn test_output_dir_that_is_a_file_is_configuration_error() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_orders_fixture(input.path());
    fs::write(output.path().join("out"), "occupied").unwrap();

    let err = DdlGenerator::new()
        .run(&request("orders-pu", &input, &output))
        .unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.kind(), "ConfigurationError");
}

#[test]
fn test_relative_location_override_is_configuration_error() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_orders_fixture(input.path());

    let req = request("orders-pu", &input, &output).with_override(keys::APP_LOCATION, "relative/out");
    let err = DdlGenerator::new().run(&req).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_virtual_entities_need_virtual_access() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_orders_fixture(input.path());

    let req = GenerationRequest {
        virtual_access: false,
        ..request("orders-pu", &input, &output)
    };
    let err = DdlGenerator::new().run(&req).unwrap_err();
    assert!(matches!(generation_cause(&err), ProviderError::TypeNotFound(_)));
}

#[test]
fn test_malformed_mapping_is_reported_with_resource() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_persistence_xml(input.path(), "orders-pu", &[], &[]);
    write_resource(input.path(), "META-INF/orm.xml", "<entity-mappings><entity class=");

    let err = DdlGenerator::new()
        .run(&request("orders-pu", &input, &output))
        .unwrap_err();
    match generation_cause(&err) {
        ProviderError::MalformedMetadata { resource, .. } => {
            assert!(resource.contains("orm.xml"), "resource was {}", resource)
        }
        other => panic!("unexpected cause {:?}", other),
    }
}

#[test]
fn test_unknown_target_database_is_unsupported() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_orders_fixture(input.path());

    let req = request("orders-pu", &input, &output).with_override(keys::TARGET_DATABASE, "oracle-7");
    let err = DdlGenerator::new().run(&req).unwrap_err();
    assert!(matches!(
        generation_cause(&err),
        ProviderError::UnsupportedSetting { key, .. } if key == keys::TARGET_DATABASE
    ));
}

#[test]
fn test_missing_input_dir_is_environment_error() {
    let output = TempDir::new().unwrap();
    let req = GenerationRequest::new("orders-pu", output.path().join("nope"), output.path().join("out"));
    let err = DdlGenerator::new().run(&req).unwrap_err();
    assert_eq!(err.kind(), "EnvironmentConstructionError");
}
