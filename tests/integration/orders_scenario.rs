//! End-to-end generation of the orders persistence unit through the pipeline API.

use super::test_utils::{order_mapping, write_orders_fixture, write_persistence_xml, write_resource};
use ddlgen::config::DEFAULT_DRIVER;
use ddlgen::environment::ExecutionEnvironment;
use ddlgen::generation::keys;
use ddlgen::provider::Dialect;
use ddlgen::{DdlGenerator, GenerationRequest, MappingProvider};
use std::fs;
use tempfile::TempDir;

fn request(input: &TempDir, output: &TempDir) -> GenerationRequest {
    GenerationRequest {
        jdbc_driver: Some("h2".to_string()),
        jdbc_url: Some("h2:mem:ddlgen".to_string()),
        create_filename: "create.sql".to_string(),
        drop_filename: "drop.sql".to_string(),
        ..GenerationRequest::new("orders-pu", input.path(), output.path().join("build/out"))
    }
}

#[test]
fn test_orders_unit_writes_create_and_drop_scripts() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_orders_fixture(input.path());

    let report = DdlGenerator::new().run(&request(&input, &output)).unwrap();

    let out_dir = dunce::canonicalize(output.path().join("build/out")).unwrap();
    assert_eq!(report.output_dir, out_dir);
    assert_eq!(report.unit, "orders-pu");
    assert!(report.conflicts.is_empty());

    let create_path = report.scripts.create_script.clone().unwrap();
    let drop_path = report.scripts.drop_script.clone().unwrap();
    assert_eq!(create_path, out_dir.join("create.sql"));
    assert_eq!(drop_path, out_dir.join("drop.sql"));

    let create = fs::read_to_string(&create_path).unwrap();
    assert_eq!(
        create,
        "CREATE TABLE \"ORDER\" (ID BIGINT GENERATED BY DEFAULT AS IDENTITY NOT NULL, \
         REFERENCE VARCHAR(40) NOT NULL UNIQUE, TOTAL DECIMAL(12,2), PLACEDAT TIMESTAMP, \
         VERSION INTEGER, PRIMARY KEY (ID));\n"
    );
    let drop = fs::read_to_string(&drop_path).unwrap();
    assert_eq!(drop, "DROP TABLE \"ORDER\";\n");
}

#[test]
fn test_library_defaults_select_h2() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_orders_fixture(input.path());

    let report = DdlGenerator::new()
        .run(&GenerationRequest::new("orders-pu", input.path(), output.path()))
        .unwrap();

    let create = fs::read_to_string(report.scripts.create_script.unwrap()).unwrap();
    assert!(create.starts_with(
        "CREATE TABLE \"ORDER\" (ID BIGINT GENERATED BY DEFAULT AS IDENTITY NOT NULL"
    ));

    let prepared = DdlGenerator::new()
        .prepare(&GenerationRequest::new("orders-pu", input.path(), output.path()))
        .unwrap();
    assert_eq!(prepared.config.get(keys::JDBC_DRIVER), Some(DEFAULT_DRIVER));
    let env = ExecutionEnvironment::builder(input.path()).build().unwrap();
    let plan = MappingProvider::new()
        .plan("orders-pu", &prepared.config, &env)
        .unwrap();
    assert_eq!(plan.dialect, Dialect::H2);
}

#[test]
fn test_explicit_table_name_and_dialect_override() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_persistence_xml(input.path(), "orders-pu", &["META-INF/orders.xml"], &[]);
    write_resource(input.path(), "META-INF/orders.xml", &order_mapping(Some("PURCHASE_ORDERS")));

    let req = request(&input, &output).with_override(keys::TARGET_DATABASE, "mysql");
    let report = DdlGenerator::new().run(&req).unwrap();

    let create = fs::read_to_string(report.scripts.create_script.unwrap()).unwrap();
    assert!(create.starts_with("CREATE TABLE PURCHASE_ORDERS (ID BIGINT AUTO_INCREMENT NOT NULL"));
    assert!(create.contains("PLACEDAT DATETIME"));
    let drop = fs::read_to_string(report.scripts.drop_script.unwrap()).unwrap();
    assert_eq!(drop, "DROP TABLE PURCHASE_ORDERS;\n");
}

#[test]
fn test_unit_properties_are_overridden_by_named_settings() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_persistence_xml(
        input.path(),
        "orders-pu",
        &[],
        &[(keys::JDBC_URL, "mysql://db/orders"), (keys::VALIDATION_MODE, "CALLBACK")],
    );
    write_resource(input.path(), "META-INF/orm.xml", &order_mapping(Some("ORDERS")));

    let report = DdlGenerator::new().run(&request(&input, &output)).unwrap();
    let create = fs::read_to_string(report.scripts.create_script.unwrap()).unwrap();
    assert!(create.starts_with("CREATE TABLE ORDERS"));
    assert!(create.contains("GENERATED BY DEFAULT AS IDENTITY"));
    assert!(!create.contains("AUTO_INCREMENT"));
}

#[test]
fn test_override_conflict_is_reported_and_applied() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_orders_fixture(input.path());

    let req = request(&input, &output)
        .with_override(keys::SCRIPTS_ACTION, "create")
        .with_override(keys::TRANSACTION_TYPE, keys::RESOURCE_LOCAL);
    let report = DdlGenerator::new().run(&req).unwrap();

    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].key, keys::SCRIPTS_ACTION);
    assert_eq!(report.conflicts[0].previous.as_deref(), Some("drop-and-create"));
    assert!(report.scripts.create_script.is_some());
    assert!(report.scripts.drop_script.is_none());
    assert!(!output.path().join("build/out/drop.sql").exists());
}

#[test]
fn test_relationship_and_sequence_generation() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_persistence_xml(input.path(), "shop-pu", &[], &[]);
    write_resource(
        input.path(),
        "META-INF/orm.xml",
        r#"<entity-mappings>
  <sequence-generator name="CUSTOMER_GEN" sequence-name="CUSTOMER_SEQ" allocation-size="10"/>
  <entity class="Customer" access="VIRTUAL">
    <table name="CUSTOMER"/>
    <attributes>
      <id name="id" attribute-type="Long">
        <generated-value strategy="SEQUENCE" generator="CUSTOMER_GEN"/>
      </id>
      <basic name="name"/>
    </attributes>
  </entity>
  <entity class="Invoice" access="VIRTUAL">
    <table name="INVOICE"/>
    <attributes>
      <id name="id" attribute-type="Long"/>
      <many-to-one name="customer" target-entity="Customer"/>
    </attributes>
  </entity>
</entity-mappings>"#,
    );

    let req = GenerationRequest {
        jdbc_url: Some("h2:mem:shop".to_string()),
        ..GenerationRequest::new("shop-pu", input.path(), output.path())
    };
    let report = DdlGenerator::new().run(&req).unwrap();

    let create = fs::read_to_string(report.scripts.create_script.unwrap()).unwrap();
    let lines: Vec<&str> = create.lines().collect();
    assert_eq!(lines[0], "CREATE TABLE CUSTOMER (ID BIGINT NOT NULL, NAME VARCHAR(255), PRIMARY KEY (ID));");
    assert_eq!(
        lines[1],
        "CREATE TABLE INVOICE (ID BIGINT NOT NULL, CUSTOMER_ID BIGINT, PRIMARY KEY (ID));"
    );
    assert!(lines[2].starts_with("ALTER TABLE INVOICE ADD CONSTRAINT FK_INVOICE_CUSTOMER_ID"));
    assert_eq!(lines[3], "CREATE SEQUENCE CUSTOMER_SEQ START WITH 1 INCREMENT BY 10;");

    let drop = fs::read_to_string(report.scripts.drop_script.unwrap()).unwrap();
    let lines: Vec<&str> = drop.lines().collect();
    assert_eq!(lines[0], "ALTER TABLE INVOICE DROP CONSTRAINT FK_INVOICE_CUSTOMER_ID;");
    assert_eq!(lines[1], "DROP TABLE INVOICE;");
    assert_eq!(lines[2], "DROP TABLE CUSTOMER;");
    assert_eq!(lines[3], "DROP SEQUENCE CUSTOMER_SEQ;");
}

#[test]
fn test_fallback_dir_supplies_mapping_file() {
    let input = TempDir::new().unwrap();
    let compiled = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_persistence_xml(input.path(), "orders-pu", &["META-INF/orders.xml"], &[]);
    write_resource(compiled.path(), "META-INF/orders.xml", &order_mapping(Some("ORDERS")));

    let req = GenerationRequest {
        fallback_dir: Some(compiled.path().to_path_buf()),
        ..request(&input, &output)
    };
    let report = DdlGenerator::new().run(&req).unwrap();
    let create = fs::read_to_string(report.scripts.create_script.unwrap()).unwrap();
    assert!(create.starts_with("CREATE TABLE ORDERS"));
}
