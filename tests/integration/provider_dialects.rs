//! Dialect selection and compiled type descriptors through the full pipeline.

use super::test_utils::{order_mapping, write_persistence_xml, write_resource};
use ddlgen::generation::keys;
use ddlgen::{DdlGenerator, GenerationRequest};
use std::fs;
use tempfile::TempDir;

const CUSTOMER_TYPE: &str = r#"
entity = true
table = "CUSTOMERS"

[[attributes]]
name = "id"
type = "Long"
id = true
generated = "table"

[[attributes]]
name = "email"
type = "String"
length = 120
nullable = false
unique = true

[[attributes]]
name = "avatar"
type = "byte[]"

[[attributes]]
name = "cache"
type = "String"
transient = true
"#;

#[test]
fn test_compiled_descriptors_from_fallback_on_sqlite() {
    let input = TempDir::new().unwrap();
    let compiled = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_persistence_xml(input.path(), "crm-pu", &[], &[(keys::TARGET_DATABASE, "sqlite")]);
    write_resource(compiled.path(), "com/acme/crm/Customer.type.toml", CUSTOMER_TYPE);

    let req = GenerationRequest {
        fallback_dir: Some(compiled.path().to_path_buf()),
        ..GenerationRequest::new("crm-pu", input.path(), output.path())
    };
    let report = DdlGenerator::new().run(&req).unwrap();

    let create = fs::read_to_string(report.scripts.create_script.unwrap()).unwrap();
    assert_eq!(
        create,
        "CREATE TABLE CUSTOMERS (ID INTEGER NOT NULL, EMAIL TEXT NOT NULL UNIQUE, AVATAR BLOB, PRIMARY KEY (ID));\n\
         CREATE TABLE \"SEQUENCE\" (SEQ_NAME TEXT NOT NULL, SEQ_COUNT NUMERIC, PRIMARY KEY (SEQ_NAME));\n\
         INSERT INTO \"SEQUENCE\" (SEQ_NAME, SEQ_COUNT) VALUES ('SEQ_GEN', 0);\n"
    );
    let drop = fs::read_to_string(report.scripts.drop_script.unwrap()).unwrap();
    assert_eq!(drop, "DROP TABLE CUSTOMERS;\nDROP TABLE \"SEQUENCE\";\n");
}

#[test]
fn test_postgresql_url_without_terminators() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_persistence_xml(
        input.path(),
        "orders-pu",
        &[],
        &[
            (keys::JDBC_URL, "jdbc:postgresql://localhost/orders"),
            (keys::TERMINATE_STATEMENTS, "false"),
        ],
    );
    write_resource(input.path(), "META-INF/orm.xml", &order_mapping(Some("ORDERS")));

    let report = DdlGenerator::new()
        .run(&GenerationRequest::new("orders-pu", input.path(), output.path()))
        .unwrap();

    let create = fs::read_to_string(report.scripts.create_script.unwrap()).unwrap();
    assert!(create.starts_with("CREATE TABLE ORDERS (ID BIGINT GENERATED BY DEFAULT AS IDENTITY NOT NULL"));
    assert!(create.contains("PLACEDAT TIMESTAMP"));
    assert!(!create.contains(';'));
}

#[test]
fn test_sqlite_drops_schema_from_tables_and_references() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_persistence_xml(input.path(), "shop-pu", &[], &[(keys::TARGET_DATABASE, "sqlite")]);
    write_resource(
        input.path(),
        "META-INF/orm.xml",
        r#"<entity-mappings>
  <schema>APP</schema>
  <entity class="Customer" access="VIRTUAL">
    <attributes>
      <id name="id" attribute-type="Long"/>
    </attributes>
  </entity>
  <entity class="Invoice" access="VIRTUAL">
    <attributes>
      <id name="id" attribute-type="Long"/>
      <many-to-one name="customer" target-entity="Customer"/>
    </attributes>
  </entity>
</entity-mappings>"#,
    );

    let report = DdlGenerator::new()
        .run(&GenerationRequest::new("shop-pu", input.path(), output.path()))
        .unwrap();

    let create = fs::read_to_string(report.scripts.create_script.unwrap()).unwrap();
    assert_eq!(
        create,
        "CREATE TABLE CUSTOMER (ID INTEGER NOT NULL, PRIMARY KEY (ID));\n\
         CREATE TABLE INVOICE (ID INTEGER NOT NULL, CUSTOMER_ID INTEGER, PRIMARY KEY (ID), \
         CONSTRAINT FK_INVOICE_CUSTOMER_ID FOREIGN KEY (CUSTOMER_ID) REFERENCES CUSTOMER (ID));\n"
    );
}

#[test]
fn test_list_units_across_layers() {
    let input = TempDir::new().unwrap();
    let compiled = TempDir::new().unwrap();
    write_persistence_xml(input.path(), "orders-pu", &[], &[]);
    write_persistence_xml(compiled.path(), "billing-pu", &[], &[]);

    let units = DdlGenerator::new()
        .list_units(input.path(), Some(compiled.path().to_path_buf()))
        .unwrap();
    let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["orders-pu", "billing-pu"]);
}
