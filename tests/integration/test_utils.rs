//! Shared test utilities for integration tests
//!
//! Fixture writers for persistence descriptors and mapping files, plus isolated XDG
//! environment setup for tests that load configuration.

use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes environment variable access across all tests in this binary
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ISOLATED_VARS: &[&str] = &["HOME", "XDG_CONFIG_HOME", "DDLGEN_ENV"];

/// Run `f` with HOME and XDG_CONFIG_HOME pointing into `test_dir`, then restore them.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<_> = ISOLATED_VARS
        .iter()
        .map(|k| (*k, std::env::var_os(k)))
        .collect();

    let home = test_dir.path().join("home");
    let config_home = test_dir.path().join("config");
    fs::create_dir_all(&home).unwrap();
    fs::create_dir_all(&config_home).unwrap();
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", &config_home);
    std::env::remove_var("DDLGEN_ENV");

    let result = f();

    for (key, value) in saved {
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }
    result
}

/// Write a resource under a search root, creating parent directories.
pub fn write_resource(root: &Path, name: &str, contents: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// META-INF/persistence.xml declaring one unit with the given mapping files and properties.
pub fn write_persistence_xml(root: &Path, unit: &str, mapping_files: &[&str], properties: &[(&str, &str)]) {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<persistence version=\"2.1\">\n");
    xml.push_str(&format!(
        "  <persistence-unit name=\"{}\" transaction-type=\"RESOURCE_LOCAL\">\n",
        unit
    ));
    for file in mapping_files {
        xml.push_str(&format!("    <mapping-file>{}</mapping-file>\n", file));
    }
    if !properties.is_empty() {
        xml.push_str("    <properties>\n");
        for (k, v) in properties {
            xml.push_str(&format!("      <property name=\"{}\" value=\"{}\"/>\n", k, v));
        }
        xml.push_str("    </properties>\n");
    }
    xml.push_str("  </persistence-unit>\n</persistence>\n");
    write_resource(root, "META-INF/persistence.xml", &xml);
}

/// Mapping file with one virtual `Order` entity mapped to `table`.
pub fn order_mapping(table: Option<&str>) -> String {
    let table = table
        .map(|t| format!("    <table name=\"{}\"/>\n", t))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<entity-mappings version="2.1">
  <package>com.acme.orders</package>
  <entity class="Order" access="VIRTUAL">
{}    <attributes>
      <id name="id" attribute-type="Long">
        <generated-value strategy="IDENTITY"/>
      </id>
      <basic name="reference">
        <column length="40" nullable="false" unique="true"/>
      </basic>
      <basic name="total" attribute-type="java.math.BigDecimal">
        <column precision="12" scale="2"/>
      </basic>
      <basic name="placedAt" attribute-type="LocalDateTime"/>
      <version name="version" attribute-type="int"/>
    </attributes>
  </entity>
</entity-mappings>
"#,
        table
    )
}

/// The `orders-pu` fixture: one metadata-only entity in META-INF/orm.xml.
pub fn write_orders_fixture(root: &Path) {
    write_persistence_xml(root, "orders-pu", &[], &[]);
    write_resource(root, "META-INF/orm.xml", &order_mapping(None));
}
