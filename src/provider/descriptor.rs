//! Persistence descriptor (`META-INF/persistence.xml`) parsing.

use super::xml::{self, XmlElement};
use crate::environment::{ExecutionEnvironment, Resource};
use crate::environment::types::malformed;
use crate::error::ProviderError;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const DESCRIPTOR_RESOURCE: &str = "META-INF/persistence.xml";

/// One `<persistence-unit>` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitDescriptor {
    pub name: String,
    pub transaction_type: Option<String>,
    pub mapping_files: Vec<String>,
    pub classes: Vec<String>,
    pub exclude_unlisted_classes: bool,
    pub properties: BTreeMap<String, String>,
    /// Resource the unit was declared in.
    pub source: String,
}

/// Parse every unit declared in one descriptor document.
pub fn parse_units(resource: &Resource) -> Result<Vec<UnitDescriptor>, ProviderError> {
    let root = xml::parse_document(&resource.contents)
        .map_err(|e| malformed(resource.describe(), e))?;
    if root.name != "persistence" {
        return Err(malformed(
            resource.describe(),
            format!("expected <persistence> root element, found <{}>", root.name),
        ));
    }

    root.children_named("persistence-unit")
        .map(|unit| parse_unit(unit, resource))
        .collect()
}

fn parse_unit(unit: &XmlElement, resource: &Resource) -> Result<UnitDescriptor, ProviderError> {
    let name = unit
        .attr("name")
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| malformed(resource.describe(), "persistence-unit without a name"))?;

    let exclude_unlisted_classes = match unit.child("exclude-unlisted-classes") {
        // An empty element means true
        Some(el) => match el.text() {
            None => true,
            Some(text) => xml::parse_bool(text).ok_or_else(|| {
                malformed(
                    resource.describe(),
                    format!("invalid exclude-unlisted-classes value '{}'", text),
                )
            })?,
        },
        None => true,
    };

    let mut properties = BTreeMap::new();
    if let Some(props) = unit.child("properties") {
        for prop in props.children_named("property") {
            let key = prop.attr("name").ok_or_else(|| {
                malformed(resource.describe(), "property without a name attribute")
            })?;
            let value = prop.attr("value").unwrap_or_default();
            properties.insert(key.to_string(), value.to_string());
        }
    }

    Ok(UnitDescriptor {
        name: name.to_string(),
        transaction_type: unit.attr("transaction-type").map(str::to_string),
        mapping_files: unit
            .children_named("mapping-file")
            .filter_map(|m| m.text().map(str::to_string))
            .collect(),
        classes: unit
            .children_named("class")
            .filter_map(|c| c.text().map(str::to_string))
            .collect(),
        exclude_unlisted_classes,
        properties,
        source: resource.describe(),
    })
}

/// All units visible from the environment, in search order. A unit name declared
/// more than once keeps its first declaration.
pub fn discover_units(env: &ExecutionEnvironment) -> Result<Vec<UnitDescriptor>, ProviderError> {
    let resources = env.locate_all(DESCRIPTOR_RESOURCE)?;
    if resources.is_empty() {
        return Err(ProviderError::DescriptorNotFound(
            DESCRIPTOR_RESOURCE.to_string(),
        ));
    }

    let mut units: Vec<UnitDescriptor> = Vec::new();
    for resource in &resources {
        for unit in parse_units(resource)? {
            if let Some(existing) = units.iter().find(|u| u.name == unit.name) {
                warn!(
                    unit = %unit.name,
                    kept = %existing.source,
                    ignored = %unit.source,
                    "Duplicate persistence unit declaration ignored"
                );
                continue;
            }
            units.push(unit);
        }
    }
    debug!(count = units.len(), "Discovered persistence units");
    Ok(units)
}

/// Find one unit by name.
pub fn find_unit(env: &ExecutionEnvironment, name: &str) -> Result<UnitDescriptor, ProviderError> {
    discover_units(env)?
        .into_iter()
        .find(|u| u.name == name)
        .ok_or_else(|| ProviderError::UnitNotFound(name.to_string()))
}
