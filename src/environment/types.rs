//! Type resolution: basic types, compiled type descriptors, synthesized placeholders.

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column-level kinds a basic type maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BasicType {
    String,
    Char,
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    Decimal,
    BigInteger,
    Date,
    Time,
    Timestamp,
    Uuid,
    Bytes,
}

/// Catalog of basic type names, loaded from the bundled catalog resource.
#[derive(Debug, Clone, Default)]
pub struct BasicTypeCatalog {
    types: BTreeMap<String, BasicType>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    types: BTreeMap<String, BasicType>,
}

impl BasicTypeCatalog {
    pub fn parse(source: &str) -> Result<Self, String> {
        let file: CatalogFile = toml::from_str(source).map_err(|e| e.to_string())?;
        Ok(Self { types: file.types })
    }

    /// Exact lookup.
    pub fn get(&self, name: &str) -> Option<BasicType> {
        self.types.get(name).copied()
    }

    /// Lookup by the segment after the last `.`.
    pub fn get_by_simple_name(&self, name: &str) -> Option<BasicType> {
        let simple = name.rsplit('.').next()?;
        if simple == name {
            return None;
        }
        self.get(simple)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Compiled representation of an entity or embeddable type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub entity: bool,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub id: bool,
    #[serde(default)]
    pub version: bool,
    #[serde(default)]
    pub transient: bool,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub nullable: Option<bool>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub scale: Option<u32>,
    /// identity, sequence, table or auto
    #[serde(default)]
    pub generated: Option<String>,
    /// many-to-one or one-to-one
    #[serde(default)]
    pub relation: Option<String>,
}

impl TypeDescriptor {
    pub fn parse(qualified_name: &str, source: &str) -> Result<Self, String> {
        let mut descriptor: TypeDescriptor = toml::from_str(source).map_err(|e| e.to_string())?;
        if descriptor.name.is_empty() {
            descriptor.name = qualified_name.to_string();
        }
        Ok(descriptor)
    }
}

/// Resource name of the compiled descriptor for a qualified type name.
pub fn descriptor_resource_name(qualified_name: &str) -> String {
    format!("{}.type.toml", qualified_name.replace('.', "/"))
}

/// Qualified type name for a descriptor resource name.
pub fn type_name_from_resource(resource: &str) -> Option<String> {
    resource
        .strip_suffix(".type.toml")
        .map(|stem| stem.replace('/', "."))
}

/// Placeholder for a type declared only in metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntheticType {
    pub name: String,
}

/// Outcome of resolving a type name against an execution environment.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedType {
    Basic(BasicType),
    Compiled(TypeDescriptor),
    Synthesized(SyntheticType),
}

impl ResolvedType {
    pub fn is_synthesized(&self) -> bool {
        matches!(self, ResolvedType::Synthesized(_))
    }

    pub fn basic(&self) -> Option<BasicType> {
        match self {
            ResolvedType::Basic(b) => Some(*b),
            _ => None,
        }
    }
}

pub(crate) fn malformed(resource: impl Into<String>, message: impl Into<String>) -> ProviderError {
    ProviderError::MalformedMetadata {
        resource: resource.into(),
        message: message.into(),
    }
}
