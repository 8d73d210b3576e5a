//! Mapping file (`<entity-mappings>`) parsing.

use super::xml::{self, XmlElement};
use crate::environment::types::malformed;
use crate::environment::Resource;
use crate::error::ProviderError;
use std::str::FromStr;

pub const DEFAULT_MAPPING_RESOURCE: &str = "META-INF/orm.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStrategy {
    Auto,
    Identity,
    Sequence,
    Table,
}

impl FromStr for GenerationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(GenerationStrategy::Auto),
            "identity" => Ok(GenerationStrategy::Identity),
            "sequence" => Ok(GenerationStrategy::Sequence),
            "table" => Ok(GenerationStrategy::Table),
            other => Err(format!("unknown generation strategy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceGeneratorDef {
    pub name: String,
    pub sequence_name: Option<String>,
    pub allocation_size: Option<u32>,
    pub initial_value: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedValueDef {
    pub strategy: GenerationStrategy,
    pub generator: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: Option<String>,
    pub nullable: Option<bool>,
    pub unique: bool,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinColumnDef {
    pub name: Option<String>,
    pub referenced_column_name: Option<String>,
    pub nullable: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Id,
    Basic,
    Version,
    Transient,
    ManyToOne,
    OneToOne,
}

impl AttributeKind {
    pub fn is_relationship(self) -> bool {
        matches!(self, AttributeKind::ManyToOne | AttributeKind::OneToOne)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMapping {
    pub kind: AttributeKind,
    pub name: String,
    pub attribute_type: Option<String>,
    pub target_entity: Option<String>,
    pub column: Option<ColumnDef>,
    pub join_column: Option<JoinColumnDef>,
    pub generated_value: Option<GeneratedValueDef>,
    pub sequence_generator: Option<SequenceGeneratorDef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDef {
    pub name: Option<String>,
    pub schema: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMapping {
    pub name: Option<String>,
    /// Qualified class name
    pub class: String,
    pub access: Option<String>,
    pub table: Option<TableDef>,
    pub attributes: Vec<AttributeMapping>,
}

impl EntityMapping {
    pub fn is_virtual(&self) -> bool {
        self.access
            .as_deref()
            .map(|a| a.eq_ignore_ascii_case("virtual"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMappings {
    pub package: Option<String>,
    pub schema: Option<String>,
    pub sequence_generators: Vec<SequenceGeneratorDef>,
    pub entities: Vec<EntityMapping>,
    pub source: String,
}

/// Prefix an unqualified class name with the mapping file's package.
pub fn qualify(package: Option<&str>, class: &str) -> String {
    match package {
        Some(pkg) if !class.contains('.') && !pkg.is_empty() => format!("{}.{}", pkg, class),
        _ => class.to_string(),
    }
}

pub fn parse_mappings(resource: &Resource) -> Result<EntityMappings, ProviderError> {
    let source = resource.describe();
    let root = xml::parse_document(&resource.contents).map_err(|e| malformed(&source, e))?;
    if root.name != "entity-mappings" {
        return Err(malformed(
            &source,
            format!("expected <entity-mappings> root element, found <{}>", root.name),
        ));
    }

    let package = root.child_text("package").map(str::to_string);
    let schema = root.child_text("schema").map(str::to_string);

    let sequence_generators = root
        .children_named("sequence-generator")
        .map(|g| parse_sequence_generator(g, &source))
        .collect::<Result<Vec<_>, _>>()?;

    let mut entities = Vec::new();
    for entity in root.children_named("entity") {
        entities.push(parse_entity(entity, package.as_deref(), &source)?);
    }

    Ok(EntityMappings {
        package,
        schema,
        sequence_generators,
        entities,
        source,
    })
}

fn parse_entity(
    entity: &XmlElement,
    package: Option<&str>,
    source: &str,
) -> Result<EntityMapping, ProviderError> {
    let class = entity
        .attr("class")
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| malformed(source, "entity without a class attribute"))?;

    let table = entity.child("table").map(|t| TableDef {
        name: t.attr("name").map(str::to_string),
        schema: t.attr("schema").map(str::to_string),
    });

    let mut attributes = Vec::new();
    if let Some(attrs) = entity.child("attributes") {
        for attr in &attrs.children {
            if let Some(mapping) = parse_attribute(attr, class, source)? {
                attributes.push(mapping);
            }
        }
    }

    Ok(EntityMapping {
        name: entity.attr("name").map(str::to_string),
        class: qualify(package, class),
        access: entity.attr("access").map(str::to_string),
        table,
        attributes,
    })
}

fn parse_attribute(
    attr: &XmlElement,
    class: &str,
    source: &str,
) -> Result<Option<AttributeMapping>, ProviderError> {
    let kind = match attr.name.as_str() {
        "id" => AttributeKind::Id,
        "basic" => AttributeKind::Basic,
        "version" => AttributeKind::Version,
        "transient" => AttributeKind::Transient,
        "many-to-one" => AttributeKind::ManyToOne,
        "one-to-one" if attr.attr("mapped-by").is_none() => AttributeKind::OneToOne,
        // Inverse sides own no columns
        "one-to-one" | "one-to-many" if attr.attr("mapped-by").is_some() => return Ok(None),
        other => {
            return Err(ProviderError::UnsupportedMapping(format!(
                "<{}> on attribute '{}' of {} ({})",
                other,
                attr.attr("name").unwrap_or("?"),
                class,
                source
            )))
        }
    };

    let name = attr
        .attr("name")
        .ok_or_else(|| malformed(source, format!("<{}> without a name in {}", attr.name, class)))?;

    let column = attr
        .child("column")
        .map(|c| parse_column(c, source))
        .transpose()?;

    let join_column = attr.child("join-column").map(|j| JoinColumnDef {
        name: j.attr("name").map(str::to_string),
        referenced_column_name: j.attr("referenced-column-name").map(str::to_string),
        nullable: j.attr("nullable").and_then(xml::parse_bool),
    });

    let generated_value = attr
        .child("generated-value")
        .map(|g| -> Result<GeneratedValueDef, ProviderError> {
            let strategy = match g.attr("strategy") {
                Some(s) => s.parse().map_err(|e: String| malformed(source, e))?,
                None => GenerationStrategy::Auto,
            };
            Ok(GeneratedValueDef {
                strategy,
                generator: g.attr("generator").map(str::to_string),
            })
        })
        .transpose()?;

    let sequence_generator = attr
        .child("sequence-generator")
        .map(|g| parse_sequence_generator(g, source))
        .transpose()?;

    Ok(Some(AttributeMapping {
        kind,
        name: name.to_string(),
        attribute_type: attr.attr("attribute-type").map(str::to_string),
        target_entity: attr.attr("target-entity").map(str::to_string),
        column,
        join_column,
        generated_value,
        sequence_generator,
    }))
}

fn parse_u32(el: &XmlElement, name: &str, source: &str) -> Result<Option<u32>, ProviderError> {
    el.attr(name)
        .map(|v| {
            v.trim().parse::<u32>().map_err(|_| {
                malformed(source, format!("attribute {}=\"{}\" is not a number", name, v))
            })
        })
        .transpose()
}

fn parse_column(el: &XmlElement, source: &str) -> Result<ColumnDef, ProviderError> {
    Ok(ColumnDef {
        name: el.attr("name").map(str::to_string),
        nullable: el.attr("nullable").and_then(xml::parse_bool),
        unique: el.attr("unique").and_then(xml::parse_bool).unwrap_or(false),
        length: parse_u32(el, "length", source)?,
        precision: parse_u32(el, "precision", source)?,
        scale: parse_u32(el, "scale", source)?,
    })
}

fn parse_sequence_generator(
    el: &XmlElement,
    source: &str,
) -> Result<SequenceGeneratorDef, ProviderError> {
    let name = el
        .attr("name")
        .ok_or_else(|| malformed(source, "sequence-generator without a name"))?;
    Ok(SequenceGeneratorDef {
        name: name.to_string(),
        sequence_name: el.attr("sequence-name").map(str::to_string),
        allocation_size: parse_u32(el, "allocation-size", source)?,
        initial_value: parse_u32(el, "initial-value", source)?,
    })
}
