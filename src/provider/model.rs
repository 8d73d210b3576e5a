//! Dialect-independent relational model built from mapping metadata and resolved types.

use super::descriptor::UnitDescriptor;
use super::dialect::Facets;
use super::mapping::{
    AttributeKind, AttributeMapping, ColumnDef, EntityMapping, EntityMappings, GenerationStrategy,
    JoinColumnDef, SequenceGeneratorDef,
};
use crate::environment::types::{malformed, type_name_from_resource};
use crate::environment::{AttributeDescriptor, BasicType, ExecutionEnvironment, ResolvedType};
use crate::error::ProviderError;
use tracing::{debug, warn};

/// Generator name used when `SEQUENCE` ids name no generator.
pub const DEFAULT_SEQUENCE_GENERATOR: &str = "SEQ_GEN_SEQUENCE";
/// Generator name used when `TABLE`/`AUTO` ids name no generator.
pub const DEFAULT_TABLE_GENERATOR: &str = "SEQ_GEN";

const DEFAULT_ALLOCATION_SIZE: u32 = 50;
const DEFAULT_INITIAL_VALUE: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnModel {
    pub name: String,
    pub ty: BasicType,
    pub facets: Facets,
    pub nullable: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub identity: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyModel {
    pub name: String,
    pub column: String,
    pub referenced_schema: Option<String>,
    pub referenced_table: String,
    pub referenced_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableModel {
    pub name: String,
    pub schema: Option<String>,
    pub entity: String,
    pub columns: Vec<ColumnModel>,
    pub foreign_keys: Vec<ForeignKeyModel>,
}

impl TableModel {
    pub fn column(&self, name: &str) -> Option<&ColumnModel> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> impl Iterator<Item = &ColumnModel> {
        self.columns.iter().filter(|c| c.primary_key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    Sequence,
    Table,
}

/// Id generator backing a generated primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorModel {
    pub kind: GeneratorKind,
    /// Sequence name, or the `SEQ_NAME` row for table generators.
    pub name: String,
    pub initial_value: u32,
    pub allocation_size: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaModel {
    pub tables: Vec<TableModel>,
    pub generators: Vec<GeneratorModel>,
}

impl SchemaModel {
    pub fn table(&self, name: &str) -> Option<&TableModel> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone)]
struct AttributeDef {
    name: String,
    kind: AttributeKind,
    type_name: Option<String>,
    target: Option<String>,
    column: ColumnDef,
    join_column: JoinColumnDef,
    generated: Option<(GenerationStrategy, Option<String>)>,
    generator: Option<SequenceGeneratorDef>,
}

impl AttributeDef {
    fn from_descriptor(attr: &AttributeDescriptor, source: &str) -> Result<Option<Self>, ProviderError> {
        if attr.transient {
            return Ok(None);
        }
        let kind = match attr.relation.as_deref() {
            Some("many-to-one") => AttributeKind::ManyToOne,
            Some("one-to-one") => AttributeKind::OneToOne,
            Some(other) => {
                return Err(ProviderError::UnsupportedMapping(format!(
                    "relation '{}' on attribute '{}' ({})",
                    other, attr.name, source
                )))
            }
            None if attr.id => AttributeKind::Id,
            None if attr.version => AttributeKind::Version,
            None => AttributeKind::Basic,
        };
        let generated = attr
            .generated
            .as_deref()
            .map(|g| g.parse::<GenerationStrategy>().map_err(|e| malformed(source, e)))
            .transpose()?
            .map(|strategy| (strategy, None));

        let (column, join_column) = if kind.is_relationship() {
            (
                ColumnDef::default(),
                JoinColumnDef {
                    name: attr.column.clone(),
                    referenced_column_name: None,
                    nullable: attr.nullable,
                },
            )
        } else {
            (
                ColumnDef {
                    name: attr.column.clone(),
                    nullable: attr.nullable,
                    unique: attr.unique,
                    length: attr.length,
                    precision: attr.precision,
                    scale: attr.scale,
                },
                JoinColumnDef::default(),
            )
        };

        Ok(Some(AttributeDef {
            name: attr.name.clone(),
            kind,
            target: kind.is_relationship().then(|| attr.type_name.clone()),
            type_name: Some(attr.type_name.clone()),
            column,
            join_column,
            generated,
            generator: None,
        }))
    }

    /// Apply a mapping-file attribute on top of this one.
    fn overlay(&mut self, mapping: &AttributeMapping) {
        self.kind = mapping.kind;
        if let Some(ty) = &mapping.attribute_type {
            self.type_name = Some(ty.clone());
        }
        if let Some(target) = &mapping.target_entity {
            self.target = Some(target.clone());
        } else if mapping.kind.is_relationship() && self.target.is_none() {
            self.target = self.type_name.clone();
        }
        if let Some(column) = &mapping.column {
            self.column = ColumnDef {
                name: column.name.clone().or_else(|| self.column.name.clone()),
                nullable: column.nullable.or(self.column.nullable),
                unique: column.unique || self.column.unique,
                length: column.length.or(self.column.length),
                precision: column.precision.or(self.column.precision),
                scale: column.scale.or(self.column.scale),
            };
        }
        if let Some(join) = &mapping.join_column {
            self.join_column = join.clone();
        }
        if let Some(generated) = &mapping.generated_value {
            self.generated = Some((generated.strategy, generated.generator.clone()));
        }
        if mapping.sequence_generator.is_some() {
            self.generator = mapping.sequence_generator.clone();
        }
    }

    fn from_mapping(mapping: &AttributeMapping) -> Self {
        let mut attr = AttributeDef {
            name: mapping.name.clone(),
            kind: mapping.kind,
            type_name: None,
            target: None,
            column: ColumnDef::default(),
            join_column: JoinColumnDef::default(),
            generated: None,
            generator: None,
        };
        attr.overlay(mapping);
        attr
    }
}

#[derive(Debug, Clone)]
struct EntityDef {
    class: String,
    name: String,
    table: String,
    schema: Option<String>,
    synthesized: bool,
    attributes: Vec<AttributeDef>,
    source: String,
}

impl EntityDef {
    fn id(&self) -> Result<&AttributeDef, ProviderError> {
        let mut ids = self.attributes.iter().filter(|a| a.kind == AttributeKind::Id);
        let id = ids.next().ok_or_else(|| {
            malformed(&self.source, format!("entity {} has no id attribute", self.class))
        })?;
        if ids.next().is_some() {
            return Err(ProviderError::UnsupportedMapping(format!(
                "composite primary key on entity {}",
                self.class
            )));
        }
        Ok(id)
    }

    fn matches(&self, reference: &str) -> bool {
        self.class == reference || self.name == reference || simple_name(&self.class) == reference
    }
}

fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

struct EntitySource<'a> {
    class: String,
    mapping: Option<&'a EntityMapping>,
    file_schema: Option<&'a str>,
    source: String,
}

/// Build the relational model for one unit.
pub fn build(
    unit: &UnitDescriptor,
    mappings: &[EntityMappings],
    env: &ExecutionEnvironment,
) -> Result<SchemaModel, ProviderError> {
    let sources = collect_sources(unit, mappings, env)?;
    let mut entities = Vec::with_capacity(sources.len());
    for source in &sources {
        entities.push(define_entity(source, env)?);
    }

    for (i, entity) in entities.iter().enumerate() {
        if let Some(other) = entities[..i].iter().find(|e| e.table == entity.table && e.schema == entity.schema) {
            return Err(ProviderError::UnsupportedMapping(format!(
                "entities {} and {} both map to table {}",
                other.class, entity.class, entity.table
            )));
        }
    }

    let shared_generators: Vec<&SequenceGeneratorDef> = mappings
        .iter()
        .flat_map(|m| m.sequence_generators.iter())
        .collect();

    let mut model = SchemaModel::default();
    for entity in &entities {
        let table = build_table(entity, &entities, env, &shared_generators, &mut model.generators)?;
        model.tables.push(table);
    }

    debug!(
        unit = %unit.name,
        tables = model.tables.len(),
        generators = model.generators.len(),
        "Built relational model"
    );
    Ok(model)
}

fn collect_sources<'a>(
    unit: &UnitDescriptor,
    mappings: &'a [EntityMappings],
    env: &ExecutionEnvironment,
) -> Result<Vec<EntitySource<'a>>, ProviderError> {
    let mut sources: Vec<EntitySource<'a>> = Vec::new();
    for file in mappings {
        for entity in &file.entities {
            if sources.iter().any(|s| s.class == entity.class) {
                return Err(malformed(
                    &file.source,
                    format!("entity {} is mapped more than once", entity.class),
                ));
            }
            sources.push(EntitySource {
                class: entity.class.clone(),
                mapping: Some(entity),
                file_schema: file.schema.as_deref(),
                source: file.source.clone(),
            });
        }
    }

    for class in &unit.classes {
        if !sources.iter().any(|s| &s.class == class) {
            sources.push(EntitySource {
                class: class.clone(),
                mapping: None,
                file_schema: None,
                source: unit.source.clone(),
            });
        }
    }

    if !unit.exclude_unlisted_classes {
        for resource in env.list_resources(".type.toml")? {
            let Some(class) = type_name_from_resource(&resource) else {
                continue;
            };
            if sources.iter().any(|s| s.class == class) {
                continue;
            }
            if let ResolvedType::Compiled(descriptor) = env.resolve(&class)? {
                if descriptor.entity {
                    debug!(class = %class, "Discovered unlisted entity");
                    sources.push(EntitySource {
                        class,
                        mapping: None,
                        file_schema: None,
                        source: resource,
                    });
                }
            }
        }
    }
    Ok(sources)
}

fn define_entity(source: &EntitySource<'_>, env: &ExecutionEnvironment) -> Result<EntityDef, ProviderError> {
    let resolved = env.resolve(&source.class)?;
    let (mut attributes, descriptor_table, descriptor_schema, synthesized) = match &resolved {
        ResolvedType::Compiled(descriptor) => {
            let mut attrs = Vec::new();
            for attr in &descriptor.attributes {
                if let Some(def) = AttributeDef::from_descriptor(attr, &source.source)? {
                    attrs.push(def);
                }
            }
            (attrs, descriptor.table.clone(), descriptor.schema.clone(), false)
        }
        ResolvedType::Synthesized(_) => {
            if source.mapping.is_none() {
                return Err(ProviderError::TypeNotFound(source.class.clone()));
            }
            (Vec::new(), None, None, true)
        }
        ResolvedType::Basic(_) => {
            return Err(ProviderError::UnsupportedMapping(format!(
                "{} is a basic type, not an entity",
                source.class
            )))
        }
    };

    let mut table = descriptor_table;
    let mut schema = descriptor_schema.or_else(|| source.file_schema.map(str::to_string));
    let mut name = simple_name(&source.class).to_string();

    if let Some(mapping) = source.mapping {
        if synthesized && !mapping.is_virtual() {
            warn!(class = %source.class, "No compiled type found; treating entity as virtual");
        }
        if let Some(entity_name) = &mapping.name {
            name = entity_name.clone();
        }
        if let Some(t) = &mapping.table {
            if t.name.is_some() {
                table = t.name.clone();
            }
            if t.schema.is_some() {
                schema = t.schema.clone();
            }
        }
        for attr in &mapping.attributes {
            let existing = attributes.iter().position(|a| a.name == attr.name);
            match (attr.kind, existing) {
                (AttributeKind::Transient, Some(i)) => {
                    attributes.remove(i);
                }
                (AttributeKind::Transient, None) => {}
                (_, Some(i)) => attributes[i].overlay(attr),
                (_, None) => attributes.push(AttributeDef::from_mapping(attr)),
            }
        }
    }

    Ok(EntityDef {
        class: source.class.clone(),
        table: table.unwrap_or_else(|| name.to_uppercase()),
        name,
        schema,
        synthesized,
        attributes,
        source: source.source.clone(),
    })
}

fn resolve_basic(
    entity: &EntityDef,
    attr: &AttributeDef,
    env: &ExecutionEnvironment,
) -> Result<BasicType, ProviderError> {
    let type_name = match &attr.type_name {
        Some(t) => t.as_str(),
        None if entity.synthesized => {
            debug!(entity = %entity.class, attribute = %attr.name, "Untyped virtual attribute mapped as string");
            return Ok(BasicType::String);
        }
        None => {
            return Err(malformed(
                &entity.source,
                format!("attribute {}.{} has no type", entity.class, attr.name),
            ))
        }
    };
    match env.resolve(type_name)? {
        ResolvedType::Basic(basic) => Ok(basic),
        _ => Err(ProviderError::UnsupportedMapping(format!(
            "attribute {}.{} has non-basic type {}",
            entity.class, attr.name, type_name
        ))),
    }
}

fn column_name(attr: &AttributeDef) -> String {
    attr.column
        .name
        .clone()
        .unwrap_or_else(|| attr.name.to_uppercase())
}

fn build_table(
    entity: &EntityDef,
    all: &[EntityDef],
    env: &ExecutionEnvironment,
    shared_generators: &[&SequenceGeneratorDef],
    generators: &mut Vec<GeneratorModel>,
) -> Result<TableModel, ProviderError> {
    entity.id()?;

    let mut table = TableModel {
        name: entity.table.clone(),
        schema: entity.schema.clone(),
        entity: entity.class.clone(),
        columns: Vec::new(),
        foreign_keys: Vec::new(),
    };

    for attr in &entity.attributes {
        let column = if attr.kind.is_relationship() {
            let (column, fk) = relationship_column(entity, attr, all, env)?;
            table.foreign_keys.push(fk);
            column
        } else {
            let ty = resolve_basic(entity, attr, env)?;
            let primary_key = attr.kind == AttributeKind::Id;
            let mut identity = false;
            if let Some((strategy, generator)) = &attr.generated {
                if !primary_key {
                    return Err(ProviderError::UnsupportedMapping(format!(
                        "generated value on non-id attribute {}.{}",
                        entity.class, attr.name
                    )));
                }
                match strategy {
                    GenerationStrategy::Identity => identity = true,
                    _ => register_generator(
                        *strategy,
                        generator.as_deref(),
                        attr.generator.as_ref(),
                        shared_generators,
                        generators,
                    ),
                }
            }
            ColumnModel {
                name: column_name(attr),
                ty,
                facets: Facets {
                    length: attr.column.length,
                    precision: attr.column.precision,
                    scale: attr.column.scale,
                },
                nullable: !primary_key && attr.column.nullable.unwrap_or(true),
                unique: attr.column.unique,
                primary_key,
                identity,
            }
        };

        if table.column(&column.name).is_some() {
            return Err(malformed(
                &entity.source,
                format!("column {} is mapped twice in table {}", column.name, table.name),
            ));
        }
        table.columns.push(column);
    }
    Ok(table)
}

fn relationship_column(
    entity: &EntityDef,
    attr: &AttributeDef,
    all: &[EntityDef],
    env: &ExecutionEnvironment,
) -> Result<(ColumnModel, ForeignKeyModel), ProviderError> {
    let reference = attr.target.as_deref().ok_or_else(|| {
        malformed(
            &entity.source,
            format!("relationship {}.{} has no target entity", entity.class, attr.name),
        )
    })?;
    let target = all.iter().find(|e| e.matches(reference)).ok_or_else(|| {
        ProviderError::UnsupportedMapping(format!(
            "relationship {}.{} targets {}, which is not an entity of this unit",
            entity.class, attr.name, reference
        ))
    })?;

    let target_id = target.id()?;
    let target_column = column_name(target_id);
    let referenced_column = attr
        .join_column
        .referenced_column_name
        .clone()
        .unwrap_or_else(|| target_column.clone());
    if referenced_column != target_column {
        return Err(ProviderError::UnsupportedMapping(format!(
            "relationship {}.{} references {}.{}, which is not its primary key",
            entity.class, attr.name, target.table, referenced_column
        )));
    }

    let name = attr
        .join_column
        .name
        .clone()
        .unwrap_or_else(|| format!("{}_{}", attr.name.to_uppercase(), target_column));
    let column = ColumnModel {
        name: name.clone(),
        ty: resolve_basic(target, target_id, env)?,
        facets: Facets {
            length: target_id.column.length,
            precision: target_id.column.precision,
            scale: target_id.column.scale,
        },
        nullable: attr.join_column.nullable.unwrap_or(true),
        unique: false,
        primary_key: false,
        identity: false,
    };
    let fk = ForeignKeyModel {
        name: format!("FK_{}_{}", entity.table, name),
        column: name,
        referenced_schema: target.schema.clone(),
        referenced_table: target.table.clone(),
        referenced_column,
    };
    Ok((column, fk))
}


fn register_generator(
    strategy: GenerationStrategy,
    generator: Option<&str>,
    local: Option<&SequenceGeneratorDef>,
    shared: &[&SequenceGeneratorDef],
    generators: &mut Vec<GeneratorModel>,
) {
    let kind = match strategy {
        GenerationStrategy::Sequence => GeneratorKind::Sequence,
        _ => GeneratorKind::Table,
    };
    let default_name = match kind {
        GeneratorKind::Sequence => DEFAULT_SEQUENCE_GENERATOR,
        GeneratorKind::Table => DEFAULT_TABLE_GENERATOR,
    };
    let generator_name = generator.unwrap_or(default_name);
    let def = local
        .filter(|g| g.name == generator_name)
        .or_else(|| shared.iter().copied().find(|g| g.name == generator_name));

    let model = GeneratorModel {
        kind,
        name: def
            .and_then(|g| g.sequence_name.clone())
            .unwrap_or_else(|| generator_name.to_string()),
        initial_value: def.and_then(|g| g.initial_value).unwrap_or(DEFAULT_INITIAL_VALUE),
        allocation_size: def
            .and_then(|g| g.allocation_size)
            .unwrap_or(DEFAULT_ALLOCATION_SIZE),
    };
    if !generators.iter().any(|g| g.kind == model.kind && g.name == model.name) {
        generators.push(model);
    }
}
