//! Create and drop script rendering.

use super::dialect::Dialect;
use super::model::{ColumnModel, GeneratorKind, SchemaModel, TableModel};
use crate::environment::BasicType;
use crate::error::ProviderError;
use std::fs;
use std::path::Path;

/// Table backing `TABLE`/`AUTO` generators and sequences on dialects without them.
pub const SEQUENCE_TABLE: &str = "SEQUENCE";
pub const SEQUENCE_NAME_COLUMN: &str = "SEQ_NAME";
pub const SEQUENCE_COUNT_COLUMN: &str = "SEQ_COUNT";

/// Rendered statements, without terminators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scripts {
    pub create: Vec<String>,
    pub drop: Vec<String>,
}

pub fn render(model: &SchemaModel, dialect: Dialect) -> Scripts {
    let mut scripts = Scripts::default();

    for table in &model.tables {
        scripts.create.push(create_table(table, dialect));
    }
    if !dialect.inline_foreign_keys() {
        for table in &model.tables {
            for fk in &table.foreign_keys {
                scripts.create.push(format!(
                    "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                    table_name(table, dialect),
                    dialect.quote(&fk.name),
                    dialect.quote(&fk.column),
                    qualified_name(fk.referenced_schema.as_deref(), &fk.referenced_table, dialect),
                    dialect.quote(&fk.referenced_column)
                ));
            }
        }
        for table in &model.tables {
            for fk in &table.foreign_keys {
                if let Some(stmt) = dialect.drop_foreign_key(&table_name(table, dialect), &fk.name) {
                    scripts.drop.push(stmt);
                }
            }
        }
    }

    for table in model.tables.iter().rev() {
        scripts
            .drop
            .push(format!("DROP TABLE {}", table_name(table, dialect)));
    }

    let (sequences, table_rows): (Vec<_>, Vec<_>) = model
        .generators
        .iter()
        .partition(|g| g.kind == GeneratorKind::Sequence && dialect.supports_sequences());

    for seq in &sequences {
        scripts.create.push(format!(
            "CREATE SEQUENCE {} START WITH {} INCREMENT BY {}",
            dialect.quote(&seq.name),
            seq.initial_value,
            seq.allocation_size
        ));
        scripts
            .drop
            .push(format!("DROP SEQUENCE {}", dialect.quote(&seq.name)));
    }

    if !table_rows.is_empty() {
        let seq_table = dialect.quote(SEQUENCE_TABLE);
        scripts.create.push(format!(
            "CREATE TABLE {} ({} {} NOT NULL, {} {}, PRIMARY KEY ({}))",
            seq_table,
            SEQUENCE_NAME_COLUMN,
            dialect.column_type(
                BasicType::String,
                super::dialect::Facets {
                    length: Some(50),
                    ..Default::default()
                }
            ),
            SEQUENCE_COUNT_COLUMN,
            dialect.column_type(BasicType::BigInteger, Default::default()),
            SEQUENCE_NAME_COLUMN
        ));
        for row in &table_rows {
            scripts.create.push(format!(
                "INSERT INTO {} ({}, {}) VALUES ('{}', 0)",
                seq_table,
                SEQUENCE_NAME_COLUMN,
                SEQUENCE_COUNT_COLUMN,
                row.name.replace('\'', "''")
            ));
        }
        scripts.drop.push(format!("DROP TABLE {}", seq_table));
    }

    scripts
}

/// SQLite has no schemas; the prefix is dropped there for tables and references alike.
fn qualified_name(schema: Option<&str>, table: &str, dialect: Dialect) -> String {
    match schema {
        Some(schema) if dialect != Dialect::Sqlite => {
            format!("{}.{}", dialect.quote(schema), dialect.quote(table))
        }
        _ => dialect.quote(table),
    }
}

fn table_name(table: &TableModel, dialect: Dialect) -> String {
    qualified_name(table.schema.as_deref(), &table.name, dialect)
}

fn column_definition(column: &ColumnModel, dialect: Dialect) -> String {
    let mut def = format!(
        "{} {}",
        dialect.quote(&column.name),
        dialect.column_type(column.ty, column.facets)
    );
    if column.identity {
        def.push(' ');
        def.push_str(dialect.identity_clause());
        if dialect.identity_declares_primary_key() {
            return def;
        }
    }
    if !column.nullable {
        def.push_str(" NOT NULL");
    }
    if column.unique && !column.primary_key {
        def.push_str(" UNIQUE");
    }
    def
}

fn create_table(table: &TableModel, dialect: Dialect) -> String {
    let mut parts: Vec<String> = table
        .columns
        .iter()
        .map(|c| column_definition(c, dialect))
        .collect();

    let declared_inline = dialect.identity_declares_primary_key()
        && table.primary_key().any(|c| c.identity);
    let pk: Vec<String> = table.primary_key().map(|c| dialect.quote(&c.name)).collect();
    if !pk.is_empty() && !declared_inline {
        parts.push(format!("PRIMARY KEY ({})", pk.join(", ")));
    }

    if dialect.inline_foreign_keys() {
        for fk in &table.foreign_keys {
            parts.push(format!(
                "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                dialect.quote(&fk.name),
                dialect.quote(&fk.column),
                qualified_name(fk.referenced_schema.as_deref(), &fk.referenced_table, dialect),
                dialect.quote(&fk.referenced_column)
            ));
        }
    }

    format!("CREATE TABLE {} ({})", table_name(table, dialect), parts.join(", "))
}

/// Write statements one per line, each followed by `;` when `terminate` is set.
pub fn write_script(path: &Path, statements: &[String], terminate: bool) -> Result<(), ProviderError> {
    let io_err = |source| ProviderError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut contents = String::new();
    for stmt in statements {
        contents.push_str(stmt);
        if terminate {
            contents.push(';');
        }
        contents.push('\n');
    }
    fs::write(path, contents).map_err(io_err)
}
