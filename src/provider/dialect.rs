//! SQL dialects: detection from unit properties, column type mapping, identifier quoting.

use crate::environment::BasicType;
use crate::error::ProviderError;
use crate::generation::keys;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    H2,
    PostgreSql,
    MySql,
    Sqlite,
    Generic,
}

/// Length, precision and scale facets of a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Facets {
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

const DEFAULT_STRING_LENGTH: u32 = 255;
const DEFAULT_DECIMAL_PRECISION: u32 = 19;
const DEFAULT_DECIMAL_SCALE: u32 = 2;
const DEFAULT_BIG_INTEGER_PRECISION: u32 = 38;

const RESERVED: &[&str] = &[
    "ALL", "AND", "AS", "BY", "CHECK", "COLUMN", "CONSTRAINT", "CREATE", "CROSS", "DEFAULT",
    "DELETE", "DISTINCT", "DROP", "FROM", "GROUP", "HAVING", "IN", "INDEX", "INSERT", "INTO", "IS",
    "JOIN", "KEY", "LIMIT", "NOT", "NULL", "OF", "ON", "OR", "ORDER", "PRIMARY", "REFERENCES",
    "SELECT", "SEQUENCE", "SET", "TABLE", "TO", "UNION", "UNIQUE", "UPDATE", "USER", "VALUE",
    "VALUES", "WHERE", "WITH",
];

impl Dialect {
    /// Parse a dialect name as used in `persistence.target-database` and URL schemes.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "h2" => Some(Dialect::H2),
            "postgresql" | "postgres" | "pgsql" => Some(Dialect::PostgreSql),
            "mysql" | "mariadb" => Some(Dialect::MySql),
            "sqlite" => Some(Dialect::Sqlite),
            "generic" | "sql" | "sql92" => Some(Dialect::Generic),
            _ => None,
        }
    }

    /// Explicit target database first, then the connection URL scheme, then the driver.
    pub fn detect(properties: &BTreeMap<String, String>) -> Result<Self, ProviderError> {
        if let Some(target) = properties.get(keys::TARGET_DATABASE) {
            return Self::from_name(target).ok_or_else(|| ProviderError::UnsupportedSetting {
                key: keys::TARGET_DATABASE.to_string(),
                value: target.clone(),
            });
        }

        if let Some(url) = properties.get(keys::JDBC_URL) {
            let url = url.trim();
            let url = url.strip_prefix("jdbc:").unwrap_or(url);
            if let Some(dialect) = url.split(':').next().and_then(Self::from_name) {
                return Ok(dialect);
            }
        }

        if let Some(driver) = properties.get(keys::JDBC_DRIVER) {
            let driver = driver.to_ascii_lowercase();
            let dialect = if driver.contains("h2") {
                Dialect::H2
            } else if driver.contains("postgres") {
                Dialect::PostgreSql
            } else if driver.contains("mysql") || driver.contains("mariadb") {
                Dialect::MySql
            } else if driver.contains("sqlite") {
                Dialect::Sqlite
            } else {
                Dialect::Generic
            };
            return Ok(dialect);
        }

        Ok(Dialect::Generic)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::H2 => "h2",
            Dialect::PostgreSql => "postgresql",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Generic => "generic",
        }
    }

    pub fn supports_sequences(&self) -> bool {
        matches!(self, Dialect::H2 | Dialect::PostgreSql | Dialect::Generic)
    }

    /// Foreign keys declared in `CREATE TABLE` rather than added afterwards.
    pub fn inline_foreign_keys(&self) -> bool {
        matches!(self, Dialect::Sqlite)
    }

    /// The identity clause itself declares the primary key (SQLite `AUTOINCREMENT`).
    pub fn identity_declares_primary_key(&self) -> bool {
        matches!(self, Dialect::Sqlite)
    }

    pub fn identity_clause(&self) -> &'static str {
        match self {
            Dialect::H2 | Dialect::PostgreSql | Dialect::Generic => "GENERATED BY DEFAULT AS IDENTITY",
            Dialect::MySql => "AUTO_INCREMENT",
            Dialect::Sqlite => "PRIMARY KEY AUTOINCREMENT",
        }
    }

    pub fn column_type(&self, ty: BasicType, facets: Facets) -> String {
        use BasicType as T;
        let d = *self;
        if d == Dialect::Sqlite {
            return match ty {
                T::Boolean | T::Byte | T::Short | T::Integer | T::Long => "INTEGER",
                T::Float | T::Double => "REAL",
                T::Decimal | T::BigInteger => "NUMERIC",
                T::Bytes => "BLOB",
                T::String | T::Char | T::Date | T::Time | T::Timestamp | T::Uuid => "TEXT",
            }
            .to_string();
        }

        match ty {
            T::String => format!("VARCHAR({})", facets.length.unwrap_or(DEFAULT_STRING_LENGTH)),
            T::Char => format!("CHAR({})", facets.length.unwrap_or(1)),
            T::Boolean => "BOOLEAN".to_string(),
            T::Byte if matches!(d, Dialect::H2 | Dialect::MySql) => "TINYINT".to_string(),
            T::Byte | T::Short => "SMALLINT".to_string(),
            T::Integer if d == Dialect::MySql => "INT".to_string(),
            T::Integer => "INTEGER".to_string(),
            T::Long => "BIGINT".to_string(),
            T::Float if d == Dialect::MySql => "FLOAT".to_string(),
            T::Float => "REAL".to_string(),
            T::Double if d == Dialect::MySql => "DOUBLE".to_string(),
            T::Double => "DOUBLE PRECISION".to_string(),
            T::Decimal => format!(
                "DECIMAL({},{})",
                facets.precision.unwrap_or(DEFAULT_DECIMAL_PRECISION),
                facets.scale.unwrap_or(DEFAULT_DECIMAL_SCALE)
            ),
            T::BigInteger => format!(
                "DECIMAL({},0)",
                facets.precision.unwrap_or(DEFAULT_BIG_INTEGER_PRECISION)
            ),
            T::Date => "DATE".to_string(),
            T::Time => "TIME".to_string(),
            T::Timestamp if d == Dialect::MySql => "DATETIME".to_string(),
            T::Timestamp => "TIMESTAMP".to_string(),
            T::Uuid if matches!(d, Dialect::H2 | Dialect::PostgreSql) => "UUID".to_string(),
            T::Uuid => "CHAR(36)".to_string(),
            T::Bytes if d == Dialect::PostgreSql => "BYTEA".to_string(),
            T::Bytes if d == Dialect::MySql => "LONGBLOB".to_string(),
            T::Bytes => "BLOB".to_string(),
        }
    }

    /// Quote an identifier when it is reserved or not a plain upper/lower-case word.
    pub fn quote(&self, ident: &str) -> String {
        let plain = !ident.is_empty()
            && !ident.starts_with(|c: char| c.is_ascii_digit())
            && ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        let reserved = RESERVED.contains(&ident.to_ascii_uppercase().as_str());
        if plain && !reserved {
            return ident.to_string();
        }
        match self {
            Dialect::MySql => format!("`{}`", ident.replace('`', "``")),
            _ => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    pub fn drop_foreign_key(&self, table: &str, constraint: &str) -> Option<String> {
        match self {
            Dialect::Sqlite => None,
            Dialect::MySql => Some(format!(
                "ALTER TABLE {} DROP FOREIGN KEY {}",
                table,
                self.quote(constraint)
            )),
            _ => Some(format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                table,
                self.quote(constraint)
            )),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
