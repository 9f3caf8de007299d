//! Entity column metadata and the placeholder resolution context.
//!
//! A [`PlaceholderContext`] bundles everything static resolution needs: the
//! dialect, the table name and the ordered entity columns. It is built once
//! per entity and borrowed by [`prepare`](crate::template::prepare).
//!
//! # Example
//!
//! ```
//! use sql_template::{
//!     context::{ColumnMeta, DbType, PlaceholderContext},
//!     dialect::SqlDialect
//! };
//!
//! let ctx = PlaceholderContext::new(SqlDialect::Sqlite.dialect(), "items")
//!     .with_column(ColumnMeta::from_property("Id", DbType::Int64, false))
//!     .with_column(ColumnMeta::from_property("CreatedAt", DbType::DateTime, true));
//!
//! assert_eq!(ctx.columns[1].sql_name, "created_at");
//! ```

use std::hash::{Hash, Hasher};

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::Serialize;

use crate::dialect::Dialect;

/// Logical column type, as far as the engine cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[non_exhaustive]
pub enum DbType {
    Boolean,
    Byte,
    Int16,
    Int32,
    Int64,
    Decimal,
    Double,
    String,
    DateTime,
    Guid,
    Binary,
    Object
}

impl DbType {
    /// Map a SQL type name (`VARCHAR(255)`, `BIGINT`, ...) to a [`DbType`].
    pub fn from_sql_type(sql_type: &str) -> Self {
        let upper = sql_type.trim().to_uppercase();
        let base = upper
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default();
        match base {
            "BOOL" | "BOOLEAN" | "BIT" => Self::Boolean,
            "TINYINT" => Self::Byte,
            "SMALLINT" | "INT2" => Self::Int16,
            "INT" | "INTEGER" | "INT4" | "MEDIUMINT" => Self::Int32,
            "BIGINT" | "INT8" => Self::Int64,
            "DECIMAL" | "NUMERIC" | "NUMBER" | "MONEY" => Self::Decimal,
            "REAL" | "FLOAT" | "DOUBLE" | "FLOAT4" | "FLOAT8" => Self::Double,
            "CHAR" | "VARCHAR" | "NCHAR" | "NVARCHAR" | "VARCHAR2" | "TEXT" | "CLOB" | "STRING" => {
                Self::String
            }
            "DATE" | "TIME" | "DATETIME" | "DATETIME2" | "TIMESTAMP" | "TIMESTAMPTZ" => {
                Self::DateTime
            }
            "UUID" | "UNIQUEIDENTIFIER" => Self::Guid,
            "BLOB" | "BYTEA" | "BINARY" | "VARBINARY" => Self::Binary,
            _ => Self::Object
        }
    }
}

/// One entity column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnMeta {
    /// Name used in SQL (`created_at`)
    pub sql_name:      CompactString,
    /// Name on the entity (`CreatedAt`)
    pub property_name: CompactString,
    pub db_type:       DbType,
    pub nullable:      bool
}

impl ColumnMeta {
    pub fn new(
        sql_name: impl Into<CompactString>,
        property_name: impl Into<CompactString>,
        db_type: DbType,
        nullable: bool
    ) -> Self {
        Self {
            sql_name: sql_name.into(),
            property_name: property_name.into(),
            db_type,
            nullable
        }
    }

    /// Column whose SQL name is the snake_case form of the property name.
    pub fn from_property(property: &str, db_type: DbType, nullable: bool) -> Self {
        Self::new(to_snake_case(property), property, db_type, nullable)
    }

    /// Column whose property name is the PascalCase form of the SQL name.
    pub fn from_sql_name(sql_name: &str, db_type: DbType, nullable: bool) -> Self {
        Self::new(sql_name, to_pascal_case(sql_name), db_type, nullable)
    }

    /// Case-insensitive match against either the SQL or the property name.
    pub fn matches(&self, name: &str) -> bool {
        self.sql_name.eq_ignore_ascii_case(name) || self.property_name.eq_ignore_ascii_case(name)
    }
}

/// Resolution environment: dialect, table and ordered columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderContext {
    pub dialect:    Dialect,
    pub table_name: CompactString,
    pub columns:    Vec<ColumnMeta>,
    /// Caller-registered static placeholders (name -> SQL fragment)
    pub custom:     IndexMap<CompactString, String>
}

impl PlaceholderContext {
    pub fn new(dialect: Dialect, table_name: impl Into<CompactString>) -> Self {
        Self {
            dialect,
            table_name: table_name.into(),
            columns: Vec::new(),
            custom: IndexMap::new()
        }
    }

    #[must_use]
    pub fn with_column(mut self, column: ColumnMeta) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = ColumnMeta>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Register a static placeholder outside the built-in set.
    #[must_use]
    pub fn with_custom_placeholder(
        mut self,
        name: impl Into<CompactString>,
        sql: impl Into<String>
    ) -> Self {
        self.custom.insert(name.into(), sql.into());
        self
    }

    /// Look up a column by SQL or property name, ignoring case.
    pub fn find_column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.matches(name))
    }

    /// Columns left after applying `--only` / `--exclude` lists.
    pub fn filter_columns(&self, filter: &ColumnFilter) -> Vec<&ColumnMeta> {
        self.columns.iter().filter(|c| filter.keeps(c)).collect()
    }
}

impl Hash for PlaceholderContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dialect.hash(state);
        self.table_name.hash(state);
        self.columns.hash(state);
        for (name, sql) in &self.custom {
            name.hash(state);
            sql.hash(state);
        }
    }
}

/// `--only` / `--exclude` selection. `only` wins when both are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnFilter {
    pub only:    Option<Vec<CompactString>>,
    pub exclude: Vec<CompactString>
}

impl ColumnFilter {
    pub fn keeps(&self, column: &ColumnMeta) -> bool {
        match &self.only {
            Some(only) => only.iter().any(|name| column.matches(name)),
            None => !self.exclude.iter().any(|name| column.matches(name))
        }
    }
}

/// `CreatedAt` -> `created_at`, `UserID` -> `user_id`.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev != '_'
                    && (prev.is_lowercase()
                        || prev.is_ascii_digit()
                        || (prev.is_uppercase() && next_lower))
                {
                    out.push('_');
                }
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `created_at` -> `CreatedAt`.
pub fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new()
            }
        })
        .collect()
}
