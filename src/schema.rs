//! Column metadata from SQL DDL.
//!
//! Parses `CREATE TABLE` statements into ordered column lists that can seed a
//! [`PlaceholderContext`]. Other statements are ignored.
//!
//! # Example
//!
//! ```
//! use sql_template::{dialect::SqlDialect, schema::Schema};
//!
//! let ddl = r#"
//!     CREATE TABLE items (
//!         id INT PRIMARY KEY,
//!         created_at TIMESTAMP NOT NULL,
//!         note TEXT
//!     );
//! "#;
//!
//! let schema = Schema::parse(ddl, SqlDialect::Sqlite).unwrap();
//! let items = schema.table("items").unwrap();
//! assert_eq!(items.columns.len(), 3);
//!
//! let ctx = items.to_context(SqlDialect::Sqlite.dialect());
//! assert_eq!(ctx.columns[1].property_name, "CreatedAt");
//! ```

use indexmap::IndexMap;
use sqlparser::parser::Parser;

use crate::{
    context::{ColumnMeta, DbType, PlaceholderContext},
    dialect::{Dialect, SqlDialect},
    error::{AppResult, schema_parse_error}
};

/// Table from one `CREATE TABLE`.
#[derive(Debug, Clone)]
pub struct TableInfo {
    /// Unquoted table name, schema-qualified when the DDL qualifies it
    pub name:    String,
    /// Columns in declaration order
    pub columns: Vec<ColumnInfo>
}

/// Column metadata extracted from CREATE TABLE.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    /// Column name
    pub name:        String,
    /// SQL data type (e.g., "INT", "VARCHAR(255)")
    pub data_type:   String,
    /// Whether NULL values are allowed
    pub is_nullable: bool,
    /// Whether this is a primary key column
    pub is_primary:  bool
}

/// Tables in declaration order.
#[derive(Debug, Default, Clone)]
pub struct Schema {
    pub tables: IndexMap<String, TableInfo>
}

impl Schema {
    /// Parse SQL schema from string with specified dialect
    ///
    /// # Errors
    ///
    /// Returns error if SQL parsing fails
    pub fn parse(sql: &str, dialect: SqlDialect) -> AppResult<Self> {
        let parser_dialect = dialect.into_parser_dialect();
        let statements = Parser::parse_sql(parser_dialect.as_ref(), sql)
            .map_err(|e| schema_parse_error(e.to_string()))?;
        let mut schema = Self::default();
        for stmt in statements {
            schema.process_statement(stmt);
        }
        Ok(schema)
    }

    fn process_statement(&mut self, stmt: sqlparser::ast::Statement) {
        use sqlparser::ast::Statement;
        if let Statement::CreateTable(create) = stmt {
            let table_name = create
                .name
                .0
                .iter()
                .map(|part| unquote(&part.to_string()).to_string())
                .collect::<Vec<_>>()
                .join(".");
            let columns = create
                .columns
                .into_iter()
                .map(|column| ColumnInfo {
                    is_primary:  column.options.iter().any(|opt| {
                        matches!(
                            opt.option,
                            sqlparser::ast::ColumnOption::PrimaryKey(_)
                        )
                    }),
                    is_nullable: !column.options.iter().any(|opt| {
                        matches!(opt.option, sqlparser::ast::ColumnOption::NotNull)
                    }),
                    data_type:   column.data_type.to_string(),
                    name:        column.name.value
                })
                .collect();
            self.tables.insert(
                table_name.clone(),
                TableInfo {
                    name: table_name,
                    columns
                }
            );
        }
    }

    /// Table by name, ignoring case.
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.get(name).or_else(|| {
            self.tables
                .values()
                .find(|t| t.name.eq_ignore_ascii_case(name))
        })
    }

    /// The only table, when the DDL declares exactly one.
    pub fn single_table(&self) -> Option<&TableInfo> {
        match self.tables.len() {
            1 => self.tables.values().next(),
            _ => None
        }
    }
}

impl TableInfo {
    /// Names of inline primary-key columns.
    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_primary)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Placeholder context over this table's columns.
    pub fn to_context(&self, dialect: Dialect) -> PlaceholderContext {
        PlaceholderContext::new(dialect, self.name.as_str()).with_columns(self.columns.iter().map(
            |c| ColumnMeta::from_sql_name(&c.name, DbType::from_sql_type(&c.data_type), c.is_nullable)
        ))
    }
}

fn unquote(part: &str) -> &str {
    let trimmed = part
        .strip_prefix('[')
        .and_then(|p| p.strip_suffix(']'))
        .or_else(|| part.strip_prefix('"').and_then(|p| p.strip_suffix('"')))
        .or_else(|| part.strip_prefix('`').and_then(|p| p.strip_suffix('`')));
    trimmed.unwrap_or(part)
}
