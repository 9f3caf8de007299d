//! Built-in SQL dialects.
//!
//! Every dialect is a plain immutable [`Dialect`] record: quoting characters,
//! the bound-parameter prefix, paging and upsert strategies, and the handful
//! of expressions that differ between products. Records are returned by
//! value from [`SqlDialect::dialect`] and can be shared freely.
//!
//! | Dialect | Columns | Prefix | Paging |
//! |---------|---------|--------|--------|
//! | SQL Server | `[ ]` | `@` | `OFFSET .. ROWS FETCH NEXT .. ROWS ONLY` |
//! | MySQL | `` ` ` `` | `@` | `LIMIT .. OFFSET ..` |
//! | PostgreSQL | `" "` | `@` (or `$`) | `LIMIT .. OFFSET ..` |
//! | SQLite | `[ ]` | `@` | `LIMIT .. OFFSET ..` |
//! | Oracle | `" "` | `:` | `OFFSET .. ROWS FETCH NEXT .. ROWS ONLY` |
//! | DB2 | `" "` | `@` | `OFFSET .. ROWS FETCH NEXT .. ROWS ONLY` |
//!
//! # Example
//!
//! ```
//! use sql_template::dialect::SqlDialect;
//!
//! let dialect = SqlDialect::SqlServer.dialect();
//! assert_eq!(dialect.quote_ident("dbo.items"), "[dbo].[items]");
//! assert_eq!(dialect.limit_clause("10"), "FETCH NEXT 10 ROWS ONLY");
//!
//! let pg = SqlDialect::PostgreSql.dialect().with_parameter_prefix('$');
//! assert_eq!(pg.parameter("id"), "$id");
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlparser::dialect::{
    Dialect as ParserDialect, GenericDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect,
    SQLiteDialect
};

/// Target database product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum SqlDialect {
    SqlServer,
    MySql,
    PostgreSql,
    #[default]
    Sqlite,
    Oracle,
    Db2
}

/// All built-in dialects, in declaration order.
pub const ALL_DIALECTS: [SqlDialect; 6] = [
    SqlDialect::SqlServer,
    SqlDialect::MySql,
    SqlDialect::PostgreSql,
    SqlDialect::Sqlite,
    SqlDialect::Oracle,
    SqlDialect::Db2
];

impl SqlDialect {
    /// Syntax record for this dialect.
    pub fn dialect(self) -> Dialect {
        match self {
            Self::SqlServer => Dialect {
                kind:              self,
                column_quote:      ('[', ']'),
                string_quote:      ('\'', '\''),
                parameter_prefix:  '@',
                paging:            PagingStrategy::OffsetFetch,
                upsert:            UpsertStrategy::Merge,
                current_timestamp: "GETDATE()",
                concat:            ConcatStyle::Operator("+")
            },
            Self::MySql => Dialect {
                kind:              self,
                column_quote:      ('`', '`'),
                string_quote:      ('\'', '\''),
                parameter_prefix:  '@',
                paging:            PagingStrategy::LimitOffset,
                upsert:            UpsertStrategy::OnDuplicateKey,
                current_timestamp: "NOW()",
                concat:            ConcatStyle::Function("CONCAT")
            },
            Self::PostgreSql => Dialect {
                kind:              self,
                column_quote:      ('"', '"'),
                string_quote:      ('\'', '\''),
                parameter_prefix:  '@',
                paging:            PagingStrategy::LimitOffset,
                upsert:            UpsertStrategy::OnConflict,
                current_timestamp: "CURRENT_TIMESTAMP",
                concat:            ConcatStyle::Operator("||")
            },
            Self::Sqlite => Dialect {
                kind:              self,
                column_quote:      ('[', ']'),
                string_quote:      ('\'', '\''),
                parameter_prefix:  '@',
                paging:            PagingStrategy::LimitOffset,
                upsert:            UpsertStrategy::OnConflict,
                current_timestamp: "CURRENT_TIMESTAMP",
                concat:            ConcatStyle::Operator("||")
            },
            Self::Oracle => Dialect {
                kind:              self,
                column_quote:      ('"', '"'),
                string_quote:      ('\'', '\''),
                parameter_prefix:  ':',
                paging:            PagingStrategy::OffsetFetch,
                upsert:            UpsertStrategy::Merge,
                current_timestamp: "SYSTIMESTAMP",
                concat:            ConcatStyle::Operator("||")
            },
            Self::Db2 => Dialect {
                kind:              self,
                column_quote:      ('"', '"'),
                string_quote:      ('\'', '\''),
                parameter_prefix:  '@',
                paging:            PagingStrategy::OffsetFetch,
                upsert:            UpsertStrategy::Merge,
                current_timestamp: "CURRENT TIMESTAMP",
                concat:            ConcatStyle::Operator("||")
            }
        }
    }

    /// Convert to sqlparser dialect for parsing
    pub fn into_parser_dialect(self) -> Box<dyn ParserDialect> {
        match self {
            Self::SqlServer => Box::new(MsSqlDialect {}),
            Self::MySql => Box::new(MySqlDialect {}),
            Self::PostgreSql => Box::new(PostgreSqlDialect {}),
            Self::Sqlite => Box::new(SQLiteDialect {}),
            Self::Oracle | Self::Db2 => Box::new(GenericDialect {})
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SqlServer => write!(f, "SQL Server"),
            Self::MySql => write!(f, "MySQL"),
            Self::PostgreSql => write!(f, "PostgreSQL"),
            Self::Sqlite => write!(f, "SQLite"),
            Self::Oracle => write!(f, "Oracle"),
            Self::Db2 => write!(f, "DB2")
        }
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlserver" | "sql-server" | "mssql" => Ok(Self::SqlServer),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "postgresql" | "postgres" | "pgsql" | "pg" => Ok(Self::PostgreSql),
            "sqlite" => Ok(Self::Sqlite),
            "oracle" => Ok(Self::Oracle),
            "db2" => Ok(Self::Db2),
            other => Err(format!("unknown SQL dialect '{}'", other))
        }
    }
}

/// How row limits and offsets are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PagingStrategy {
    /// `LIMIT n` / `OFFSET n`
    LimitOffset,
    /// `OFFSET n ROWS` / `FETCH NEXT n ROWS ONLY`
    OffsetFetch
}

/// How an insert-or-update statement is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UpsertStrategy {
    /// `INSERT .. ON CONFLICT (..) DO UPDATE SET ..`
    OnConflict,
    /// `INSERT .. ON DUPLICATE KEY UPDATE ..`
    OnDuplicateKey,
    /// `MERGE INTO .. USING .. WHEN MATCHED .. WHEN NOT MATCHED ..`
    Merge
}

/// String concatenation syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConcatStyle {
    Operator(&'static str),
    Function(&'static str)
}

/// Syntax rules for one database product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Dialect {
    pub kind:              SqlDialect,
    pub column_quote:      (char, char),
    pub string_quote:      (char, char),
    pub parameter_prefix:  char,
    pub paging:            PagingStrategy,
    pub upsert:            UpsertStrategy,
    pub current_timestamp: &'static str,
    pub concat:            ConcatStyle
}

impl Default for Dialect {
    fn default() -> Self {
        SqlDialect::default().dialect()
    }
}

impl Dialect {
    /// Same dialect with another bound-parameter prefix.
    #[must_use]
    pub fn with_parameter_prefix(mut self, prefix: char) -> Self {
        self.parameter_prefix = prefix;
        self
    }

    /// Quote a table or column name; dotted names are quoted per part.
    pub fn quote_ident(&self, name: &str) -> String {
        name.split('.')
            .map(|part| self.quote_part(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn quote_part(&self, part: &str) -> String {
        let (open, close) = self.column_quote;
        let mut quoted = String::with_capacity(part.len() + 2);
        quoted.push(open);
        for ch in part.chars() {
            if ch == close {
                quoted.push(close);
            }
            quoted.push(ch);
        }
        quoted.push(close);
        quoted
    }

    /// Quote a string literal.
    pub fn quote_string(&self, text: &str) -> String {
        let (open, close) = self.string_quote;
        let mut quoted = String::with_capacity(text.len() + 2);
        quoted.push(open);
        for ch in text.chars() {
            if ch == close {
                quoted.push(close);
            }
            quoted.push(ch);
        }
        quoted.push(close);
        quoted
    }

    /// Bound-parameter reference for `name`.
    pub fn parameter(&self, name: &str) -> String {
        let mut param = String::with_capacity(name.len() + 1);
        param.push(self.parameter_prefix);
        param.push_str(name);
        param
    }

    /// Row limit clause; `count` is emitted verbatim.
    pub fn limit_clause(&self, count: &str) -> String {
        match self.paging {
            PagingStrategy::LimitOffset => format!("LIMIT {}", count),
            PagingStrategy::OffsetFetch => format!("FETCH NEXT {} ROWS ONLY", count)
        }
    }

    /// Row offset clause; `count` is emitted verbatim.
    pub fn offset_clause(&self, count: &str) -> String {
        match self.paging {
            PagingStrategy::LimitOffset => format!("OFFSET {}", count),
            PagingStrategy::OffsetFetch => format!("OFFSET {} ROWS", count)
        }
    }

    /// Whether `FETCH` is only accepted after an `OFFSET` clause.
    pub fn limit_needs_offset(&self) -> bool {
        self.kind == SqlDialect::SqlServer
    }

    /// Row limit for a statement without an offset of its own.
    pub fn standalone_limit_clause(&self, count: &str) -> String {
        if self.limit_needs_offset() {
            format!("{} {}", self.offset_clause("0"), self.limit_clause(count))
        } else {
            self.limit_clause(count)
        }
    }

    /// Subquery returning no rows, the operand-free stand-in for `IN ()`.
    pub fn empty_subquery(&self) -> &'static str {
        match self.kind {
            SqlDialect::MySql | SqlDialect::Oracle => "SELECT 1 FROM DUAL WHERE 1=0",
            SqlDialect::Db2 => "SELECT 1 FROM SYSIBM.SYSDUMMY1 WHERE 1=0",
            _ => "SELECT 1 WHERE 1=0"
        }
    }

    pub fn current_timestamp(&self) -> &'static str {
        self.current_timestamp
    }

    /// Concatenate already-rendered SQL expressions.
    pub fn concat(&self, parts: &[&str]) -> String {
        match self.concat {
            ConcatStyle::Operator(op) => parts.join(&format!(" {} ", op)),
            ConcatStyle::Function(name) => format!("{}({})", name, parts.join(", "))
        }
    }

    /// Maximum bound parameters accepted in one statement.
    pub fn max_parameters(&self) -> usize {
        match self.kind {
            SqlDialect::SqlServer => 2100,
            SqlDialect::Sqlite => 32766,
            _ => 65535
        }
    }

    /// Row cap of one `VALUES` constructor, where the server has one.
    pub fn max_insert_rows(&self) -> Option<usize> {
        match self.kind {
            SqlDialect::SqlServer => Some(1000),
            _ => None
        }
    }

    /// Single-row insert-or-update statement using named parameters.
    ///
    /// `conflict_columns` identify the row; every other column is updated.
    pub fn upsert_clause(
        &self,
        table: &str,
        columns: &[&str],
        conflict_columns: &[&str]
    ) -> String {
        let table = self.quote_ident(table);
        let quoted: Vec<String> = columns.iter().map(|c| self.quote_ident(c)).collect();
        let params: Vec<String> = columns.iter().map(|c| self.parameter(c)).collect();
        let is_key = |c: &&str| conflict_columns.iter().any(|k| k.eq_ignore_ascii_case(c));
        let updates: Vec<&str> = columns.iter().copied().filter(|c| !is_key(c)).collect();
        match self.upsert {
            UpsertStrategy::OnConflict => {
                let keys: Vec<String> =
                    conflict_columns.iter().map(|c| self.quote_ident(c)).collect();
                let set: Vec<String> = updates
                    .iter()
                    .map(|c| {
                        let q = self.quote_ident(c);
                        format!("{} = excluded.{}", q, q)
                    })
                    .collect();
                format!(
                    "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO UPDATE SET {}",
                    table,
                    quoted.join(", "),
                    params.join(", "),
                    keys.join(", "),
                    set.join(", ")
                )
            }
            UpsertStrategy::OnDuplicateKey => {
                let set: Vec<String> = updates
                    .iter()
                    .map(|c| {
                        let q = self.quote_ident(c);
                        format!("{} = VALUES({})", q, q)
                    })
                    .collect();
                format!(
                    "INSERT INTO {} ({}) VALUES ({}) ON DUPLICATE KEY UPDATE {}",
                    table,
                    quoted.join(", "),
                    params.join(", "),
                    set.join(", ")
                )
            }
            UpsertStrategy::Merge => {
                let source: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{} AS {}", self.parameter(c), self.quote_ident(c)))
                    .collect();
                let from_dual = if self.kind == SqlDialect::Oracle {
                    " FROM DUAL"
                } else if self.kind == SqlDialect::Db2 {
                    " FROM SYSIBM.SYSDUMMY1"
                } else {
                    ""
                };
                let on: Vec<String> = conflict_columns
                    .iter()
                    .map(|c| {
                        let q = self.quote_ident(c);
                        format!("t.{} = s.{}", q, q)
                    })
                    .collect();
                let set: Vec<String> = updates
                    .iter()
                    .map(|c| {
                        let q = self.quote_ident(c);
                        format!("t.{} = s.{}", q, q)
                    })
                    .collect();
                let inserted: Vec<String> = columns
                    .iter()
                    .map(|c| format!("s.{}", self.quote_ident(c)))
                    .collect();
                let terminator = if self.kind == SqlDialect::SqlServer { ";" } else { "" };
                format!(
                    "MERGE INTO {} t USING (SELECT {}{}) s ON ({}) WHEN MATCHED THEN UPDATE SET {} WHEN NOT MATCHED THEN INSERT ({}) VALUES ({}){}",
                    table,
                    source.join(", "),
                    from_dual,
                    on.join(" AND "),
                    set.join(", "),
                    quoted.join(", "),
                    inserted.join(", "),
                    terminator
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_doubles_closing_quote() {
        let dialect = SqlDialect::SqlServer.dialect();
        assert_eq!(dialect.quote_ident("a]b"), "[a]]b]");
        let pg = SqlDialect::PostgreSql.dialect();
        assert_eq!(pg.quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_quote_string() {
        let dialect = SqlDialect::MySql.dialect();
        assert_eq!(dialect.quote_string("it's"), "'it''s'");
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("mssql".parse::<SqlDialect>(), Ok(SqlDialect::SqlServer));
        assert_eq!("Postgres".parse::<SqlDialect>(), Ok(SqlDialect::PostgreSql));
        assert_eq!("db2".parse::<SqlDialect>(), Ok(SqlDialect::Db2));
        assert!("access".parse::<SqlDialect>().is_err());
    }

    #[test]
    fn test_concat_styles() {
        assert_eq!(SqlDialect::MySql.dialect().concat(&["a", "b"]), "CONCAT(a, b)");
        assert_eq!(SqlDialect::Sqlite.dialect().concat(&["a", "b"]), "a || b");
        assert_eq!(SqlDialect::SqlServer.dialect().concat(&["a", "b"]), "a + b");
    }
}
