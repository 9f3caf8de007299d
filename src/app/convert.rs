//! Type conversion functions for CLI to internal types.

use crate::{
    cli::{Dialect, Format},
    dialect::SqlDialect,
    output::OutputFormat
};

/// Converts a CLI dialect enum to the engine's dialect.
///
/// # Example
///
/// ```
/// use sql_template::{app::convert_dialect, cli::Dialect, dialect::SqlDialect};
///
/// assert_eq!(convert_dialect(Dialect::Sqlserver), SqlDialect::SqlServer);
/// ```
pub fn convert_dialect(dialect: Dialect) -> SqlDialect {
    match dialect {
        Dialect::Sqlserver => SqlDialect::SqlServer,
        Dialect::Mysql => SqlDialect::MySql,
        Dialect::Postgresql => SqlDialect::PostgreSql,
        Dialect::Sqlite => SqlDialect::Sqlite,
        Dialect::Oracle => SqlDialect::Oracle,
        Dialect::Db2 => SqlDialect::Db2
    }
}

/// Converts a CLI format enum to the internal output format type.
pub fn convert_format(format: Format) -> OutputFormat {
    match format {
        Format::Text => OutputFormat::Text,
        Format::Json => OutputFormat::Json,
        Format::Yaml => OutputFormat::Yaml
    }
}
