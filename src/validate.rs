//! Syntax check for rendered SQL.

use sqlparser::parser::Parser;
use tracing::debug;

use crate::{
    dialect::SqlDialect,
    error::{AppResult, rendered_sql_error}
};

/// Parse `sql` with the dialect's parser and return the statement count.
///
/// Named parameters (`@id`, `:id`, `$id`) are accepted where the parser
/// dialect accepts placeholders.
///
/// # Errors
///
/// Returns error if the SQL does not parse
///
/// ```
/// use sql_template::{dialect::SqlDialect, validate::validate_sql};
///
/// assert_eq!(validate_sql("SELECT 1; SELECT 2", SqlDialect::Sqlite).unwrap(), 2);
/// assert!(validate_sql("SELECT FROM WHERE", SqlDialect::Sqlite).is_err());
/// ```
pub fn validate_sql(sql: &str, dialect: SqlDialect) -> AppResult<usize> {
    let parser_dialect = dialect.into_parser_dialect();
    let statements = Parser::parse_sql(parser_dialect.as_ref(), sql)
        .map_err(|e| rendered_sql_error(e.to_string()))?;
    debug!(statements = statements.len(), %dialect, "rendered SQL parsed");
    Ok(statements.len())
}
