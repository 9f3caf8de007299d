//! Helper functions for CLI operations.
//!
//! Input reading, context construction and configuration fallbacks.

use std::{
    fs::read_to_string,
    io::{self, Read}
};

use super::{
    convert::{convert_dialect, convert_format},
    types::TemplateParams
};
use crate::{
    cli::{Dialect, Format},
    config::Config,
    context::{ColumnMeta, DbType, PlaceholderContext},
    dialect::SqlDialect,
    error::{AppResult, config_error, file_read_error},
    output::OutputOptions,
    schema::Schema,
    value::{Parameters, parameters_from_json}
};

/// Reads a template from a file or stdin.
///
/// Supports reading from a file path or from standard input when the
/// path is "-".
///
/// # Errors
///
/// Returns an error if the file cannot be read or stdin fails.
pub fn read_template_input(path: &str) -> AppResult<String> {
    if path == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| file_read_error("stdin", e))?;
        Ok(buffer)
    } else {
        read_to_string(path).map_err(|e| file_read_error(path, e))
    }
}

/// Parses runtime parameters from inline JSON or an `@path` JSON file.
///
/// `None` yields an empty map.
///
/// # Example
///
/// ```
/// use sql_template::{app::load_parameters, value::ParamValue};
///
/// let params = load_parameters(Some(r#"{"n": 10}"#)).unwrap();
/// assert_eq!(params["n"], ParamValue::Int(10));
/// assert!(load_parameters(None).unwrap().is_empty());
/// ```
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is not an object.
pub fn load_parameters(arg: Option<&str>) -> AppResult<Parameters> {
    let Some(arg) = arg else {
        return Ok(Parameters::new());
    };
    let json = match arg.strip_prefix('@') {
        Some(path) => read_to_string(path).map_err(|e| file_read_error(path, e))?,
        None => arg.to_string()
    };
    parameters_from_json(&json).map_err(|e| config_error(format!("Invalid --params: {}", e)))
}

/// Returns the dialect to use: CLI flag, then config, then the default.
///
/// # Errors
///
/// Returns an error if the configured dialect name is unknown.
pub fn get_effective_dialect(cli: Option<Dialect>, config: &Config) -> AppResult<SqlDialect> {
    match cli {
        Some(dialect) => Ok(convert_dialect(dialect)),
        None => Ok(config.dialect()?.unwrap_or_default())
    }
}

/// Builds the placeholder context from a schema file or a column list.
///
/// # Errors
///
/// Returns an error if the schema cannot be read or parsed, if the table
/// cannot be determined, or if neither schema nor table is given.
pub fn build_context(params: &TemplateParams, config: &Config) -> AppResult<PlaceholderContext> {
    let sql_dialect = get_effective_dialect(params.dialect, config)?;
    let mut dialect = sql_dialect.dialect();
    if let Some(prefix) = params.parameter_prefix.or(config.render.parameter_prefix) {
        dialect = dialect.with_parameter_prefix(prefix);
    }

    if let Some(schema_path) = &params.schema_path {
        let ddl = read_to_string(schema_path).map_err(|e| file_read_error(schema_path, e))?;
        let schema = Schema::parse(&ddl, sql_dialect)?;
        let table = match &params.table {
            Some(name) => schema
                .table(name)
                .ok_or_else(|| config_error(format!("Table '{}' not found in schema", name)))?,
            None => schema.single_table().ok_or_else(|| {
                config_error(format!(
                    "Schema declares {} tables; pass --table to pick one",
                    schema.tables.len()
                ))
            })?
        };
        return Ok(table.to_context(dialect));
    }

    let table = params
        .table
        .as_deref()
        .ok_or_else(|| config_error("--table is required when --schema is not given"))?;
    let columns = params
        .columns
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| ColumnMeta::from_property(c, DbType::Object, true));
    Ok(PlaceholderContext::new(dialect, table).with_columns(columns))
}

/// Creates output options from CLI format and flags.
///
/// # Example
///
/// ```
/// use sql_template::{app::create_output_options, cli::Format, output::OutputFormat};
///
/// let opts = create_output_options(Format::Json, true);
/// assert_eq!(opts.format, OutputFormat::Json);
/// assert!(!opts.colored);
/// ```
pub fn create_output_options(format: Format, no_color: bool) -> OutputOptions {
    OutputOptions {
        format:  convert_format(format),
        colored: !no_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TemplateParams {
        TemplateParams {
            template_path:    "-".to_string(),
            table:            Some("items".to_string()),
            schema_path:      None,
            columns:          vec!["Id".to_string(), " CreatedAt ".to_string(), String::new()],
            dialect:          None,
            parameter_prefix: None,
            output_format:    Format::Text,
            no_color:         true
        }
    }

    #[test]
    fn test_build_context_from_columns() {
        let ctx = build_context(&params(), &Config::default()).unwrap();
        assert_eq!(ctx.dialect.kind, SqlDialect::Sqlite);
        assert_eq!(ctx.columns.len(), 2);
        assert_eq!(ctx.columns[1].sql_name, "created_at");
    }

    #[test]
    fn test_build_context_requires_table() {
        let mut p = params();
        p.table = None;
        assert!(build_context(&p, &Config::default()).is_err());
    }

    #[test]
    fn test_config_prefix_applies_when_flag_absent() {
        let mut config = Config::default();
        config.render.parameter_prefix = Some('$');
        let ctx = build_context(&params(), &config).unwrap();
        assert_eq!(ctx.dialect.parameter_prefix, '$');

        let mut p = params();
        p.parameter_prefix = Some(':');
        let ctx = build_context(&p, &config).unwrap();
        assert_eq!(ctx.dialect.parameter_prefix, ':');
    }

    #[test]
    fn test_effective_dialect_prefers_flag() {
        let mut config = Config::default();
        config.render.dialect = Some("mysql".to_string());
        assert_eq!(
            get_effective_dialect(None, &config).unwrap(),
            SqlDialect::MySql
        );
        assert_eq!(
            get_effective_dialect(Some(Dialect::Oracle), &config).unwrap(),
            SqlDialect::Oracle
        );
    }
}
