//! Application types for CLI commands.
//!
//! Command parameters decoupled from `clap`, so command logic can be driven
//! directly from tests.

use crate::cli::{Dialect, Format, TemplateArgs};

/// Template source and context options shared by `prepare` and `render`.
///
/// # Example
///
/// ```
/// use sql_template::{
///     app::TemplateParams,
///     cli::{Dialect, Format}
/// };
///
/// let params = TemplateParams {
///     template_path:    "query.sql".to_string(),
///     table:            Some("items".to_string()),
///     schema_path:      None,
///     columns:          vec!["Id".to_string(), "Name".to_string()],
///     dialect:          Some(Dialect::Sqlite),
///     parameter_prefix: None,
///     output_format:    Format::Text,
///     no_color:         true
/// };
/// assert_eq!(params.columns.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct TemplateParams {
    /// Path to the template file or "-" for stdin input.
    pub template_path:    String,
    /// Table name; required unless the schema has exactly one table.
    pub table:            Option<String>,
    /// Path to CREATE TABLE DDL.
    pub schema_path:      Option<String>,
    /// Property names used when no schema is given.
    pub columns:          Vec<String>,
    /// Dialect override; falls back to config, then SQLite.
    pub dialect:          Option<Dialect>,
    pub parameter_prefix: Option<char>,
    pub output_format:    Format,
    /// Disable colored terminal output.
    pub no_color:         bool
}

impl From<TemplateArgs> for TemplateParams {
    fn from(args: TemplateArgs) -> Self {
        Self {
            template_path:    args.template.display().to_string(),
            table:            args.table,
            schema_path:      args.schema.map(|p| p.display().to_string()),
            columns:          args.columns,
            dialect:          args.dialect,
            parameter_prefix: args.parameter_prefix,
            output_format:    args.output_format,
            no_color:         args.no_color
        }
    }
}

/// Parameters for the render command.
#[derive(Debug, Clone)]
pub struct RenderParams {
    pub template:       TemplateParams,
    /// Inline JSON object, or `@path` to a JSON file.
    pub params:         Option<String>,
    pub max_batch_size: Option<usize>,
    pub validate:       bool
}

/// Text to print and the process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub output:    String
}

impl CommandOutput {
    pub fn success(output: String) -> Self {
        Self {
            exit_code: 0,
            output
        }
    }
}
