//! Command execution logic.
//!
//! `run_prepare` and `run_render` read the template, build the placeholder
//! context and format the engine's output. Both go through the global
//! prepared-template cache.

use tracing::debug;

use super::{
    helpers::{build_context, create_output_options, load_parameters, read_template_input},
    types::{CommandOutput, RenderParams, TemplateParams}
};
use crate::{
    cache::prepare_cached,
    collection::{BatchOptions, render_batches},
    config::Config,
    error::{AppResult, template_error},
    output::{format_prepared, format_rendered},
    validate::validate_sql
};

/// Prepares a template and describes its static SQL and runtime slots.
///
/// # Errors
///
/// Returns an error if:
/// - Template or schema files cannot be read
/// - The context cannot be built
/// - The template is malformed or uses unknown placeholders
///
/// # Example
///
/// ```no_run
/// use sql_template::{
///     app::{TemplateParams, run_prepare},
///     cli::{Dialect, Format},
///     config::Config
/// };
///
/// let params = TemplateParams {
///     template_path:    "query.sql".to_string(),
///     table:            Some("items".to_string()),
///     schema_path:      None,
///     columns:          vec!["Id".to_string()],
///     dialect:          Some(Dialect::Postgresql),
///     parameter_prefix: None,
///     output_format:    Format::Json,
///     no_color:         true
/// };
/// let result = run_prepare(&params, &Config::default()).unwrap();
/// println!("{}", result.output);
/// ```
pub fn run_prepare(params: &TemplateParams, config: &Config) -> AppResult<CommandOutput> {
    let template = read_template_input(&params.template_path)?;
    let ctx = build_context(params, config)?;
    let prepared = prepare_cached(&template, &ctx).map_err(|e| template_error(e, &template))?;
    let opts = create_output_options(params.output_format, params.no_color);
    Ok(CommandOutput::success(format_prepared(&prepared, &opts)))
}

/// Renders a template with runtime parameters.
///
/// Batch templates are split into several statements when the batch
/// argument exceeds `--max-batch-size` or the dialect's parameter limit.
///
/// # Errors
///
/// Returns an error if:
/// - Any input cannot be read or parsed
/// - A runtime parameter is missing or has the wrong shape
/// - Validation is enabled and the rendered SQL does not parse
pub fn run_render(params: &RenderParams, config: &Config) -> AppResult<CommandOutput> {
    let template = read_template_input(&params.template.template_path)?;
    let ctx = build_context(&params.template, config)?;
    let prepared = prepare_cached(&template, &ctx).map_err(|e| template_error(e, &template))?;
    let parameters = load_parameters(params.params.as_deref())?;

    let options = BatchOptions {
        max_batch_size: params.max_batch_size.or(config.render.max_batch_size)
    };
    let statements = render_batches(&prepared, &parameters, options)
        .map_err(|e| template_error(e, &template))?;
    debug!(statements = statements.len(), "rendered template");

    if params.validate || config.render.validate {
        for statement in &statements {
            validate_sql(&statement.sql, ctx.dialect.kind)?;
        }
    }

    let opts = create_output_options(params.template.output_format, params.template.no_color);
    Ok(CommandOutput::success(format_rendered(&statements, &opts)))
}
