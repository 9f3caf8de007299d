//! # Templates
//!
//! Two-phase evaluation of SQL templates with `{{...}}` placeholders.
//!
//! [`prepare`] runs once per (template, context) pair. It resolves every
//! placeholder whose SQL is known from the context alone (`table`, `columns`,
//! `values`, `set`, static `orderby`, `limit --count`) and leaves a slot for
//! everything that depends on a per-call value (`where`, `limit --param`,
//! `var`, `batch_values`, `IN (@list)`).
//!
//! [`render`] and [`render_parameterized`] fill those slots. They never mutate
//! the [`PreparedTemplate`], so one prepared template can serve any number of
//! threads.
//!
//! ```
//! use sql_template::{
//!     context::{ColumnMeta, DbType, PlaceholderContext},
//!     dialect::SqlDialect,
//!     template::{prepare, render},
//!     value::{ParamValue, params}
//! };
//!
//! let ctx = PlaceholderContext::new(SqlDialect::Sqlite.dialect(), "items").with_columns([
//!     ColumnMeta::from_property("Id", DbType::Int64, false),
//!     ColumnMeta::from_property("Name", DbType::String, false)
//! ]);
//! let prepared = prepare("SELECT {{columns}} FROM {{table}} {{limit --param n}}", &ctx).unwrap();
//! let sql = render(&prepared, Some(&params([("n", ParamValue::from(5))]))).unwrap();
//! assert_eq!(sql, "SELECT [id], [name] FROM [items] LIMIT 5");
//! ```

mod parse;
mod render;
mod resolve;
mod token;
mod types;

pub use parse::{Segment, Segments, parse, parse_with_custom};
pub use render::{render, render_parameterized, render_parameterized_with_vars, render_with_vars};
pub use resolve::{DEFAULT_BATCH_PARAM, Resolution, resolve};
pub use token::{OptionValue, PlaceholderKind, PlaceholderToken};
pub use types::{
    Bindings, ParameterRef, PreparedTemplate, RenderedSql, SlotDescriptor, SlotKind
};

use tracing::debug;

use self::resolve::{TemplateBuilder, needs_standalone_limit, resolve_in};
use crate::{context::PlaceholderContext, error::TemplateResult};

/// Resolve everything static in `template` against `ctx`.
///
/// # Errors
///
/// `Parse` for malformed placeholders, `UnknownPlaceholder` for names outside
/// the built-in set that are not registered on `ctx`, and `InvalidOption`
/// for missing or malformed options.
pub fn prepare(template: &str, ctx: &PlaceholderContext) -> TemplateResult<PreparedTemplate> {
    let standalone_limit = needs_standalone_limit(template, ctx);
    let mut builder = TemplateBuilder::new(ctx);
    for segment in parse_with_custom(template, &ctx.custom) {
        match segment? {
            Segment::Literal { text, .. } => builder.push_literal(text),
            Segment::Placeholder(token) => match resolve_in(&token, ctx, standalone_limit)? {
                Resolution::Static(sql) if token.kind == PlaceholderKind::Custom => {
                    builder.push_literal(&sql)
                }
                Resolution::Static(sql) => builder.push_fragment(&sql),
                Resolution::Dynamic(slot) => builder.push_slot(slot)
            }
        }
    }
    let prepared = builder.finish();
    debug!(
        table = %ctx.table_name,
        dialect = %ctx.dialect.kind,
        slots = prepared.slots().len(),
        parameters = prepared.parameters().len(),
        "prepared template"
    );
    Ok(prepared)
}
