//! Placeholder resolution and prepared-template assembly.

use std::sync::LazyLock;

use compact_str::CompactString;
use regex::Regex;

use super::{
    parse::{Segment, parse_with_custom},
    token::{PlaceholderKind, PlaceholderToken},
    types::{ParameterRef, Piece, PreparedTemplate, SlotDescriptor, SlotKind, SlotShape}
};
use crate::{
    collection::find_in_lists,
    context::{ColumnFilter, PlaceholderContext},
    dialect::Dialect,
    error::{TemplateError, TemplateResult}
};

/// Default runtime argument name for `{{batch_values}}`.
pub const DEFAULT_BATCH_PARAM: &str = "items";

static PARAM_REF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([@:$])([A-Za-z_]\w*)").expect("valid regex"));

static OFFSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bOFFSET\b").expect("valid regex"));

/// What one placeholder turns into.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// SQL known at prepare time
    Static(String),
    /// Filled per render
    Dynamic(SlotDescriptor)
}

/// Resolve one placeholder against `ctx`.
///
/// A `limit` resolved on its own is taken to be the statement's only paging
/// clause, so dialects that need an offset before `FETCH` get `OFFSET 0`.
///
/// # Errors
///
/// `InvalidOption` when a required option is missing or malformed.
pub fn resolve(token: &PlaceholderToken, ctx: &PlaceholderContext) -> TemplateResult<Resolution> {
    resolve_in(token, ctx, ctx.dialect.limit_needs_offset())
}

/// [`resolve`] for a token of a template whose `limit` stands alone
/// (`standalone_limit`) or follows an offset.
pub(crate) fn resolve_in(
    token: &PlaceholderToken,
    ctx: &PlaceholderContext,
    standalone_limit: bool
) -> TemplateResult<Resolution> {
    let dialect = &ctx.dialect;
    match token.kind {
        PlaceholderKind::Table => Ok(Resolution::Static(dialect.quote_ident(&ctx.table_name))),
        PlaceholderKind::Columns => {
            let columns = ctx.filter_columns(&column_filter(token));
            let quoted: Vec<String> = columns
                .iter()
                .map(|c| dialect.quote_ident(&c.sql_name))
                .collect();
            Ok(Resolution::Static(quoted.join(", ")))
        }
        PlaceholderKind::Values => {
            let batch_name = token
                .value("param")
                .or_else(|| token.first_arg())
                .map(|name| strip_prefix(name, dialect.parameter_prefix));
            if let Some(name) = batch_name {
                return Ok(Resolution::Dynamic(batch_slot(token, ctx, name)));
            }
            let params: Vec<String> = ctx
                .filter_columns(&column_filter(token))
                .iter()
                .map(|c| dialect.parameter(&c.sql_name))
                .collect();
            Ok(Resolution::Static(format!("({})", params.join(", "))))
        }
        PlaceholderKind::BatchValues => {
            let name = token
                .value("param")
                .or_else(|| token.first_arg())
                .map_or(DEFAULT_BATCH_PARAM, |name| {
                    strip_prefix(name, dialect.parameter_prefix)
                });
            Ok(Resolution::Dynamic(batch_slot(token, ctx, name)))
        }
        PlaceholderKind::Set => {
            let assignments: Vec<String> = ctx
                .filter_columns(&column_filter(token))
                .iter()
                .map(|c| {
                    format!(
                        "{} = {}",
                        dialect.quote_ident(&c.sql_name),
                        dialect.parameter(&c.sql_name)
                    )
                })
                .collect();
            Ok(Resolution::Static(assignments.join(", ")))
        }
        PlaceholderKind::Where => {
            let name = required_param(token, "where --param <name>")?;
            Ok(Resolution::Dynamic(SlotDescriptor::new(
                SlotKind::Where,
                name,
                SlotShape::Raw
            )))
        }
        PlaceholderKind::OrderBy => resolve_order_by(token, ctx),
        PlaceholderKind::Limit => resolve_paging(token, ctx, SlotKind::Limit, standalone_limit),
        PlaceholderKind::Offset => resolve_paging(token, ctx, SlotKind::Offset, false),
        PlaceholderKind::Var => {
            let name = token
                .value("name")
                .or_else(|| token.first_arg())
                .ok_or_else(|| invalid_option(token, "name", "expected var --name <variable>"))?;
            Ok(Resolution::Dynamic(SlotDescriptor::new(
                SlotKind::Var,
                name,
                SlotShape::Var
            )))
        }
        PlaceholderKind::Custom => ctx
            .custom
            .get(token.name.as_str())
            .map(|sql| Resolution::Static(sql.clone()))
            .ok_or_else(|| TemplateError::UnknownPlaceholder {
                name:   token.name.to_string(),
                offset: token.offset()
            })
    }
}

fn column_filter(token: &PlaceholderToken) -> ColumnFilter {
    ColumnFilter {
        only:    token.list("only"),
        exclude: token.list("exclude").unwrap_or_default()
    }
}

fn batch_slot(token: &PlaceholderToken, ctx: &PlaceholderContext, name: &str) -> SlotDescriptor {
    let columns = ctx
        .filter_columns(&column_filter(token))
        .into_iter()
        .cloned()
        .collect();
    SlotDescriptor::new(SlotKind::BatchValues, name, SlotShape::Batch { columns })
}

fn resolve_order_by(
    token: &PlaceholderToken,
    ctx: &PlaceholderContext
) -> TemplateResult<Resolution> {
    let descending = token.has_option("desc");
    if let Some(name) = token.value("param") {
        return Ok(Resolution::Dynamic(SlotDescriptor::new(
            SlotKind::OrderBy,
            name,
            SlotShape::OrderBy {
                descending,
                columns: ctx.columns.clone()
            }
        )));
    }

    let requested: Vec<CompactString> = match token.list("column") {
        Some(list) if !list.is_empty() => list,
        _ => token.args.iter().take(1).cloned().collect()
    };
    let names: Vec<String> = if requested.is_empty() {
        ctx.columns
            .first()
            .map(|c| c.sql_name.to_string())
            .into_iter()
            .collect()
    } else {
        requested
            .iter()
            .map(|name| {
                ctx.find_column(name)
                    .map(|c| c.sql_name.to_string())
                    .ok_or_else(|| {
                        invalid_option(
                            token,
                            "column",
                            format!("'{}' is not a column of this table", name)
                        )
                    })
            })
            .collect::<TemplateResult<_>>()?
    };
    if names.is_empty() {
        return Err(invalid_option(
            token,
            "column",
            "no column given and the context has no columns"
        ));
    }
    Ok(Resolution::Static(order_by_clause(&ctx.dialect, &names, descending)))
}

pub(crate) fn order_by_clause(dialect: &Dialect, names: &[String], descending: bool) -> String {
    let direction = if descending { "DESC" } else { "ASC" };
    let terms: Vec<String> = names
        .iter()
        .map(|name| format!("{} {}", dialect.quote_ident(name), direction))
        .collect();
    format!("ORDER BY {}", terms.join(", "))
}

fn resolve_paging(
    token: &PlaceholderToken,
    ctx: &PlaceholderContext,
    kind: SlotKind,
    standalone: bool
) -> TemplateResult<Resolution> {
    let shape = if kind == SlotKind::Limit {
        SlotShape::Limit { standalone }
    } else {
        SlotShape::Offset
    };
    if let Some(name) = token.value("param") {
        return Ok(Resolution::Dynamic(SlotDescriptor::new(kind, name, shape)));
    }
    let Some(count) = token.value("count") else {
        return Err(invalid_option(
            token,
            "param",
            format!("expected {} --param <name> or --count <n>", kind)
        ));
    };
    let count: i64 = count
        .parse()
        .map_err(|_| invalid_option(token, "count", format!("'{}' is not an integer", count)))?;
    let count = count.to_string();
    let clause = match kind {
        SlotKind::Limit if standalone => ctx.dialect.standalone_limit_clause(&count),
        SlotKind::Limit => ctx.dialect.limit_clause(&count),
        _ => ctx.dialect.offset_clause(&count)
    };
    Ok(Resolution::Static(clause))
}

/// Whether a `limit` in `template` would be the only paging clause on a
/// dialect that needs an offset before `FETCH`.
///
/// Offsets count as placeholders, custom fragments or literal text.
pub(crate) fn needs_standalone_limit(template: &str, ctx: &PlaceholderContext) -> bool {
    if !ctx.dialect.limit_needs_offset() {
        return false;
    }
    !parse_with_custom(template, &ctx.custom).any(|segment| match segment {
        Ok(Segment::Literal { text, .. }) => OFFSET_REGEX.is_match(text),
        Ok(Segment::Placeholder(token)) => match token.kind {
            PlaceholderKind::Offset => true,
            PlaceholderKind::Custom => ctx
                .custom
                .get(token.name.as_str())
                .is_some_and(|sql| OFFSET_REGEX.is_match(sql)),
            _ => false
        },
        Err(_) => false
    })
}

fn required_param<'t>(token: &'t PlaceholderToken, usage: &str) -> TemplateResult<&'t str> {
    token
        .value("param")
        .ok_or_else(|| invalid_option(token, "param", format!("expected {}", usage)))
}

fn invalid_option(
    token: &PlaceholderToken,
    option: &str,
    message: impl Into<String>
) -> TemplateError {
    TemplateError::InvalidOption {
        placeholder: token.name.to_string(),
        option:      option.to_string(),
        offset:      token.offset(),
        message:     message.into()
    }
}

fn strip_prefix(name: &str, prefix: char) -> &str {
    name.strip_prefix(prefix).unwrap_or(name)
}

/// Accumulates resolved SQL, render pieces and slots for one template.
pub(crate) struct TemplateBuilder<'c> {
    ctx:        &'c PlaceholderContext,
    sql:        String,
    pieces:     Vec<Piece>,
    slots:      Vec<SlotDescriptor>,
    parameters: Vec<ParameterRef>
}

impl<'c> TemplateBuilder<'c> {
    pub(crate) fn new(ctx: &'c PlaceholderContext) -> Self {
        Self {
            ctx,
            sql: String::new(),
            pieces: Vec::new(),
            slots: Vec::new(),
            parameters: Vec::new()
        }
    }

    /// Template text between placeholders; `IN (@x)` predicates become slots.
    pub(crate) fn push_literal(&mut self, text: &str) {
        let mut last = 0;
        for found in find_in_lists(text, self.ctx.dialect.parameter_prefix) {
            self.push_fragment(&text[last..found.range.start]);
            self.push_slot(SlotDescriptor::new(
                SlotKind::Param,
                found.name,
                SlotShape::InList {
                    operand: found.operand.map(str::to_string),
                    negated: found.negated
                }
            ));
            last = found.range.end;
        }
        self.push_fragment(&text[last..]);
    }

    /// Static SQL, scanned for parameter references.
    pub(crate) fn push_fragment(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.record_references(text);
        let start = self.sql.len();
        self.sql.push_str(text);
        let end = self.sql.len();
        match self.pieces.last_mut() {
            Some(Piece::Text(range)) if range.end == start => range.end = end,
            _ => self.pieces.push(Piece::Text(start..end))
        }
    }

    pub(crate) fn push_slot(&mut self, slot: SlotDescriptor) {
        let index = self.slots.len();
        self.sql.push_str(&format!("{{{{#{}}}}}", index));
        self.pieces.push(Piece::Slot(index));
        self.slots.push(slot);
    }

    fn record_references(&mut self, text: &str) {
        let prefix = self.ctx.dialect.parameter_prefix;
        for caps in PARAM_REF_REGEX.captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            if !whole.as_str().starts_with(prefix) {
                continue;
            }
            // `@@ROWCOUNT`, `a@b`, `x::int`
            if text[..whole.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c == prefix || c.is_alphanumeric() || c == '_')
            {
                continue;
            }
            let name = name.as_str();
            if self.parameters.iter().any(|p| p.name == name) {
                continue;
            }
            let alias = self
                .ctx
                .find_column(name)
                .filter(|c| c.sql_name == name && c.property_name != name)
                .map(|c| c.property_name.clone());
            self.parameters.push(ParameterRef {
                name: CompactString::from(name),
                alias
            });
        }
    }

    pub(crate) fn finish(self) -> PreparedTemplate {
        PreparedTemplate::new(
            self.sql,
            self.pieces,
            self.slots,
            self.parameters,
            self.ctx.dialect
        )
    }
}
