//! Render-time slot filling.

use tracing::trace;

use super::{
    resolve::order_by_clause,
    types::{Bindings, Piece, PreparedTemplate, RenderedSql, SlotDescriptor, SlotShape}
};
use crate::{
    collection::{expand_batch_values, expand_in_list},
    error::{TemplateError, TemplateResult},
    value::{ParamValue, Parameters},
    vars::VarLookup
};

/// Render final SQL.
///
/// A template without dynamic slots returns its static SQL and ignores
/// `params` entirely, `None` included.
///
/// # Errors
///
/// `MissingParameter` when a slot has no value, `InvalidParameter` when the
/// value has the wrong shape.
pub fn render(template: &PreparedTemplate, params: Option<&Parameters>) -> TemplateResult<String> {
    if !template.has_dynamic_placeholders() {
        return Ok(template.sql().to_string());
    }
    Renderer::new(template, params, None).run(None)
}

/// [`render`], resolving `var` slots through `vars` before `params`.
pub fn render_with_vars(
    template: &PreparedTemplate,
    params: Option<&Parameters>,
    vars: &dyn VarLookup
) -> TemplateResult<String> {
    if !template.has_dynamic_placeholders() {
        return Ok(template.sql().to_string());
    }
    Renderer::new(template, params, Some(vars)).run(None)
}

/// Render SQL plus the prefixed parameter map to bind it with.
///
/// Bindings hold every generated IN/batch parameter and every referenced
/// parameter found in `params` (by name, then by column property name).
pub fn render_parameterized(
    template: &PreparedTemplate,
    params: Option<&Parameters>
) -> TemplateResult<RenderedSql> {
    Renderer::new(template, params, None).run_parameterized()
}

/// [`render_parameterized`] with a `var` lookup.
pub fn render_parameterized_with_vars(
    template: &PreparedTemplate,
    params: Option<&Parameters>,
    vars: &dyn VarLookup
) -> TemplateResult<RenderedSql> {
    Renderer::new(template, params, Some(vars)).run_parameterized()
}

struct Renderer<'a> {
    template: &'a PreparedTemplate,
    params:   Option<&'a Parameters>,
    vars:     Option<&'a dyn VarLookup>
}

impl<'a> Renderer<'a> {
    fn new(
        template: &'a PreparedTemplate,
        params: Option<&'a Parameters>,
        vars: Option<&'a dyn VarLookup>
    ) -> Self {
        Self {
            template,
            params,
            vars
        }
    }

    fn run_parameterized(&self) -> TemplateResult<RenderedSql> {
        let mut parameters = Bindings::new();
        let sql = if self.template.has_dynamic_placeholders() {
            self.run(Some(&mut parameters))?
        } else {
            self.template.sql().to_string()
        };
        self.bind_references(&mut parameters);
        Ok(RenderedSql { sql, parameters })
    }

    fn run(&self, mut bindings: Option<&mut Bindings>) -> TemplateResult<String> {
        trace!(
            slots = self.template.slots().len(),
            dialect = %self.template.dialect().kind,
            "rendering template"
        );
        let sql = self.template.sql();
        let mut out = String::with_capacity(sql.len());
        for piece in self.template.pieces() {
            match piece {
                Piece::Text(range) => out.push_str(&sql[range.clone()]),
                Piece::Slot(index) => {
                    let slot = &self.template.slots()[*index];
                    self.fill(slot, &mut out, bindings.as_deref_mut())?;
                }
            }
        }
        Ok(out)
    }

    fn fill(
        &self,
        slot: &SlotDescriptor,
        out: &mut String,
        bindings: Option<&mut Bindings>
    ) -> TemplateResult<()> {
        let dialect = self.template.dialect();
        let name = slot.parameter_name.as_str();
        match &slot.shape {
            SlotShape::Raw => out.push_str(&scalar_text(name, self.required(slot)?)?),
            SlotShape::Var => {
                let value = match self.vars.and_then(|vars| vars.lookup(name)) {
                    Some(value) => value,
                    None => self.required(slot)?.clone()
                };
                out.push_str(&scalar_text(name, &value)?);
            }
            SlotShape::Limit { standalone } => {
                if let Some(count) = numeric_text(name, self.required(slot)?)? {
                    let clause = if *standalone {
                        dialect.standalone_limit_clause(&count)
                    } else {
                        dialect.limit_clause(&count)
                    };
                    out.push_str(&clause);
                }
            }
            SlotShape::Offset => {
                if let Some(count) = numeric_text(name, self.required(slot)?)? {
                    out.push_str(&dialect.offset_clause(&count));
                }
            }
            SlotShape::InList { operand, negated } => {
                let value = self.required(slot)?;
                expand_in_list(
                    dialect,
                    operand.as_deref(),
                    *negated,
                    name,
                    value,
                    out,
                    bindings
                );
            }
            SlotShape::OrderBy {
                descending,
                columns
            } => {
                let requested = scalar_text(name, self.required(slot)?)?;
                let requested = requested.trim();
                if requested.is_empty() {
                    return Ok(());
                }
                let column = columns
                    .iter()
                    .find(|c| c.matches(requested))
                    .ok_or_else(|| {
                        TemplateError::invalid_parameter(
                            name,
                            format!("'{}' is not a column of this table", requested)
                        )
                    })?;
                out.push_str(&order_by_clause(
                    dialect,
                    &[column.sql_name.to_string()],
                    *descending
                ));
            }
            SlotShape::Batch { columns } => {
                let value = self.required(slot)?;
                expand_batch_values(dialect, columns, name, value, out, bindings)?;
            }
        }
        Ok(())
    }

    fn required(&self, slot: &SlotDescriptor) -> TemplateResult<&'a ParamValue> {
        self.params
            .and_then(|params| params.get(slot.parameter_name.as_str()))
            .ok_or_else(|| TemplateError::MissingParameter {
                kind: slot.kind,
                name: slot.parameter_name.to_string()
            })
    }

    fn bind_references(&self, bindings: &mut Bindings) {
        let Some(params) = self.params else {
            return;
        };
        let dialect = self.template.dialect();
        for reference in self.template.parameters() {
            let key = dialect.parameter(&reference.name);
            if bindings.contains_key(&key) {
                continue;
            }
            let value = params.get(reference.name.as_str()).or_else(|| {
                reference
                    .alias
                    .as_ref()
                    .and_then(|alias| params.get(alias.as_str()))
            });
            if let Some(value) = value {
                bindings.insert(key, value.clone());
            }
        }
    }
}

/// Raw SQL text of a scalar; `NULL` renders as nothing.
fn scalar_text(name: &str, value: &ParamValue) -> TemplateResult<String> {
    match value {
        ParamValue::Null => Ok(String::new()),
        ParamValue::List(_) | ParamValue::Row(_) => Err(TemplateError::invalid_parameter(
            name,
            format!("expected a scalar, found {}", value.type_name())
        )),
        other => Ok(other.to_string())
    }
}

/// Decimal text for paging, `None` when the clause should disappear.
fn numeric_text(name: &str, value: &ParamValue) -> TemplateResult<Option<String>> {
    match value {
        ParamValue::Null => Ok(None),
        ParamValue::Int(n) => Ok(Some(n.to_string())),
        ParamValue::Float(x) => Ok(Some(x.to_string())),
        ParamValue::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                Ok(None)
            } else if text.parse::<i64>().is_ok() || text.parse::<f64>().is_ok() {
                Ok(Some(text.to_string()))
            } else {
                Err(TemplateError::invalid_parameter(
                    name,
                    format!("'{}' is not a number", text)
                ))
            }
        }
        other => Err(TemplateError::invalid_parameter(
            name,
            format!("expected a number, found {}", other.type_name())
        ))
    }
}
