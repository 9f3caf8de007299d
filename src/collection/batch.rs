//! Multi-row `VALUES` expansion, chunking and batch accounting.

use std::fmt;

use rayon::prelude::*;
use tracing::debug;

use crate::{
    context::ColumnMeta,
    dialect::Dialect,
    error::{TemplateError, TemplateResult},
    template::{Bindings, PreparedTemplate, RenderedSql, SlotKind, render_parameterized},
    value::{ParamValue, Parameters}
};

/// Chunking limits for [`render_batches`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Rows per statement; `None` or `Some(0)` means no explicit limit
    pub max_batch_size: Option<usize>
}

/// Emit one `(@col_i, ...)` tuple per row, joined by `, `.
///
/// Row `i` binds `@<sql_name>_<i>` to its field looked up by SQL name, then
/// property name; absent fields bind `NULL`. Returns the row count.
///
/// # Errors
///
/// `InvalidParameter` when `value` is not a non-empty list of rows.
pub fn expand_batch_values(
    dialect: &Dialect,
    columns: &[ColumnMeta],
    name: &str,
    value: &ParamValue,
    out: &mut String,
    mut bindings: Option<&mut Bindings>
) -> TemplateResult<usize> {
    let items = batch_items(name, value)?;
    for (i, item) in items.iter().enumerate() {
        if !matches!(item, ParamValue::Row(_)) {
            return Err(TemplateError::invalid_parameter(
                name,
                format!("batch item {} is a {}, expected a row", i, item.type_name())
            ));
        }
        if i > 0 {
            out.push_str(", ");
        }
        out.push('(');
        for (j, column) in columns.iter().enumerate() {
            if j > 0 {
                out.push_str(", ");
            }
            let param = dialect.parameter(&format!("{}_{}", column.sql_name, i));
            out.push_str(&param);
            if let Some(bindings) = bindings.as_deref_mut() {
                let field = item
                    .field(&column.sql_name)
                    .or_else(|| item.field(&column.property_name))
                    .cloned()
                    .unwrap_or(ParamValue::Null);
                bindings.insert(param, field);
            }
        }
        out.push(')');
    }
    Ok(items.len())
}

fn batch_items<'v>(name: &str, value: &'v ParamValue) -> TemplateResult<&'v [ParamValue]> {
    match value {
        ParamValue::List(items) if items.is_empty() => Err(TemplateError::invalid_parameter(
            name,
            "batch is empty, at least one row is required"
        )),
        ParamValue::List(items) => Ok(items),
        other => Err(TemplateError::invalid_parameter(
            name,
            format!("expected a list of rows, found {}", other.type_name())
        ))
    }
}

/// Rows per statement for `template`, honoring the caller's limit, the
/// dialect's row cap and its bound-parameter ceiling.
///
/// Parameters bound outside the batch (`IN` lists sized from `params`,
/// referenced `@names`) are taken off the ceiling before dividing by the
/// columns per row.
pub fn chunk_size(
    template: &PreparedTemplate,
    params: &Parameters,
    options: BatchOptions
) -> usize {
    let dialect = template.dialect();
    let per_row = template
        .batch_slot()
        .map(|slot| slot.columns_per_row())
        .unwrap_or(0)
        .max(1);
    let budget = dialect
        .max_parameters()
        .saturating_sub(reserved_parameters(template, params));
    let mut rows = (budget / per_row).max(1);
    if let Some(cap) = dialect.max_insert_rows() {
        rows = rows.min(cap);
    }
    match options.max_batch_size.filter(|n| *n > 0) {
        Some(limit) => limit.min(rows),
        None => rows
    }
}

/// Bound parameters a rendered statement carries besides its batch rows.
fn reserved_parameters(template: &PreparedTemplate, params: &Parameters) -> usize {
    let in_lists: usize = template
        .slots()
        .iter()
        .filter(|slot| slot.kind == SlotKind::Param)
        .map(|slot| match params.get(slot.parameter_name.as_str()) {
            Some(ParamValue::List(items)) => items.len(),
            Some(_) => 1,
            None => 0
        })
        .sum();
    in_lists + template.parameters().len()
}

/// Render a batch template once per chunk of its `batch_values` argument.
///
/// Row indices restart at zero in every chunk. Templates without a batch slot
/// render as a single statement. Chunks render in parallel; the result keeps
/// chunk order.
///
/// # Errors
///
/// Any render error of any chunk, or `MissingParameter`/`InvalidParameter`
/// for the batch argument itself.
pub fn render_batches(
    template: &PreparedTemplate,
    params: &Parameters,
    options: BatchOptions
) -> TemplateResult<Vec<RenderedSql>> {
    let Some(slot) = template.batch_slot() else {
        return Ok(vec![render_parameterized(template, Some(params))?]);
    };
    let name = slot.parameter_name.as_str();
    let value = params
        .get(name)
        .ok_or_else(|| TemplateError::MissingParameter {
            kind: SlotKind::BatchValues,
            name: name.to_string()
        })?;
    let items = batch_items(name, value)?;
    let size = chunk_size(template, params, options);
    if items.len() <= size {
        return Ok(vec![render_parameterized(template, Some(params))?]);
    }
    debug!(
        rows = items.len(),
        chunk = size,
        batches = items.len().div_ceil(size),
        "splitting batch"
    );
    let shared: Parameters = params
        .iter()
        .filter(|(key, _)| key.as_str() != name)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    items
        .par_chunks(size)
        .map(|chunk| {
            let mut chunk_params = shared.clone();
            chunk_params.insert(name.to_string(), ParamValue::List(chunk.to_vec()));
            render_parameterized(template, Some(&chunk_params))
        })
        .collect()
}

/// Totals over successfully applied batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub batches:       usize,
    pub affected_rows: u64
}

/// A batch failed; everything before it was applied.
#[derive(Debug)]
pub struct BatchFailure<E> {
    /// Zero-based index of the failing batch
    pub batch_index:     usize,
    pub applied_batches: usize,
    pub applied_rows:    u64,
    pub source:          E
}

impl<E: fmt::Display> fmt::Display for BatchFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "batch {} failed after {} batch(es) applied {} row(s): {}",
            self.batch_index, self.applied_batches, self.applied_rows, self.source
        )
    }
}

impl<E> std::error::Error for BatchFailure<E>
where
    E: std::error::Error + 'static
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Run `exec` over `batches` in order, summing affected rows.
///
/// Stops at the first failure and reports what was already applied.
///
/// ```
/// use sql_template::{collection::execute_batches, template::RenderedSql};
///
/// let batches = vec![
///     RenderedSql { sql: "a".into(), parameters: Default::default() },
///     RenderedSql { sql: "b".into(), parameters: Default::default() },
/// ];
/// let report = execute_batches(&batches, |_, _| Ok::<u64, std::io::Error>(3)).unwrap();
/// assert_eq!(report.affected_rows, 6);
/// ```
pub fn execute_batches<E, F>(
    batches: &[RenderedSql],
    mut exec: F
) -> Result<BatchReport, BatchFailure<E>>
where
    F: FnMut(usize, &RenderedSql) -> Result<u64, E>
{
    let mut report = BatchReport::default();
    for (index, batch) in batches.iter().enumerate() {
        match exec(index, batch) {
            Ok(rows) => {
                report.batches += 1;
                report.affected_rows += rows;
            }
            Err(source) => {
                return Err(BatchFailure {
                    batch_index: index,
                    applied_batches: report.batches,
                    applied_rows: report.affected_rows,
                    source
                });
            }
        }
    }
    Ok(report)
}
