use std::{fmt, ops::Range};

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    context::ColumnMeta,
    dialect::{Dialect, SqlDialect},
    value::ParamValue
};

/// Prefixed parameter name -> value, ready to bind to a statement.
pub type Bindings = IndexMap<String, ParamValue>;

/// What a dynamic slot is filled with at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Where,
    Limit,
    Offset,
    Var,
    /// Collection bound into `IN (...)`
    Param,
    OrderBy,
    BatchValues
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Where => write!(f, "where"),
            Self::Limit => write!(f, "limit"),
            Self::Offset => write!(f, "offset"),
            Self::Var => write!(f, "var"),
            Self::Param => write!(f, "param"),
            Self::OrderBy => write!(f, "orderby"),
            Self::BatchValues => write!(f, "batch_values")
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SlotShape {
    Raw,
    /// `standalone` when the template has no offset for the limit to follow
    Limit { standalone: bool },
    Offset,
    Var,
    InList { operand: Option<String>, negated: bool },
    OrderBy { descending: bool, columns: Vec<ColumnMeta> },
    Batch { columns: Vec<ColumnMeta> }
}

/// A runtime value the template still needs, and where it goes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotDescriptor {
    pub kind:           SlotKind,
    pub parameter_name: CompactString,
    #[serde(skip)]
    pub(crate) shape:   SlotShape
}

impl SlotDescriptor {
    pub(crate) fn new(kind: SlotKind, parameter_name: impl Into<CompactString>, shape: SlotShape) -> Self {
        Self {
            kind,
            parameter_name: parameter_name.into(),
            shape
        }
    }

    /// Bound parameters one row of a batch slot produces.
    pub fn columns_per_row(&self) -> usize {
        match &self.shape {
            SlotShape::Batch { columns } => columns.len(),
            _ => 0
        }
    }
}

/// Parameter referenced by the static SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterRef {
    /// Bare name as written after the prefix
    pub name:  CompactString,
    /// Entity property name when the reference names a column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<CompactString>
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Piece {
    Text(Range<usize>),
    Slot(usize)
}

/// Template with every statically known placeholder already substituted.
///
/// Immutable once built; share it behind an `Arc` or cache it per call site.
/// [`sql`](Self::sql) marks each dynamic slot with `{{#n}}` where `n` indexes
/// [`slots`](Self::slots).
#[derive(Debug, Clone, Serialize)]
pub struct PreparedTemplate {
    sql:                      String,
    slots:                    Vec<SlotDescriptor>,
    parameters:               Vec<ParameterRef>,
    has_dynamic_placeholders: bool,
    #[serde(rename = "dialect")]
    dialect_kind:             SqlDialect,
    #[serde(skip)]
    pieces:                   Vec<Piece>,
    #[serde(skip)]
    dialect:                  Dialect
}

impl PreparedTemplate {
    pub(crate) fn new(
        sql: String,
        pieces: Vec<Piece>,
        slots: Vec<SlotDescriptor>,
        parameters: Vec<ParameterRef>,
        dialect: Dialect
    ) -> Self {
        Self {
            has_dynamic_placeholders: !slots.is_empty(),
            sql,
            slots,
            parameters,
            dialect_kind: dialect.kind,
            pieces,
            dialect
        }
    }

    /// Resolved SQL; final output when there are no dynamic slots.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn slots(&self) -> &[SlotDescriptor] {
        &self.slots
    }

    pub fn has_dynamic_placeholders(&self) -> bool {
        self.has_dynamic_placeholders
    }

    pub fn parameters(&self) -> &[ParameterRef] {
        &self.parameters
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// First `batch_values` slot, if any.
    pub fn batch_slot(&self) -> Option<&SlotDescriptor> {
        self.slots.iter().find(|s| s.kind == SlotKind::BatchValues)
    }

    pub(crate) fn pieces(&self) -> &[Piece] {
        &self.pieces
    }
}

/// Final SQL plus the values to bind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSql {
    pub sql:        String,
    pub parameters: Bindings
}
