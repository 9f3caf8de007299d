use std::{fmt, ops::Range};

use compact_str::CompactString;
use indexmap::IndexMap;
use smallvec::SmallVec;

/// Placeholder names understood by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    Table,
    Columns,
    Values,
    BatchValues,
    Set,
    Where,
    OrderBy,
    Limit,
    Offset,
    Var,
    /// Registered on the context via `with_custom_placeholder`
    Custom
}

impl PlaceholderKind {
    /// Built-in kind for an exact, case-sensitive name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "table" => Some(Self::Table),
            "columns" => Some(Self::Columns),
            "values" => Some(Self::Values),
            "batch_values" => Some(Self::BatchValues),
            "set" => Some(Self::Set),
            "where" => Some(Self::Where),
            "orderby" => Some(Self::OrderBy),
            "limit" => Some(Self::Limit),
            "offset" => Some(Self::Offset),
            "var" => Some(Self::Var),
            _ => None
        }
    }
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Table => "table",
            Self::Columns => "columns",
            Self::Values => "values",
            Self::BatchValues => "batch_values",
            Self::Set => "set",
            Self::Where => "where",
            Self::OrderBy => "orderby",
            Self::Limit => "limit",
            Self::Offset => "offset",
            Self::Var => "var",
            Self::Custom => "custom"
        };
        write!(f, "{}", name)
    }
}

/// Value of a `--key` option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Flag,
    Value(CompactString)
}

/// One `{{name --opts}}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderToken {
    pub name:    CompactString,
    pub kind:    PlaceholderKind,
    pub options: IndexMap<CompactString, OptionValue>,
    /// Words before the first `--key`
    pub args:    SmallVec<[CompactString; 2]>,
    /// Byte range of the whole `{{...}}` in the template
    pub span:    Range<usize>
}

impl PlaceholderToken {
    pub fn has_option(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    /// Option value, `None` for absent options and bare flags.
    pub fn value(&self, key: &str) -> Option<&str> {
        match self.options.get(key) {
            Some(OptionValue::Value(v)) => Some(v.as_str()),
            _ => None
        }
    }

    /// Comma-separated option value, items trimmed, empty items dropped.
    pub fn list(&self, key: &str) -> Option<Vec<CompactString>> {
        self.value(key).map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(CompactString::from)
                .collect()
        })
    }

    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(CompactString::as_str)
    }

    pub fn offset(&self) -> usize {
        self.span.start
    }
}
