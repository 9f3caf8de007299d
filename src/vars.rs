//! Runtime lookups for `{{var --name X}}` placeholders.
//!
//! A [`VarLookup`] supplies variable values at render time. Closures work
//! directly:
//!
//! ```
//! use sql_template::{
//!     context::PlaceholderContext,
//!     dialect::SqlDialect,
//!     template::{prepare, render_with_vars},
//!     value::ParamValue
//! };
//!
//! let ctx = PlaceholderContext::new(SqlDialect::Sqlite.dialect(), "t");
//! let prepared = prepare("SELECT * FROM {{table}} WHERE tenant = {{var --name tenant}}", &ctx).unwrap();
//! let lookup = |name: &str| (name == "tenant").then(|| ParamValue::from(42));
//! let sql = render_with_vars(&prepared, None, &lookup).unwrap();
//! assert_eq!(sql, "SELECT * FROM [t] WHERE tenant = 42");
//! ```
//!
//! [`VarScope`] binds a lookup function to one owning instance and asks it
//! at most once per variable.

use std::{cell::RefCell, collections::HashMap};

use compact_str::CompactString;
use tracing::trace;

use crate::{
    error::TemplateResult,
    template::{PreparedTemplate, RenderedSql, render_parameterized_with_vars, render_with_vars},
    value::{ParamValue, Parameters}
};

/// Source of `var` values.
pub trait VarLookup {
    /// Value of `name`, `None` when unknown.
    fn lookup(&self, name: &str) -> Option<ParamValue>;
}

impl<F> VarLookup for F
where
    F: Fn(&str) -> Option<ParamValue>
{
    fn lookup(&self, name: &str) -> Option<ParamValue> {
        self(name)
    }
}

/// Per-instance variable lookup with a lazily filled memo.
///
/// Each variable is resolved at most once for the lifetime of the scope (or
/// until [`invalidate`](Self::invalidate)). The memo uses a `RefCell`, so a
/// scope is `!Sync`; wrap it in a `Mutex` to share it across threads.
pub struct VarScope<I, F> {
    instance: I,
    resolve:  F,
    memo:     RefCell<HashMap<CompactString, Option<ParamValue>>>
}

impl<I, F> VarScope<I, F>
where
    F: Fn(&I, &str) -> Option<ParamValue>
{
    pub fn new(instance: I, resolve: F) -> Self {
        Self {
            instance,
            resolve,
            memo: RefCell::new(HashMap::new())
        }
    }

    pub fn instance(&self) -> &I {
        &self.instance
    }

    /// Number of variables resolved so far.
    pub fn resolved(&self) -> usize {
        self.memo.borrow().len()
    }

    /// Forget memoized values, e.g. after mutating the instance.
    pub fn invalidate(&mut self) {
        self.memo.get_mut().clear();
    }

    pub fn render(
        &self,
        template: &PreparedTemplate,
        params: Option<&Parameters>
    ) -> TemplateResult<String> {
        render_with_vars(template, params, self)
    }

    pub fn render_parameterized(
        &self,
        template: &PreparedTemplate,
        params: Option<&Parameters>
    ) -> TemplateResult<RenderedSql> {
        render_parameterized_with_vars(template, params, self)
    }
}

impl<I, F> VarLookup for VarScope<I, F>
where
    F: Fn(&I, &str) -> Option<ParamValue>
{
    fn lookup(&self, name: &str) -> Option<ParamValue> {
        let hit = self.memo.borrow().get(name).cloned();
        if let Some(value) = hit {
            return value;
        }
        trace!(variable = name, "resolving var");
        let value = (self.resolve)(&self.instance, name);
        self.memo
            .borrow_mut()
            .insert(CompactString::from(name), value.clone());
        value
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_scope_resolves_each_variable_once() {
        let calls = Cell::new(0);
        let scope = VarScope::new(7_i64, |tenant: &i64, name: &str| {
            calls.set(calls.get() + 1);
            (name == "tenant").then(|| ParamValue::Int(*tenant))
        });
        assert_eq!(scope.lookup("tenant"), Some(ParamValue::Int(7)));
        assert_eq!(scope.lookup("tenant"), Some(ParamValue::Int(7)));
        assert_eq!(scope.lookup("other"), None);
        assert_eq!(scope.lookup("other"), None);
        assert_eq!(calls.get(), 2);
        assert_eq!(scope.resolved(), 2);
    }

    #[test]
    fn test_invalidate_forgets() {
        let mut scope = VarScope::new((), |_: &(), _: &str| Some(ParamValue::Null));
        scope.lookup("a");
        scope.invalidate();
        assert_eq!(scope.resolved(), 0);
    }
}
