//! `IN (@ids)` expansion.
//!
//! Detection runs once, at prepare time, over literal template text. The
//! expansion itself runs per render, because only the runtime argument tells
//! how many elements there are.

use std::{ops::Range, sync::LazyLock};

use regex::Regex;

use crate::{dialect::Dialect, template::Bindings, value::ParamValue};

/// Matches `[<operand>] [NOT] IN (<prefix><name>)`.
/// The prefix class is checked against the dialect after matching.
static IN_LIST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:(?P<operand>[\w.\[\]"`]+)\s+)?\b(?P<keyword>(?P<not>NOT\s+)?IN)\s*\(\s*(?P<prefix>[@:$])(?P<name>[A-Za-z_]\w*)\s*\)"#
    )
    .expect("valid regex")
});

/// Words after which a bare operand starts its own predicate.
const PREDICATE_STARTERS: [&str; 7] = ["WHERE", "AND", "OR", "ON", "NOT", "WHEN", "HAVING"];

/// One `IN (...)` predicate found in literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InListMatch<'a> {
    /// Byte range replaced by the slot: the operand when one was captured,
    /// otherwise `[NOT] IN (...)` alone
    pub range:   Range<usize>,
    /// Bare operand that can be dropped together with an empty list
    pub operand: Option<&'a str>,
    pub negated: bool,
    pub name:    &'a str
}

pub(crate) fn find_in_lists(text: &str, prefix: char) -> Vec<InListMatch<'_>> {
    IN_LIST_REGEX
        .captures_iter(text)
        .filter_map(|caps| {
            if !caps.name("prefix")?.as_str().starts_with(prefix) {
                return None;
            }
            let whole = caps.get(0)?;
            let keyword = caps.name("keyword")?;
            let mut negated = caps.name("not").is_some();
            let mut start = keyword.start();
            let mut operand = None;
            if let Some(found) = caps.name("operand") {
                if found.as_str().eq_ignore_ascii_case("NOT") {
                    // `f(x) NOT IN (...)`
                    negated = true;
                    start = found.start();
                } else if starts_predicate(&text[..found.start()]) {
                    operand = Some(found.as_str());
                    start = found.start();
                }
            }
            Some(InListMatch {
                range: start..whole.end(),
                operand,
                negated,
                name: caps.name("name")?.as_str()
            })
        })
        .collect()
}

/// Whether an operand preceded by `before` is the whole left-hand side.
fn starts_predicate(before: &str) -> bool {
    if !before.ends_with(|c: char| c.is_whitespace() || c == '(') {
        return false;
    }
    let before = before.trim_end();
    if before.ends_with('(') {
        return true;
    }
    let word = before
        .rsplit(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or_default();
    PREDICATE_STARTERS
        .iter()
        .any(|starter| starter.eq_ignore_ascii_case(word))
}

/// Render one `IN` predicate for `value`.
///
/// A list becomes `@name0, @name1, ...`; anything else, text included, stays
/// a single bound parameter. An empty list never renders `IN ()`: with a
/// bare `operand` the whole predicate collapses to `1=0` (`1=1` for
/// `NOT IN`), otherwise the list becomes a subquery returning no rows.
///
/// ```
/// use sql_template::{collection::expand_in_list, dialect::SqlDialect, value::ParamValue};
///
/// let dialect = SqlDialect::Sqlite.dialect();
/// let mut sql = String::new();
/// let ids = ParamValue::from(vec![7, 8]);
/// expand_in_list(&dialect, Some("id"), false, "ids", &ids, &mut sql, None);
/// assert_eq!(sql, "id IN (@ids0, @ids1)");
///
/// sql.clear();
/// expand_in_list(&dialect, None, false, "ids", &ParamValue::List(vec![]), &mut sql, None);
/// assert_eq!(sql, "IN (SELECT 1 WHERE 1=0)");
/// ```
pub fn expand_in_list(
    dialect: &Dialect,
    operand: Option<&str>,
    negated: bool,
    name: &str,
    value: &ParamValue,
    out: &mut String,
    mut bindings: Option<&mut Bindings>
) {
    let keyword = if negated { "NOT IN" } else { "IN" };
    if matches!(value, ParamValue::List(items) if items.is_empty()) {
        match operand {
            Some(_) => out.push_str(if negated { "1=1" } else { "1=0" }),
            None => {
                out.push_str(keyword);
                out.push_str(" (");
                out.push_str(dialect.empty_subquery());
                out.push(')');
            }
        }
        return;
    }
    if let Some(operand) = operand {
        out.push_str(operand);
        out.push(' ');
    }
    out.push_str(keyword);
    out.push_str(" (");
    match value {
        ParamValue::List(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let param = dialect.parameter(&format!("{}{}", name, i));
                out.push_str(&param);
                if let Some(bindings) = bindings.as_deref_mut() {
                    bindings.insert(param, item.clone());
                }
            }
        }
        scalar => {
            let param = dialect.parameter(name);
            out.push_str(&param);
            if let Some(bindings) = bindings {
                bindings.insert(param, scalar.clone());
            }
        }
    }
    out.push(')');
}
