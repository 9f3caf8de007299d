//! Lexical scanner for `{{...}}` placeholders.
//!
//! The scanner is purely lexical: it does not know about SQL string literals
//! or comments, so `'{{x}}'` is still a placeholder.

use compact_str::CompactString;
use indexmap::IndexMap;
use smallvec::SmallVec;

use super::token::{OptionValue, PlaceholderKind, PlaceholderToken};
use crate::error::{TemplateError, TemplateResult};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Options that never take a value.
const FLAG_ONLY: [&str; 2] = ["asc", "desc"];

/// Piece of a template: literal text or a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal { text: &'a str, offset: usize },
    Placeholder(PlaceholderToken)
}

/// Lazy iterator over template segments.
///
/// Cloning restarts from the clone point. After the first error the iterator
/// is exhausted.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    template: &'a str,
    pos:      usize,
    done:     bool,
    custom:   Option<&'a IndexMap<CompactString, String>>
}

/// Scan `template` accepting only the built-in placeholder names.
///
/// # Example
///
/// ```
/// use sql_template::template::{Segment, parse};
///
/// let segments: Vec<_> = parse("SELECT {{columns --exclude Id}} FROM {{table}}")
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(segments.len(), 4);
/// assert!(matches!(&segments[1], Segment::Placeholder(t) if t.name == "columns"));
/// ```
pub fn parse(template: &str) -> Segments<'_> {
    Segments {
        template,
        pos: 0,
        done: false,
        custom: None
    }
}

/// Scan `template`, also accepting names registered in `custom`.
pub fn parse_with_custom<'a>(
    template: &'a str,
    custom: &'a IndexMap<CompactString, String>
) -> Segments<'a> {
    Segments {
        template,
        pos: 0,
        done: false,
        custom: Some(custom)
    }
}

impl<'a> Segments<'a> {
    fn fail(&mut self, err: TemplateError) -> Option<TemplateResult<Segment<'a>>> {
        self.done = true;
        Some(Err(err))
    }

    fn placeholder(&mut self, start: usize) -> Option<TemplateResult<Segment<'a>>> {
        let template = self.template;
        let body_start = start + OPEN.len();
        let after = &template[body_start..];
        let Some(close) = after.find(CLOSE) else {
            return self.fail(TemplateError::parse(start, "unterminated placeholder, missing '}}'"));
        };
        let inner = &after[..close];
        if inner.contains(OPEN) {
            return self.fail(TemplateError::parse(start, "'{{' opened again before '}}'"));
        }
        if inner.is_empty() {
            return self.fail(TemplateError::parse(start, "empty placeholder"));
        }
        let end = body_start + close + CLOSE.len();
        self.pos = end;
        match tokenize(inner, start..end, self.custom) {
            Ok(token) => Some(Ok(Segment::Placeholder(token))),
            Err(err) => self.fail(err)
        }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = TemplateResult<Segment<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.template.len() {
            return None;
        }
        let template = self.template;
        let rest = &template[self.pos..];
        match rest.find(OPEN) {
            Some(0) => self.placeholder(self.pos),
            Some(i) => {
                let offset = self.pos;
                self.pos += i;
                Some(Ok(Segment::Literal {
                    text: &rest[..i],
                    offset
                }))
            }
            None => {
                self.done = true;
                Some(Ok(Segment::Literal {
                    text:   rest,
                    offset: self.pos
                }))
            }
        }
    }
}

fn tokenize(
    inner: &str,
    span: std::ops::Range<usize>,
    custom: Option<&IndexMap<CompactString, String>>
) -> TemplateResult<PlaceholderToken> {
    let offset = span.start;
    // Padding is part of the name, so `{{ table }}` never matches `table`.
    let padded = inner.starts_with(char::is_whitespace) || inner.ends_with(char::is_whitespace);
    let mut words = inner.split_whitespace();
    let name = if padded { inner } else { words.next().unwrap_or(inner) };
    let kind = match PlaceholderKind::from_name(name) {
        Some(kind) if !padded => kind,
        _ if !padded && custom.is_some_and(|c| c.contains_key(name)) => PlaceholderKind::Custom,
        _ => {
            return Err(TemplateError::UnknownPlaceholder {
                name: name.to_string(),
                offset
            });
        }
    };

    let mut options = IndexMap::new();
    let mut args = SmallVec::new();
    let mut key: Option<CompactString> = None;
    let mut value: Vec<&str> = Vec::new();
    for word in words {
        if let Some(stripped) = word.strip_prefix("--")
            && !stripped.is_empty()
        {
            if let Some(k) = key.take() {
                options.insert(k, option_value(&value));
            }
            value.clear();
            if FLAG_ONLY.contains(&stripped) {
                options.insert(CompactString::from(stripped), OptionValue::Flag);
            } else {
                key = Some(CompactString::from(stripped));
            }
        } else if key.is_some() {
            value.push(word);
        } else {
            args.push(CompactString::from(word));
        }
    }
    if let Some(k) = key {
        options.insert(k, option_value(&value));
    }

    Ok(PlaceholderToken {
        name: CompactString::from(name),
        kind,
        options,
        args,
        span
    })
}

fn option_value(words: &[&str]) -> OptionValue {
    if words.is_empty() {
        OptionValue::Flag
    } else {
        OptionValue::Value(CompactString::from(words.join(" ")))
    }
}
