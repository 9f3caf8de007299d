use thiserror::Error;

pub use masterror::{AppError, AppResult};

use crate::template::SlotKind;

/// Errors raised by the template engine itself.
///
/// `Parse`, `UnknownPlaceholder` and `InvalidOption` are raised while
/// preparing a template. `MissingParameter` and `InvalidParameter` are raised
/// while rendering one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TemplateError {
    #[error("malformed placeholder at byte {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("unknown placeholder '{name}' at byte {offset}")]
    UnknownPlaceholder { name: String, offset: usize },

    #[error("invalid option '--{option}' on '{placeholder}' at byte {offset}: {message}")]
    InvalidOption {
        placeholder: String,
        option:      String,
        offset:      usize,
        message:     String
    },

    #[error("missing value for {kind} parameter '{name}'")]
    MissingParameter { kind: SlotKind, name: String },

    #[error("invalid value for parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String }
}

/// Coarse classification of [`TemplateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Configuration,
    MissingParameter,
    InvalidParameter
}

impl TemplateError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Parse { .. } => ErrorCategory::Parse,
            Self::UnknownPlaceholder { .. } | Self::InvalidOption { .. } => {
                ErrorCategory::Configuration
            }
            Self::MissingParameter { .. } => ErrorCategory::MissingParameter,
            Self::InvalidParameter { .. } => ErrorCategory::InvalidParameter
        }
    }

    /// Byte offset into the template, for prepare-time errors.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Parse { offset, .. }
            | Self::UnknownPlaceholder { offset, .. }
            | Self::InvalidOption { offset, .. } => Some(*offset),
            _ => None
        }
    }

    pub(crate) fn parse(offset: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            message: message.into()
        }
    }

    pub(crate) fn invalid_parameter(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name:    name.to_string(),
            message: message.into()
        }
    }
}

pub type TemplateResult<T> = Result<T, TemplateError>;

/// Create file read error
pub fn file_read_error(path: &str, source: std::io::Error) -> AppError {
    AppError::internal(format!("Failed to read file '{}': {}", path, source))
}

/// Create schema parse error with optional position info
pub fn schema_parse_error(message: impl Into<String>) -> AppError {
    let msg = message.into();
    AppError::bad_request(format_sql_error("Schema parse error", &msg))
}

/// Create rendered SQL validation error with optional position info
pub fn rendered_sql_error(message: impl Into<String>) -> AppError {
    let msg = message.into();
    AppError::bad_request(format_sql_error("Rendered SQL is invalid", &msg))
}

/// Create config error
pub fn config_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}

/// Convert an engine error, locating prepare-time errors in `template`.
pub fn template_error(err: TemplateError, template: &str) -> AppError {
    let prefix = match err.category() {
        ErrorCategory::Parse => "Template parse error",
        ErrorCategory::Configuration => "Template configuration error",
        ErrorCategory::MissingParameter => "Missing parameter",
        ErrorCategory::InvalidParameter => "Invalid parameter"
    };
    let message = match err.offset().map(|offset| line_column(template, offset)) {
        Some(pos) => format!(
            "{} at line {}, column {}:\n  {}",
            prefix, pos.line, pos.column, err
        ),
        None => format!("{}:\n  {}", prefix, err)
    };
    AppError::bad_request(message)
}

/// Format SQL error with position highlighting
fn format_sql_error(prefix: &str, message: &str) -> String {
    // sqlparser format: "... at Line: X, Column Y"
    if let Some(pos) = extract_position(message) {
        format!(
            "{} at line {}, column {}:\n  {}",
            prefix, pos.line, pos.column, message
        )
    } else {
        format!("{}:\n  {}", prefix, message)
    }
}

#[derive(Debug, PartialEq, Eq)]
struct SqlPosition {
    line:   usize,
    column: usize
}

fn line_column(text: &str, offset: usize) -> SqlPosition {
    let offset = offset.min(text.len());
    let before = text.get(..offset).unwrap_or(text);
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(newline) => before[newline + 1..].chars().count() + 1,
        None => before.chars().count() + 1
    };
    SqlPosition {
        line,
        column
    }
}

fn extract_position(message: &str) -> Option<SqlPosition> {
    let line_marker = "Line: ";
    let col_marker = ", Column ";

    if let Some(line_start) = message.find(line_marker) {
        let line_num_start = line_start + line_marker.len();
        if let Some(col_start) = message[line_num_start..].find(col_marker) {
            let line_str = &message[line_num_start..line_num_start + col_start];
            let col_num_start = line_num_start + col_start + col_marker.len();

            let col_end = message[col_num_start..]
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(message.len() - col_num_start);

            let col_str = &message[col_num_start..col_num_start + col_end];

            if let (Ok(line), Ok(column)) = (line_str.parse(), col_str.parse()) {
                return Some(SqlPosition {
                    line,
                    column
                });
            }
        }
    }

    None
}
