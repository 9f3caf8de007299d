use colored::Colorize;
use serde::Serialize;

use crate::template::{PreparedTemplate, RenderedSql};

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Text,
            colored: true
        }
    }
}

/// Render result for serialization
#[derive(Debug, Serialize)]
pub struct RenderResult<'a> {
    pub batches:    usize,
    pub statements: &'a [RenderedSql]
}

/// Format a prepared template based on output options
pub fn format_prepared(prepared: &PreparedTemplate, opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(prepared).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(prepared).unwrap_or_default(),
        OutputFormat::Text => format_prepared_text(prepared, opts)
    }
}

/// Format rendered statements based on output options
pub fn format_rendered(statements: &[RenderedSql], opts: &OutputOptions) -> String {
    let result = RenderResult {
        batches: statements.len(),
        statements
    };
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(&result).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(&result).unwrap_or_default(),
        OutputFormat::Text => format_rendered_text(statements, opts)
    }
}

fn heading(text: &str, opts: &OutputOptions) -> String {
    if opts.colored {
        text.cyan().bold().to_string()
    } else {
        text.to_string()
    }
}

fn format_prepared_text(prepared: &PreparedTemplate, opts: &OutputOptions) -> String {
    let mut output = heading(
        &format!("Prepared template ({}):", prepared.dialect().kind),
        opts
    );
    output.push('\n');
    output.push_str(prepared.sql());
    output.push_str("\n\n");

    if prepared.has_dynamic_placeholders() {
        output.push_str(&heading("Runtime slots:", opts));
        output.push('\n');
        for (i, slot) in prepared.slots().iter().enumerate() {
            let marker = format!("{{{{#{}}}}}", i);
            let marker = if opts.colored {
                marker.yellow().to_string()
            } else {
                marker
            };
            output.push_str(&format!(
                "  {} {} <- {}\n",
                marker, slot.kind, slot.parameter_name
            ));
        }
    } else {
        let note = "Static: rendering always returns the SQL above";
        if opts.colored {
            output.push_str(&note.green().to_string());
        } else {
            output.push_str(note);
        }
        output.push('\n');
    }

    if !prepared.parameters().is_empty() {
        output.push('\n');
        output.push_str(&heading("Referenced parameters:", opts));
        output.push('\n');
        for param in prepared.parameters() {
            let name = prepared.dialect().parameter(&param.name);
            match &param.alias {
                Some(alias) => output.push_str(&format!("  {} (property {})\n", name, alias)),
                None => output.push_str(&format!("  {}\n", name))
            }
        }
    }

    output
}

fn format_rendered_text(statements: &[RenderedSql], opts: &OutputOptions) -> String {
    let mut output = String::new();
    for (i, statement) in statements.iter().enumerate() {
        if statements.len() > 1 {
            output.push_str(&heading(
                &format!("-- batch {}/{}", i + 1, statements.len()),
                opts
            ));
            output.push('\n');
        }
        output.push_str(&statement.sql);
        output.push('\n');

        if !statement.parameters.is_empty() {
            output.push_str(&heading("Parameters:", opts));
            output.push('\n');
            for (name, value) in &statement.parameters {
                output.push_str(&format!("  {} = {}\n", name, value));
            }
        }

        if i + 1 < statements.len() {
            output.push('\n');
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{template::Bindings, value::ParamValue};

    fn plain() -> OutputOptions {
        OutputOptions {
            format:  OutputFormat::Text,
            colored: false
        }
    }

    #[test]
    fn test_rendered_text_lists_parameters() {
        let mut parameters = Bindings::new();
        parameters.insert("@ids0".to_string(), ParamValue::Int(1));
        let statements = vec![RenderedSql {
            sql: "SELECT 1 WHERE id IN (@ids0)".to_string(),
            parameters
        }];
        let text = format_rendered(&statements, &plain());
        assert!(text.starts_with("SELECT 1 WHERE id IN (@ids0)\n"));
        assert!(text.contains("  @ids0 = 1"));
        assert!(!text.contains("batch"));
    }

    #[test]
    fn test_rendered_text_numbers_batches() {
        let statement = RenderedSql {
            sql:        "INSERT".to_string(),
            parameters: Bindings::new()
        };
        let text = format_rendered(&[statement.clone(), statement], &plain());
        assert!(text.contains("-- batch 1/2"));
        assert!(text.contains("-- batch 2/2"));
    }
}
