use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// SQL Template Engine - Resolve {{placeholder}} SQL templates per dialect
#[derive(Parser, Debug)]
#[command(name = "sql-template")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve static placeholders and list the remaining runtime slots
    Prepare {
        #[command(flatten)]
        template: TemplateArgs
    },

    /// Render final SQL from a template and runtime parameters
    Render {
        #[command(flatten)]
        template: TemplateArgs,

        /// Runtime parameters as a JSON object (inline, or @path to a file)
        #[arg(short, long)]
        params: Option<String>,

        /// Maximum rows per statement for batch_values templates
        #[arg(long)]
        max_batch_size: Option<usize>,

        /// Parse the rendered SQL with the dialect's parser
        #[arg(long)]
        validate: bool
    }
}

/// Template source and context shared by all commands
#[derive(Args, Debug)]
pub struct TemplateArgs {
    /// Path to the SQL template file (use - for stdin)
    #[arg(short, long)]
    pub template: PathBuf,

    /// Table name; defaults to the only table in --schema
    #[arg(long)]
    pub table: Option<String>,

    /// Path to CREATE TABLE DDL providing the columns
    #[arg(short, long, conflicts_with = "columns")]
    pub schema: Option<PathBuf>,

    /// Entity property names, comma separated (e.g. Id,Name,CreatedAt)
    #[arg(short, long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Target SQL dialect (overrides config)
    #[arg(short, long, value_enum)]
    pub dialect: Option<Dialect>,

    /// Bound-parameter prefix character (e.g. $ for PostgreSQL)
    #[arg(long)]
    pub parameter_prefix: Option<char>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    pub output_format: Format,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Dialect {
    Sqlserver,
    Mysql,
    Postgresql,
    Sqlite,
    Oracle,
    Db2
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Yaml
}
