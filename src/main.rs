//! # SQL Template
//!
//! Command-line front end for the `sql_template` engine.
//!
//! ```bash
//! # Show what a template resolves to and which runtime slots remain
//! sql-template prepare -t query.sql --table items --columns Id,Name,Status
//!
//! # Render with runtime parameters
//! sql-template render -t query.sql --schema schema.sql \
//!     --params '{"predicate": "status = 1", "n": 10}'
//!
//! # Batch insert, 500 rows per statement, as JSON
//! sql-template render -t insert.sql --schema schema.sql --dialect postgresql \
//!     --params @rows.json --max-batch-size 500 -f json
//! ```
//!
//! Set `RUST_LOG=sql_template=debug` to trace preparation, cache hits and
//! batch splitting on stderr.

use std::{io, process};

use clap::Parser;
use sql_template::{
    app::{RenderParams, run_prepare, run_render},
    cache::configure_cache,
    cli::{Cli, Commands},
    config::Config,
    error::AppResult
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run() -> AppResult<i32> {
    let cli = Cli::parse();
    let config = Config::load()?;
    configure_cache(config.cache.max_entries);

    let result = match cli.command {
        Commands::Prepare {
            template
        } => run_prepare(&template.into(), &config)?,
        Commands::Render {
            template,
            params,
            max_batch_size,
            validate
        } => run_render(
            &RenderParams {
                template: template.into(),
                params,
                max_batch_size,
                validate
            },
            &config
        )?
    };

    println!("{}", result.output);
    Ok(result.exit_code)
}
