//! # SQL Template
//!
//! Dialect-aware SQL templates with typed `{{placeholders}}`.
//!
//! A template such as
//!
//! ```sql
//! SELECT {{columns --exclude Id}} FROM {{table}}
//! WHERE {{where --param predicate}} {{limit --param n}}
//! ```
//!
//! is prepared once against a [`PlaceholderContext`](context::PlaceholderContext)
//! (dialect, table, ordered column metadata) and rendered many times with
//! per-call parameters. Everything the context determines is resolved at
//! prepare time; only runtime fragments are filled per render.
//!
//! # Modules
//!
//! - [`dialect`] - Quoting, parameter prefix, paging and upsert rules for six databases
//! - [`context`] - Column metadata and the resolution context
//! - [`value`] - Runtime parameter values
//! - [`template`] - Parser, resolver, prepared templates and rendering
//! - [`collection`] - `IN (@list)` and multi-row `VALUES` expansion, batching
//! - [`vars`] - `{{var}}` lookups and the per-instance lookup cache
//! - [`cache`] - Prepared-template cache
//! - [`schema`] - Column metadata from `CREATE TABLE` DDL
//! - [`validate`] - Syntax check of rendered SQL
//! - [`config`] - Configuration loading
//! - [`output`] - Result formatting
//! - [`error`] - Error types and constructors

pub mod app;
pub mod cache;
pub mod cli;
pub mod collection;
pub mod config;
pub mod context;
pub mod dialect;
pub mod error;
pub mod output;
pub mod schema;
pub mod template;
pub mod validate;
pub mod value;
pub mod vars;
