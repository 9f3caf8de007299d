//! Application logic for the SQL Template CLI.
//!
//! This module contains the core application logic separated from the main
//! entry point to enable testing.

mod commands;
mod convert;
mod helpers;
mod types;

pub use commands::{run_prepare, run_render};
pub use convert::{convert_dialect, convert_format};
pub use helpers::{
    build_context, create_output_options, get_effective_dialect, load_parameters,
    read_template_input
};
pub use types::{CommandOutput, RenderParams, TemplateParams};
