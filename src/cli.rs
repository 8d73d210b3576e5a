//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; the route table dispatches to the pipeline API.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, GenerateArgs, OutputFormat};
pub use presentation::{
    format_config_json, format_config_text, format_report_json, format_report_text,
    format_units_json, format_units_text,
};
pub use route::RunContext;
