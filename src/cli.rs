//! CLI domain: parse, route, output, and presentation only.
//! No page type logic; single route table dispatches to the site.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use route::RunContext;
