//! Integration tests for the pagetype crate

mod cli_commands;
mod config_integration;
mod router_dispatch;
mod site_hooks;
mod store_integration;

pub use test_utils::with_isolated_env;
