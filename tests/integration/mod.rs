//! Integration tests for the ddlgen pipeline

mod cli_commands;
mod config_loading;
mod generation_failures;
mod orders_scenario;
mod provider_dialects;
pub mod test_utils;
