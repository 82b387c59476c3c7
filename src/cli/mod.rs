//! CLI module
//!
//! Command-line interface for running loads.
//!
//! # Commands
//!
//! - `load` - Load crosswalks and dataset files for a run matrix
//! - `xwalk` - Load only the crosswalk tables

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{parse_years, read_states_file, resolve_states, Runner};
