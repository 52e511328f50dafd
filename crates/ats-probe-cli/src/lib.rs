//! ATS Probe CLI Library
//!
//! Cucumber runner for the ATS feature files: command-line parsing, the
//! per-scenario world, the step vocabulary and run profiles.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod output;
pub mod runner;
pub mod steps;
pub mod world;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, ProfileArg, RunArgs};
pub use config::{load_suite, CliConfig, ColorChoice, RunProfile, RunSettings, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_step_table, Reporter};
pub use runner::{init_tracing, SuiteRunner};
pub use world::{AtsWorld, WorldSetup};
