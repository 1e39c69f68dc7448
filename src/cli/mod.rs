//! CLI module for maekawa
//!
//! Provides command-line interface for:
//! - init: Write a default simulation config
//! - simulate: Run a group of processes in-process and audit their entries
//! - quorum: Print grid quorums and check their intersection

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, RoundingArg};
pub use commands::{
    init, quorum, run, run_command, run_simulation, simulate, ProcessSummary, SimulationSummary,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_response;
