//! CLI argument definitions using clap
//!
//! Commands:
//! - maekawa init --config <path>
//! - maekawa simulate [--config <path>]
//! - maekawa quorum --size <n> [--index <i>] [--rounding floor|ceil]

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::quorum::GridRounding;

/// maekawa - quorum-based distributed mutual exclusion
#[derive(Parser, Debug)]
#[command(name = "maekawa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration file
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./maekawa.json")]
        config: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Run a simulated group and write the audit trail
    Simulate {
        /// Path to configuration file; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the number of processes
        #[arg(long)]
        members: Option<usize>,

        /// Override the run time in seconds
        #[arg(long)]
        duration_secs: Option<u64>,
    },

    /// Print quorums for a group size
    Quorum {
        /// Group size
        #[arg(long)]
        size: usize,

        /// Only this index
        #[arg(long)]
        index: Option<usize>,

        #[arg(long, value_enum, default_value_t = RoundingArg::Floor)]
        rounding: RoundingArg,
    },
}

/// Grid side rounding accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoundingArg {
    Floor,
    Ceil,
}

impl From<RoundingArg> for GridRounding {
    fn from(arg: RoundingArg) -> Self {
        match arg {
            RoundingArg::Floor => GridRounding::Floor,
            RoundingArg::Ceil => GridRounding::Ceil,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quorum() {
        let cli = Cli::try_parse_from(["maekawa", "quorum", "--size", "9", "--rounding", "ceil"]).unwrap();
        match cli.command {
            Command::Quorum { size, index, rounding } => {
                assert_eq!(size, 9);
                assert_eq!(index, None);
                assert_eq!(GridRounding::from(rounding), GridRounding::Ceil);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_parse_simulate_overrides() {
        let cli = Cli::try_parse_from([
            "maekawa",
            "--log-level",
            "debug",
            "simulate",
            "--members",
            "6",
            "--duration-secs",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Command::Simulate { config, members, duration_secs } => {
                assert_eq!(config, None);
                assert_eq!(members, Some(6));
                assert_eq!(duration_secs, Some(2));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_init_default_path() {
        let cli = Cli::try_parse_from(["maekawa", "init"]).unwrap();
        match cli.command {
            Command::Init { config, force } => {
                assert_eq!(config, PathBuf::from("./maekawa.json"));
                assert!(!force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_quorum_requires_size() {
        assert!(Cli::try_parse_from(["maekawa", "quorum"]).is_err());
    }
}
