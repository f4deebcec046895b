//! CLI argument definitions using clap
//!
//! Commands:
//! - txreplay list
//! - txreplay validate --scenario <s>
//! - txreplay state --scenario <s> [--mode <mode>] [--step <n>]
//! - txreplay compare --scenario <s> [--step <n>]
//! - txreplay play --scenario <s> [--mode <mode>] [--speed <x>] [--config <path>]
//!
//! `<s>` is a builtin name or a path to a scenario JSON file.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::IsolationMode;

/// txreplay - deterministic transaction replay for isolation-anomaly demos
#[derive(Parser, Debug)]
#[command(name = "txreplay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the builtin scenarios
    List,

    /// Validate a scenario and print its merged operation log
    Validate {
        /// Builtin name or path to a scenario file
        #[arg(long)]
        scenario: String,
    },

    /// Print the simulation state after a number of steps
    State {
        #[arg(long)]
        scenario: String,

        /// Isolation mode (defaults to the scenario's suggested mode)
        #[arg(long)]
        mode: Option<IsolationMode>,

        /// Step to replay to (defaults to the last step)
        #[arg(long)]
        step: Option<usize>,
    },

    /// Replay a scenario under every isolation mode and summarize each
    Compare {
        #[arg(long)]
        scenario: String,

        #[arg(long)]
        step: Option<usize>,
    },

    /// Autoplay a scenario, printing one line per step
    Play {
        #[arg(long)]
        scenario: String,

        #[arg(long)]
        mode: Option<IsolationMode>,

        /// Speed multiplier, clamped to the configured bounds
        #[arg(long)]
        speed: Option<f64>,

        /// Path to a replay configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
