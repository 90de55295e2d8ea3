//! CLI command definitions for the `cforge` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod evaluate;
pub mod history;
pub mod prompt;
pub mod run;
pub mod workloads;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use cacheforge_core::prompt::composer::DEFAULT_RETRIEVAL_TOP_N;

/// Search for better cache replacement policies with a code-generation model.
#[derive(Parser)]
#[command(name = "cforge", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log errors only. Command results (tables, reports, JSON) still print.
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (default: {data_dir}/cacheforge.toml).
    #[arg(long, global = true, env = "CACHEFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Experiment database (default: {data_dir}/cacheforge.db).
    #[arg(long, global = true, env = "CACHEFORGE_DATABASE")]
    pub database: Option<PathBuf>,

    /// Export spans to stdout through OpenTelemetry. Not allowed with --json,
    /// which owns stdout.
    #[arg(long, global = true, conflicts_with = "json")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the generate, build, evaluate loop.
    Run {
        /// Override the configured number of iterations.
        #[arg(long, short = 'n')]
        iterations: Option<u32>,
    },

    /// Print the retrieval prompt built from a workload's best policies.
    Prompt {
        /// Workload label (e.g., mcf).
        workload: String,

        /// Number of top policies to include.
        #[arg(long, default_value_t = DEFAULT_RETRIEVAL_TOP_N)]
        top: u32,

        /// Also send the prompt to the generation service and print the answer.
        #[arg(long)]
        generate: bool,
    },

    /// Summarize the best recorded policies for a workload.
    History {
        /// Workload label, or "all" for aggregate scores.
        workload: String,

        /// Number of policies to show.
        #[arg(long, default_value_t = 5)]
        top: u32,
    },

    /// List configured and recorded workloads.
    #[command(alias = "ls")]
    Workloads,

    /// Build and evaluate an existing policy without the generation service.
    Evaluate {
        /// C++ policy source, or a saved model answer in the output format.
        file: PathBuf,

        /// Policy name (default: taken from the answer, or the file stem).
        #[arg(long)]
        name: Option<String>,

        /// Policy description stored with each trial.
        #[arg(long)]
        description: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn prompt_defaults_to_two_policies() {
        let cli = Cli::try_parse_from(["cforge", "prompt", "mcf"]).unwrap();
        match cli.command {
            Commands::Prompt { workload, top, generate } => {
                assert_eq!(workload, "mcf");
                assert_eq!(top, 2);
                assert!(!generate);
            }
            _ => panic!("expected prompt command"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "cforge",
            "run",
            "-n",
            "3",
            "--json",
            "--database",
            "/tmp/x.db",
            "-vv",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(cli.command, Commands::Run { iterations: Some(3) }));
    }

    #[test]
    fn otel_conflicts_with_json() {
        let err = Cli::try_parse_from(["cforge", "--otel", "history", "all", "--json"])
            .err()
            .expect("--otel with --json must be rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

        let cli = Cli::try_parse_from(["cforge", "--otel", "history", "all"]).unwrap();
        assert!(cli.otel);
    }

    #[test]
    fn quiet_only_lowers_logging() {
        let cmd = Cli::command();
        let quiet = cmd
            .get_arguments()
            .find(|a| a.get_id() == "quiet")
            .expect("quiet flag");
        let help = quiet.get_help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("still print"));
        assert!(Cli::try_parse_from(["cforge", "-q", "workloads"]).unwrap().quiet);
    }
}
