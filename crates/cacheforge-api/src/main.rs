//! cacheforge CLI entry point.
//!
//! Binary name: `cforge`
//!
//! Parses CLI arguments, loads configuration, opens the experiment store, then
//! dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cacheforge_observe::tracing_setup::{init_tracing, shutdown_tracing};
use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn,cacheforge_core=info",
        1 => "info,cacheforge=debug",
        _ => "trace",
    };
    init_tracing(filter, cli.otel).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "cforge", &mut std::io::stdout());
        return Ok(());
    }

    let result = dispatch(cli).await;
    shutdown_tracing();
    result
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init(cli.config.clone(), cli.database.clone()).await?;

    match cli.command {
        Commands::Run { iterations } => {
            cli::run::run(&state, iterations, cli.json).await?;
        }

        Commands::Prompt {
            workload,
            top,
            generate,
        } => {
            cli::prompt::prompt(&state, &workload, top, generate, cli.json).await?;
        }

        Commands::History { workload, top } => {
            cli::history::history(&state, &workload, top, cli.json).await?;
        }

        Commands::Workloads => {
            cli::workloads::list_workloads(&state, cli.json).await?;
        }

        Commands::Evaluate {
            file,
            name,
            description,
        } => {
            cli::evaluate::evaluate(&state, &file, name, description, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
