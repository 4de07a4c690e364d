//! scc-hub CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use scc_hub::cli::commands::{prune, reindex, replay_bundle, serve, submit_parent, Cli, Commands};
use scc_hub::cli::output::output;
use scc_hub::infrastructure::{ConfigLoader, Engine};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConfigLoader::load().context("failed to load configuration")?;
    let _log_guard = scc_hub::infrastructure::logging::init(&config.logging).context("failed to initialize logging")?;

    if matches!(cli.command, Commands::Serve) {
        return serve::handle(config).await;
    }

    let engine = Engine::new(config).await.context("failed to wire engine")?;

    match cli.command {
        Commands::Serve => unreachable!("serve handled above"),
        Commands::SubmitParent { task_code, description } => {
            let result = submit_parent::handle(&engine, task_code, description).await?;
            output(&result, cli.json);
        }
        Commands::ReindexTaskEvidence { task_id, limit } => {
            let result = reindex::handle(&engine, task_id, limit).await?;
            output(&result, cli.json);
        }
        Commands::PruneExecutorActiveRuns => {
            let result = prune::handle(&engine).await?;
            output(&result, cli.json);
        }
        Commands::ReplayBundle { bundle, dispatch } => {
            let result = replay_bundle::handle(&engine, &bundle, dispatch).await?;
            output(&result, cli.json);
        }
    }

    Ok(())
}
