//! Top-level `clap` CLI definition and subcommand dispatch.

pub mod prune;
pub mod reindex;
pub mod replay_bundle;
pub mod serve;
pub mod submit_parent;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "scc-hub", about = "Multi-agent task orchestration and A2A messaging hub")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Render command output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Create a new parent task.
    SubmitParent {
        #[arg(long = "id")]
        task_code: String,
        #[arg(long)]
        description: String,
    },
    /// Rebuild the on-disk evidence index for one or more tasks.
    ReindexTaskEvidence {
        #[arg(long)]
        task_id: Option<uuid::Uuid>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Sweep expired leases back to `ready` or `dlq`.
    PruneExecutorActiveRuns,
    /// Replay a bundle of DLQ task IDs.
    ReplayBundle {
        #[arg(long)]
        bundle: std::path::PathBuf,
        #[arg(long)]
        dispatch: bool,
    },
}
