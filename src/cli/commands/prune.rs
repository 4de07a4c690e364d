//! `scc-hub prune-executor-active-runs` — sweeps expired leases.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::output::CommandOutput;
use crate::infrastructure::Engine;

#[derive(Debug, Serialize)]
pub struct PruneOutput {
    pub swept: u32,
}

impl CommandOutput for PruneOutput {
    fn to_human(&self) -> String {
        format!("swept {} expired lease(s)", self.swept)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn handle(engine: &Engine) -> Result<PruneOutput> {
    let swept = engine.lease_manager.sweep_once().await.context("failed to sweep expired leases")?;
    Ok(PruneOutput { swept })
}
