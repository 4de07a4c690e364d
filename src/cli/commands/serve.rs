//! `scc-hub serve` — starts the HTTP gateway.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::models::Config;
use crate::infrastructure::Engine;

pub async fn handle(config: Config) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let engine = Arc::new(Engine::new(config).await.context("failed to wire engine")?);
    let router = crate::gateway::build_router(engine);

    info!(%addr, "gateway listening");
    let listener = tokio::net::TcpListener::bind(&addr).await.context("failed to bind gateway address")?;
    axum::serve(listener, router).await.context("gateway server error")?;
    Ok(())
}
