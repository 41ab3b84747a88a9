use anyhow::{Context, Result};
use clap::Args;

use crate::app::prepare_backend;
use crate::models::Config;
use crate::server::{AppState, run_server};

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, short = 'b', help = "Address to listen on (overrides server.bind)")]
    pub bind: Option<String>,
}

pub async fn handle_serve(args: ServeArgs, config: Config, verbose: bool) -> Result<()> {
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    let backend = prepare_backend(&config, verbose).await?;
    tracing::info!(
        documents = backend.stats.files.len(),
        chunks = backend.stats.chunks_created,
        "documents indexed"
    );

    let state = AppState::new(
        config,
        backend.chat,
        backend.retriever,
        backend.stats.chunks_created,
    );

    run_server(state, &bind)
        .await
        .with_context(|| format!("server on {bind} failed"))
}
