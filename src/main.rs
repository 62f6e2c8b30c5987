use std::sync::Arc;

use anyhow::Context;
use resp_kv::{
    aof::{self, Aof, SYNC_INTERVAL},
    commands::CommandTable,
    connection::ServerContext,
    key_value_store::KeyValueStore,
    server::{self, RedisServer},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = RedisServer::new(std::env::args()).context("invalid command line")?;

    let aof = Arc::new(
        Aof::open(config.aof_path())
            .await
            .context("cannot start without a working append-only file")?,
    );
    let store = Arc::new(KeyValueStore::new());
    let table = Arc::new(CommandTable::new());

    // Replay finishes before the listener exists, so no client write can
    // interleave with it.
    aof::replay(&aof, &table, &*store)
        .await
        .context("failed to replay append-only file")?;

    let sync_task = aof.spawn_sync_task(SYNC_INTERVAL);

    let listener = TcpListener::bind(config.address())
        .await
        .with_context(|| format!("failed to bind {}", config.address()))?;
    info!("Listening on {}", config.address());

    let context = Arc::new(ServerContext::new(
        store,
        table,
        Arc::clone(&aof),
        config.write_commands.clone(),
    ));

    let shutdown = CancellationToken::new();
    let server_task = tokio::spawn(server::serve(listener, context, shutdown.clone()));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutting down");

    shutdown.cancel();
    if let Err(e) = server_task.await {
        error!("Server task failed: {}", e);
    }

    if let Err(e) = sync_task.stop().await {
        error!("{}", e);
    }

    aof.close().await.context("failed to close append-only file")?;

    Ok(())
}
