pub mod cli;
pub mod source;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;

use cli::Cli;
use common::logger::init_logger;
use consumer::engine::SpreadConsumer;
use consumer::types::ConsumerConfig;
use market::costs::TransmissionCosts;
use store::sqlite_store::SqliteSpreadStore;
use stream::memory::MemoryStream;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger("gridspread");

    let args = Cli::parse();

    let stream = Arc::new(MemoryStream::new());
    let store = Arc::new(SqliteSpreadStore::new(&args.database_url).await?);
    let costs = Arc::new(TransmissionCosts::default_table());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Ctrl-C flips the shutdown signal; source and consumer exit promptly.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    });

    let source_handle = {
        let stream = Arc::clone(&stream);
        let store = Arc::clone(&store);
        let shutdown = shutdown_rx.clone();
        let interval = Duration::from_secs(args.interval_secs);

        tokio::spawn(async move { source::run_source(stream, store, interval, shutdown).await })
    };

    let cfg = ConsumerConfig {
        group: args.group.clone(),
        consumer: args.consumer_name(),
        initial_backoff_ms: 500,
        max_backoff_ms: 30_000,
    };

    let engine = SpreadConsumer::new(cfg, stream, store, costs);
    engine.run_with_backoff(shutdown_rx).await?;

    source_handle.await??;
    Ok(())
}
