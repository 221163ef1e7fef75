use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use gator_core::{scheduler::SchedulerService, storage::Database, AppConfig};

/// Run the aggregator until Ctrl+C
pub async fn run(db: Arc<Database>, config: Arc<AppConfig>, interval: Duration) -> Result<()> {
    let scheduler = SchedulerService::new(db, config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    println!("Collecting feeds every {:?}. Press Ctrl+C to stop.", interval);

    scheduler.run(interval, shutdown_rx).await?;

    println!("Aggregator stopped.");
    Ok(())
}
