//! Scheduler loop binary entrypoint.

use std::sync::Arc;

use anyhow::{Context, Result};
use dialer_core::kernel::{PgDialerGateway, PostgresDispatchQueue, ServiceHost};
use dialer_core::{Config, SchedulerLoop};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dialer_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting dialer scheduler");

    let config = Config::from_env().context("failed to load configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let gateway = Arc::new(PgDialerGateway::new(pool.clone()));
    let dispatch_queue = Arc::new(PostgresDispatchQueue::new(
        pool,
        config.queue_max_retries as i32,
        config.queue_retry_delay,
    ));

    let scheduler = SchedulerLoop::new(gateway, dispatch_queue, config.scheduler_tick, config.scheduler_batch_size);

    ServiceHost::new()
        .with_service(scheduler)
        .run_until_shutdown()
        .await
}
