//! Worker pool binary entrypoint.

use std::sync::Arc;

use anyhow::{Context, Result};
use dialer_core::kernel::{
    DialerKernel, PgDialerGateway, PostgresDispatchQueue, RedisConcurrencyGate, ServiceHost,
};
use dialer_core::{Config, WorkerPool};
use placer::MockPlacer;
use redis::aio::ConnectionManager;
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

    tracing::info!("starting dialer worker pool");

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

    let redis_client = redis::Client::open(config.redis_url.as_str())
        .context("invalid REDIS_URL")?;
    let redis_conn = ConnectionManager::new(redis_client)
        .await
        .context("failed to connect to redis")?;

    let kernel = DialerKernel::new(pool, redis_conn, Arc::new(MockPlacer::new()));

    let gateway = Arc::new(PgDialerGateway::new(kernel.db_pool.clone()));
    let dispatch_queue = Arc::new(PostgresDispatchQueue::new(
        kernel.db_pool.clone(),
        config.queue_max_retries as i32,
        config.queue_retry_delay,
    ));
    let concurrency_gate = Arc::new(RedisConcurrencyGate::new(kernel.redis.clone()));
    let placer = kernel.placer.clone();

    let worker_pool = WorkerPool::new(
        gateway,
        dispatch_queue,
        concurrency_gate,
        placer,
        config.worker_concurrency,
        config.worker_rate_per_minute,
    );

    ServiceHost::new()
        .with_service(worker_pool)
        .run_until_shutdown()
        .await
}
