//! Application configuration loaded from environment variables.

use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub port: u16,

    /// Infrastructure-level dispatch queue retry ceiling (`BULLMQ_MAX_RETRIES`).
    pub queue_max_retries: u32,
    /// Base delay for the dispatch queue's exponential backoff (`BULLMQ_RETRY_DELAY`).
    pub queue_retry_delay: Duration,

    /// Scheduler loop tick period.
    pub scheduler_tick: Duration,
    /// Max tasks claimed per scheduler tick.
    pub scheduler_batch_size: i64,

    /// Max concurrent in-flight tasks per worker-pool host.
    pub worker_concurrency: usize,
    /// Per-host dequeue rate cap (calls placed per minute).
    pub worker_rate_per_minute: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            queue_max_retries: env::var("BULLMQ_MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .context("BULLMQ_MAX_RETRIES must be a valid number")?,
            queue_retry_delay: Duration::from_millis(
                env::var("BULLMQ_RETRY_DELAY")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .context("BULLMQ_RETRY_DELAY must be a valid number")?,
            ),
            scheduler_tick: Duration::from_secs(
                env::var("SCHEDULER_TICK_SECONDS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .context("SCHEDULER_TICK_SECONDS must be a valid number")?,
            ),
            scheduler_batch_size: env::var("SCHEDULER_BATCH_SIZE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .context("SCHEDULER_BATCH_SIZE must be a valid number")?,
            worker_concurrency: env::var("WORKER_CONCURRENCY")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .context("WORKER_CONCURRENCY must be a valid number")?,
            worker_rate_per_minute: env::var("WORKER_RATE_PER_MINUTE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .context("WORKER_RATE_PER_MINUTE must be a valid number")?,
        })
    }
}
