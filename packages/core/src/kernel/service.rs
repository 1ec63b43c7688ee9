//! A minimal long-running-process abstraction.
//!
//! The scheduler loop and worker pool are each a `Service`; `ServiceHost`
//! runs a set of them side by side and drives cooperative shutdown on
//! SIGTERM/SIGINT with a hard cap, per spec.md §5's cancellation model.

use std::time::Duration;

use anyhow::Result;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// A long-running process driven by a `ServiceHost`.
///
/// `run` owns `self` so a service can move its internal state into the
/// loop without any interior mutability beyond what it needs for its own
/// concurrency; `shutdown` is the cooperative signal the host cancels
/// once a drain should begin.
#[async_trait::async_trait]
pub trait Service: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()>;
}

/// Hard cap after SIGTERM/SIGINT before the process force-exits,
/// per spec.md §5.
const SHUTDOWN_HARD_CAP: Duration = Duration::from_secs(10);

/// Runs one or more `Service`s concurrently and coordinates their
/// shutdown against OS signals.
pub struct ServiceHost {
    services: Vec<Box<dyn Service>>,
}

impl ServiceHost {
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
        }
    }

    pub fn with_service(mut self, service: impl Service + 'static) -> Self {
        self.services.push(Box::new(service));
        self
    }

    /// Runs every registered service until a shutdown signal arrives,
    /// then gives them `SHUTDOWN_HARD_CAP` to drain before returning.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let shutdown = CancellationToken::new();
        let mut handles = Vec::with_capacity(self.services.len());

        for service in self.services {
            let name = service.name();
            let shutdown = shutdown.clone();
            handles.push((
                name,
                tokio::spawn(async move { service.run(shutdown).await }),
            ));
        }

        wait_for_signal().await;
        info!("shutdown signal received, draining services");
        shutdown.cancel();

        let drain = async {
            for (name, handle) in handles {
                match handle.await {
                    Ok(Ok(())) => info!(service = name, "stopped cleanly"),
                    Ok(Err(e)) => error!(service = name, error = %e, "service exited with error"),
                    Err(e) => error!(service = name, error = %e, "service task panicked"),
                }
            }
        };

        if tokio::time::timeout(SHUTDOWN_HARD_CAP, drain).await.is_err() {
            warn!("shutdown hard cap elapsed, force-exiting");
        }

        Ok(())
    }
}

impl Default for ServiceHost {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to install SIGTERM handler");
            std::future::pending::<()>().await;
            unreachable!()
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
            unreachable!()
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
}
