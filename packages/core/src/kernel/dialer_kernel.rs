//! Holds the infrastructure handles every service needs, threaded
//! through constructors rather than reached via a process-wide
//! singleton — the redesign spec.md §9 calls for in place of the
//! source's module-level repository state.

use std::sync::Arc;

use redis::aio::ConnectionManager;
use sqlx::PgPool;

use placer::Placer;

/// Shared infrastructure handle passed to every gateway, gate, and
/// service constructor in the execution plane.
#[derive(Clone)]
pub struct DialerKernel {
    pub db_pool: PgPool,
    pub redis: ConnectionManager,
    pub placer: Arc<dyn Placer>,
}

impl DialerKernel {
    pub fn new(db_pool: PgPool, redis: ConnectionManager, placer: Arc<dyn Placer>) -> Self {
        Self {
            db_pool,
            redis,
            placer,
        }
    }
}
