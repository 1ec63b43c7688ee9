//! The outbound voice-call campaign execution plane: the scheduler loop
//! and worker pool that drive call tasks from `pending` to a terminal
//! state, plus the pure schedule evaluator and campaign status
//! aggregator they depend on.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod scheduler_loop;
pub mod worker_pool;

pub use config::Config;
pub use scheduler_loop::SchedulerLoop;
pub use worker_pool::WorkerPool;
