//! Infrastructure wiring: the shared kernel handle, the service-host
//! runtime, and the three gateways the scheduler loop and worker pool
//! are built on.

mod concurrency_gate;
mod dialer_kernel;
mod dispatch_queue;
mod gateway;
mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use concurrency_gate::{ConcurrencyGate, ConcurrencySlot, RedisConcurrencyGate};
pub use dialer_kernel::DialerKernel;
pub use dispatch_queue::{DispatchJob, DispatchJobStatus, DispatchQueue, EnqueueResult, PostgresDispatchQueue};
pub use gateway::{DialerGateway, PgDialerGateway};
pub use service::{Service, ServiceHost};
