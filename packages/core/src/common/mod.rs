//! Common types shared across the execution plane.

pub mod entity_ids;
pub mod error;
pub mod id;

pub use entity_ids::*;
pub use error::DialerError;
pub use id::{Id, V4, V7};
