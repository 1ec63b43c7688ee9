mod models;

pub use models::{CallLog, CallLogStatus};
