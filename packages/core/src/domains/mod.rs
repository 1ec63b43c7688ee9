pub mod call_log;
pub mod campaign;
pub mod phone_number;
pub mod schedule;
pub mod task;
pub mod user;
