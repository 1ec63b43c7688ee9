mod models;

pub use models::{PhoneNumber, PhoneNumberStatus};
