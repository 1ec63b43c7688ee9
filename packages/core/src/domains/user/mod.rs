mod models;

pub use models::User;
