mod models;

pub use models::{ClaimedTask, Task, TaskStatus};
