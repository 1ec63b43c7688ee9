use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::UserId;

/// The parent entity for every other row. Owned by the (out-of-scope)
/// HTTP CRUD surface; the execution plane only ever reads `user_id`
/// foreign keys off of it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
