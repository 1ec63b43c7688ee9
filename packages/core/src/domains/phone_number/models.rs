use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{PhoneNumberId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "phone_number_status", rename_all = "snake_case")]
pub enum PhoneNumberStatus {
    #[default]
    Valid,
    Invalid,
    DoNotCall,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PhoneNumber {
    pub id: PhoneNumberId,
    pub user_id: UserId,
    pub number: String,
    pub status: PhoneNumberStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
