//! Typed ID aliases for every domain entity.

pub use super::id::{Id, V4, V7};

/// Marker type for User entities.
pub struct User;

/// Marker type for PhoneNumber entities.
pub struct PhoneNumber;

/// Marker type for Schedule entities.
pub struct Schedule;

/// Marker type for Campaign entities.
pub struct Campaign;

/// Marker type for Task entities.
pub struct Task;

/// Marker type for CallLog entities.
pub struct CallLog;

pub type UserId = Id<User>;
pub type PhoneNumberId = Id<PhoneNumber>;
pub type ScheduleId = Id<Schedule>;
pub type CampaignId = Id<Campaign>;
pub type TaskId = Id<Task>;
pub type CallLogId = Id<CallLog>;
