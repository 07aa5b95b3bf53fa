use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Group lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Draft,
    Active,
    Ended,
}

impl GroupStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(GroupStatus::Draft),
            "active" => Ok(GroupStatus::Active),
            "ended" => Ok(GroupStatus::Ended),
            _ => Err(format!("Invalid group status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Draft => "draft",
            GroupStatus::Active => "active",
            GroupStatus::Ended => "ended",
        }
    }
}

impl From<String> for GroupStatus {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(GroupStatus::Draft)
    }
}

impl From<GroupStatus> for String {
    fn from(status: GroupStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Group model representing a set of users competing on a shared slate
/// of fixtures.
///
/// Status moves `draft` -> `active` -> `ended`, one way only. A group is
/// ended by the settlement engine once every fixture it references has
/// reached a terminal match state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub status: String, // Stored as TEXT, use GroupStatus enum for type safety
    pub created_at: NaiveDateTime,
}

impl Group {
    /// Get status as an enum
    pub fn status_enum(&self) -> GroupStatus {
        GroupStatus::from_str(&self.status).unwrap_or(GroupStatus::Draft)
    }

    /// Check if the group is active
    pub fn is_active(&self) -> bool {
        self.status_enum() == GroupStatus::Active
    }

    /// Check if the group has ended
    pub fn is_ended(&self) -> bool {
        self.status_enum() == GroupStatus::Ended
    }
}
