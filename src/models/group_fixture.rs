use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Membership row linking a fixture into a group's slate.
///
/// Predictions reference this row rather than the fixture directly, so a
/// fixture shared by several groups settles independently per group.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupFixture {
    pub id: Uuid,
    pub group_id: Uuid,
    pub fixture_id: Uuid,
    pub created_at: NaiveDateTime,
}
