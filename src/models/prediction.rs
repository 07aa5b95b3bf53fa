use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Prediction model representing a user's guess for one fixture within
/// one group.
///
/// Created while the fixture has not started (enforced upstream), then
/// mutated exactly once by the settlement engine. `settled_at` is the
/// idempotence marker: a non-null value means the row is never re-scored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Prediction {
    pub id: Uuid,
    pub group_id: Uuid,
    pub group_fixture_id: Uuid,
    pub user_id: Uuid,
    /// Guessed score as a "home:away" pair, e.g. "2:1"
    pub guess: String,
    pub points: i32,
    pub exact_hit: bool,
    pub tendency_hit: bool,
    pub settled_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Prediction {
    /// Check if the prediction has been settled
    pub fn is_settled(&self) -> bool {
        self.settled_at.is_some()
    }
}
