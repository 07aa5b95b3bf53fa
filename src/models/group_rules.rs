use crate::scoring::{KoRoundMode, PredictionMode, ScoringRules};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Scoring rules for one group. Exactly one row per group; immutable
/// while a settlement run is in flight.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupRules {
    pub group_id: Uuid,
    pub mode: String,    // Stored as TEXT, use PredictionMode enum for type safety
    pub ko_mode: String, // Stored as TEXT, use KoRoundMode enum for type safety
    pub points_exact: i32,
    pub points_difference: i32,
    pub points_outcome: i32,
    pub created_at: NaiveDateTime,
}

impl GroupRules {
    /// Get the prediction mode as an enum
    pub fn mode_enum(&self) -> PredictionMode {
        PredictionMode::from_str(&self.mode).unwrap_or(PredictionMode::CorrectScore)
    }

    /// Get the knockout round mode as an enum.
    ///
    /// An unrecognised mode degrades to `FullTime` so a bad configuration
    /// row still yields a defined score.
    pub fn ko_mode_enum(&self) -> KoRoundMode {
        KoRoundMode::from_str(&self.ko_mode).unwrap_or(KoRoundMode::FullTime)
    }

    /// Collect this row into the plain rules value the scoring module takes
    pub fn scoring_rules(&self) -> ScoringRules {
        ScoringRules {
            mode: self.mode_enum(),
            ko_mode: self.ko_mode_enum(),
            points_exact: self.points_exact,
            points_difference: self.points_difference,
            points_outcome: self.points_outcome,
        }
    }
}
