use crate::scoring::{FixtureScores, ScorePair};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Match state reported by the result provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    Scheduled,
    InPlay,
    Finished,
    Cancelled,
    Interrupted,
}

impl MatchState {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "scheduled" => Ok(MatchState::Scheduled),
            "in_play" => Ok(MatchState::InPlay),
            "finished" => Ok(MatchState::Finished),
            "cancelled" => Ok(MatchState::Cancelled),
            "interrupted" => Ok(MatchState::Interrupted),
            _ => Err(format!("Invalid match state: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchState::Scheduled => "scheduled",
            MatchState::InPlay => "in_play",
            MatchState::Finished => "finished",
            MatchState::Cancelled => "cancelled",
            MatchState::Interrupted => "interrupted",
        }
    }

    /// Terminal states close out a fixture for good: the match either
    /// produced a result or will never produce one.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MatchState::Finished | MatchState::Cancelled | MatchState::Interrupted
        )
    }
}

impl From<String> for MatchState {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(MatchState::Scheduled)
    }
}

impl From<MatchState> for String {
    fn from(state: MatchState) -> Self {
        state.as_str().to_string()
    }
}

/// Fixture model representing a single scheduled match.
///
/// Result fields are owned by the provider ingestion pipeline and are
/// read-only to the settlement engine.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Fixture {
    pub id: Uuid,
    pub home_team: String,
    pub away_team: String,
    pub kickoff_at: Option<NaiveDateTime>,
    pub state: String, // Stored as TEXT, use MatchState enum for type safety
    pub full_time_home: Option<i32>,
    pub full_time_away: Option<i32>,
    pub extra_time_home: Option<i32>,
    pub extra_time_away: Option<i32>,
    pub penalties_home: Option<i32>,
    pub penalties_away: Option<i32>,
    /// Freeform provider result string, e.g. "2:1 (1:1)". Parsed as a
    /// fallback when the structured full-time columns are null.
    pub result_text: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Fixture {
    /// Get state as an enum
    pub fn state_enum(&self) -> MatchState {
        MatchState::from_str(&self.state).unwrap_or(MatchState::Scheduled)
    }

    /// Check if the match has finished
    pub fn is_finished(&self) -> bool {
        self.state_enum() == MatchState::Finished
    }

    /// Check if the match has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.state_enum().is_terminal()
    }

    /// Collect the result fields into the payload the scoring module
    /// operates on.
    pub fn scores(&self) -> FixtureScores {
        FixtureScores {
            finished: self.is_finished(),
            full_time: score_pair(self.full_time_home, self.full_time_away),
            extra_time: score_pair(self.extra_time_home, self.extra_time_away),
            penalties: score_pair(self.penalties_home, self.penalties_away),
            result_text: self.result_text.clone(),
        }
    }
}

fn score_pair(home: Option<i32>, away: Option<i32>) -> Option<ScorePair> {
    match (home, away) {
        (Some(home), Some(away)) => Some(ScorePair::new(home, away)),
        _ => None,
    }
}
