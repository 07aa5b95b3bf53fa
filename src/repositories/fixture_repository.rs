use crate::error::RepositoryError;
use crate::models::{Fixture, MatchState};
use crate::scoring::ScorePair;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for fixture data access.
///
/// Fixture rows are written by the provider ingestion pipeline; the
/// settlement engine only reads them. The write methods exist for that
/// pipeline and for test setup.
pub struct FixtureRepository {
    pool: PgPool,
}

impl FixtureRepository {
    /// Create a new FixtureRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new fixture in the scheduled state
    pub async fn create(
        &self,
        home_team: &str,
        away_team: &str,
        kickoff_at: Option<NaiveDateTime>,
    ) -> Result<Fixture, RepositoryError> {
        let fixture = sqlx::query_as::<_, Fixture>(
            r#"
            INSERT INTO fixtures (home_team, away_team, kickoff_at)
            VALUES ($1, $2, $3)
            RETURNING
                id, home_team, away_team, kickoff_at, state,
                full_time_home, full_time_away,
                extra_time_home, extra_time_away,
                penalties_home, penalties_away,
                result_text, created_at, updated_at
            "#,
        )
        .bind(home_team)
        .bind(away_team)
        .bind(kickoff_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(fixture)
    }

    /// Find fixtures among the given UUIDs whose match has finished
    pub async fn find_finished_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Fixture>, RepositoryError> {
        let fixtures = sqlx::query_as::<_, Fixture>(
            r#"
            SELECT
                id, home_team, away_team, kickoff_at, state,
                full_time_home, full_time_away,
                extra_time_home, extra_time_away,
                penalties_home, penalties_away,
                result_text, created_at, updated_at
            FROM fixtures
            WHERE id = ANY($1) AND state = 'finished'
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(fixtures)
    }

    /// Record a provider result on a fixture and move it to the given state
    pub async fn record_result(
        &self,
        id: Uuid,
        state: MatchState,
        full_time: Option<ScorePair>,
        extra_time: Option<ScorePair>,
        penalties: Option<ScorePair>,
        result_text: Option<&str>,
    ) -> Result<Fixture, RepositoryError> {
        let fixture = sqlx::query_as::<_, Fixture>(
            r#"
            UPDATE fixtures
            SET state = $2,
                full_time_home = $3, full_time_away = $4,
                extra_time_home = $5, extra_time_away = $6,
                penalties_home = $7, penalties_away = $8,
                result_text = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING
                id, home_team, away_team, kickoff_at, state,
                full_time_home, full_time_away,
                extra_time_home, extra_time_away,
                penalties_home, penalties_away,
                result_text, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(state.as_str())
        .bind(full_time.map(|p| p.home))
        .bind(full_time.map(|p| p.away))
        .bind(extra_time.map(|p| p.home))
        .bind(extra_time.map(|p| p.away))
        .bind(penalties.map(|p| p.home))
        .bind(penalties.map(|p| p.away))
        .bind(result_text)
        .fetch_one(&self.pool)
        .await?;

        Ok(fixture)
    }

    /// Move a fixture to a new match state without touching its scores
    pub async fn update_state(&self, id: Uuid, state: MatchState) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE fixtures
            SET state = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(state.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}
