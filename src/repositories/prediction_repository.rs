use crate::error::RepositoryError;
use crate::models::Prediction;
use crate::scoring::PointsAward;
use chrono::NaiveDateTime;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Repository for prediction data access
pub struct PredictionRepository {
    pool: PgPool,
}

impl PredictionRepository {
    /// Create a new PredictionRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new unsettled prediction
    pub async fn create(
        &self,
        group_id: Uuid,
        group_fixture_id: Uuid,
        user_id: Uuid,
        guess: &str,
    ) -> Result<Prediction, RepositoryError> {
        let prediction = sqlx::query_as::<_, Prediction>(
            r#"
            INSERT INTO predictions (group_id, group_fixture_id, user_id, guess)
            VALUES ($1, $2, $3, $4)
            RETURNING
                id, group_id, group_fixture_id, user_id, guess,
                points, exact_hit, tendency_hit, settled_at,
                created_at, updated_at
            "#,
        )
        .bind(group_id)
        .bind(group_fixture_id)
        .bind(user_id)
        .bind(guess)
        .fetch_one(&self.pool)
        .await?;

        Ok(prediction)
    }

    /// Find a prediction by UUID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Prediction>, RepositoryError> {
        let prediction = sqlx::query_as::<_, Prediction>(
            r#"
            SELECT
                id, group_id, group_fixture_id, user_id, guess,
                points, exact_hit, tendency_hit, settled_at,
                created_at, updated_at
            FROM predictions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(prediction)
    }

    /// Find every unsettled prediction referencing one of the given
    /// group-fixture memberships.
    ///
    /// The `settled_at IS NULL` filter is what makes settlement runs
    /// re-invocable: rows settled by an earlier run never come back.
    pub async fn find_unsettled_by_memberships(
        &self,
        group_fixture_ids: &[Uuid],
    ) -> Result<Vec<Prediction>, RepositoryError> {
        let predictions = sqlx::query_as::<_, Prediction>(
            r#"
            SELECT
                id, group_id, group_fixture_id, user_id, guess,
                points, exact_hit, tendency_hit, settled_at,
                created_at, updated_at
            FROM predictions
            WHERE group_fixture_id = ANY($1) AND settled_at IS NULL
            "#,
        )
        .bind(group_fixture_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(predictions)
    }

    /// Find all predictions in a group, settled or not
    pub async fn find_by_group(&self, group_id: Uuid) -> Result<Vec<Prediction>, RepositoryError> {
        let predictions = sqlx::query_as::<_, Prediction>(
            r#"
            SELECT
                id, group_id, group_fixture_id, user_id, guess,
                points, exact_hit, tendency_hit, settled_at,
                created_at, updated_at
            FROM predictions
            WHERE group_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(predictions)
    }

    /// Write one prediction's settlement inside the caller's transaction.
    ///
    /// Returns the number of rows updated: 0 means the row was already
    /// settled (another run got there first), which callers treat as a
    /// silent skip rather than an error.
    pub async fn mark_settled(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        award: PointsAward,
        settled_at: NaiveDateTime,
    ) -> Result<u64, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE predictions
            SET points = $2,
                exact_hit = $3,
                tendency_hit = $4,
                settled_at = $5,
                updated_at = NOW()
            WHERE id = $1 AND settled_at IS NULL
            "#,
        )
        .bind(id)
        .bind(award.points)
        .bind(award.exact_hit)
        .bind(award.tendency_hit)
        .bind(settled_at)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        Ok(rows_affected)
    }
}
