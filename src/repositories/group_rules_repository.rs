use crate::error::RepositoryError;
use crate::models::GroupRules;
use crate::scoring::{KoRoundMode, PredictionMode};
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for group scoring rules data access
pub struct GroupRulesRepository {
    pool: PgPool,
}

impl GroupRulesRepository {
    /// Create a new GroupRulesRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace a group's rules; a group holds exactly one row
    pub async fn upsert(
        &self,
        group_id: Uuid,
        mode: PredictionMode,
        ko_mode: KoRoundMode,
        points_exact: i32,
        points_difference: i32,
        points_outcome: i32,
    ) -> Result<GroupRules, RepositoryError> {
        let rules = sqlx::query_as::<_, GroupRules>(
            r#"
            INSERT INTO group_rules (group_id, mode, ko_mode, points_exact, points_difference, points_outcome)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (group_id) DO UPDATE
            SET mode = EXCLUDED.mode,
                ko_mode = EXCLUDED.ko_mode,
                points_exact = EXCLUDED.points_exact,
                points_difference = EXCLUDED.points_difference,
                points_outcome = EXCLUDED.points_outcome
            RETURNING group_id, mode, ko_mode, points_exact, points_difference, points_outcome, created_at
            "#,
        )
        .bind(group_id)
        .bind(mode.as_str())
        .bind(ko_mode.as_str())
        .bind(points_exact)
        .bind(points_difference)
        .bind(points_outcome)
        .fetch_one(&self.pool)
        .await?;

        Ok(rules)
    }

    /// Find the rules for each of the given groups
    pub async fn find_by_group_ids(
        &self,
        group_ids: &[Uuid],
    ) -> Result<Vec<GroupRules>, RepositoryError> {
        let rules = sqlx::query_as::<_, GroupRules>(
            r#"
            SELECT group_id, mode, ko_mode, points_exact, points_difference, points_outcome, created_at
            FROM group_rules
            WHERE group_id = ANY($1)
            "#,
        )
        .bind(group_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }
}
