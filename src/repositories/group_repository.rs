use crate::error::RepositoryError;
use crate::models::{Group, GroupStatus};
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for group data access
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Create a new GroupRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new group
    pub async fn create(&self, name: &str, status: GroupStatus) -> Result<Group, RepositoryError> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (name, status)
            VALUES ($1, $2)
            RETURNING id, name, status, created_at
            "#,
        )
        .bind(name)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(group)
    }

    /// Find a group by UUID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, RepositoryError> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            SELECT id, name, status, created_at
            FROM groups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// Find groups by their UUIDs
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Group>, RepositoryError> {
        let groups = sqlx::query_as::<_, Group>(
            r#"
            SELECT id, name, status, created_at
            FROM groups
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    /// Transition an active group to ended.
    ///
    /// The status guard makes the transition one-way and safe to race:
    /// only one caller observes `true` for a given group.
    pub async fn mark_ended(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE groups
            SET status = 'ended'
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}
