use crate::error::RepositoryError;
use crate::models::GroupMember;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for group member data access
pub struct GroupMemberRepository {
    pool: PgPool,
}

impl GroupMemberRepository {
    /// Create a new GroupMemberRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a member to a group; re-adding an existing member is a no-op
    pub async fn add_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<GroupMember, RepositoryError> {
        let member = sqlx::query_as::<_, GroupMember>(
            r#"
            INSERT INTO group_members (group_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (group_id, user_id) DO UPDATE
            SET joined_at = group_members.joined_at
            RETURNING group_id, user_id, joined_at
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(member)
    }

    /// Find all members of a group
    pub async fn find_by_group(&self, group_id: Uuid) -> Result<Vec<GroupMember>, RepositoryError> {
        let members = sqlx::query_as::<_, GroupMember>(
            r#"
            SELECT group_id, user_id, joined_at
            FROM group_members
            WHERE group_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }
}
