use crate::error::RepositoryError;
use crate::models::GroupFixture;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for group-fixture membership data access
pub struct GroupFixtureRepository {
    pool: PgPool,
}

impl GroupFixtureRepository {
    /// Create a new GroupFixtureRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Link a fixture into a group's slate
    pub async fn link(
        &self,
        group_id: Uuid,
        fixture_id: Uuid,
    ) -> Result<GroupFixture, RepositoryError> {
        let membership = sqlx::query_as::<_, GroupFixture>(
            r#"
            INSERT INTO group_fixtures (group_id, fixture_id)
            VALUES ($1, $2)
            RETURNING id, group_id, fixture_id, created_at
            "#,
        )
        .bind(group_id)
        .bind(fixture_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(membership)
    }

    /// Find every membership referencing one of the given fixtures
    pub async fn find_by_fixture_ids(
        &self,
        fixture_ids: &[Uuid],
    ) -> Result<Vec<GroupFixture>, RepositoryError> {
        let memberships = sqlx::query_as::<_, GroupFixture>(
            r#"
            SELECT id, group_id, fixture_id, created_at
            FROM group_fixtures
            WHERE fixture_id = ANY($1)
            "#,
        )
        .bind(fixture_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(memberships)
    }

    /// Check whether a group still references any fixture that has not
    /// reached a terminal match state.
    ///
    /// Evaluated fresh on every settlement run; later runs may close out
    /// the remaining fixtures.
    pub async fn has_open_fixtures(&self, group_id: Uuid) -> Result<bool, RepositoryError> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM group_fixtures gf
                JOIN fixtures f ON f.id = gf.fixture_id
                WHERE gf.group_id = $1
                  AND f.state NOT IN ('finished', 'cancelled', 'interrupted')
            )
            "#,
        )
        .bind(group_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }
}
