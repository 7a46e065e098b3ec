//! Repository for the `mission_members` table.

use crowdlabel_core::contributor::derive_role;
use crowdlabel_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::member::MissionMember;

const COLUMNS: &str = "m.id, m.mission_id, m.user_id, u.username, m.role, \
                       m.approved_count, m.total_count, m.joined_at";

pub struct MissionMemberRepo;

impl MissionMemberRepo {
    /// Add a user to a mission. Joining twice is a no-op that returns the
    /// existing membership.
    pub async fn join(
        pool: &PgPool,
        mission_id: DbId,
        user_id: DbId,
    ) -> Result<MissionMember, sqlx::Error> {
        sqlx::query(
            "INSERT INTO mission_members (mission_id, user_id)
             VALUES ($1, $2)
             ON CONFLICT (mission_id, user_id) DO NOTHING",
        )
        .bind(mission_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Self::find(pool, mission_id, user_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find<'e>(
        executor: impl PgExecutor<'e>,
        mission_id: DbId,
        user_id: DbId,
    ) -> Result<Option<MissionMember>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM mission_members m
             JOIN users u ON u.id = m.user_id
             WHERE m.mission_id = $1 AND m.user_id = $2"
        );
        sqlx::query_as::<_, MissionMember>(&query)
            .bind(mission_id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// Members of a mission, most approvals first.
    pub async fn list_for_mission<'e>(
        executor: impl PgExecutor<'e>,
        mission_id: DbId,
    ) -> Result<Vec<MissionMember>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM mission_members m
             JOIN users u ON u.id = m.user_id
             WHERE m.mission_id = $1
             ORDER BY m.approved_count DESC, m.joined_at ASC"
        );
        sqlx::query_as::<_, MissionMember>(&query)
            .bind(mission_id)
            .fetch_all(executor)
            .await
    }

    /// Count `count` uploads toward the user's total, joining them to the
    /// mission if needed.
    pub async fn record_uploads<'e>(
        executor: impl PgExecutor<'e>,
        mission_id: DbId,
        user_id: DbId,
        count: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO mission_members (mission_id, user_id, total_count)
             VALUES ($1, $2, $3)
             ON CONFLICT (mission_id, user_id)
             DO UPDATE SET total_count = mission_members.total_count + EXCLUDED.total_count",
        )
        .bind(mission_id)
        .bind(user_id)
        .bind(count)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Count one integrated file for the user and refresh the role hint.
    /// Returns the new approved count.
    ///
    /// Runs two statements, so call it inside the transaction that moved the
    /// file to `approved`.
    pub async fn record_approval(
        conn: &mut PgConnection,
        mission_id: DbId,
        user_id: DbId,
    ) -> Result<i32, sqlx::Error> {
        let approved_count: i32 = sqlx::query_scalar(
            "INSERT INTO mission_members (mission_id, user_id, approved_count)
             VALUES ($1, $2, 1)
             ON CONFLICT (mission_id, user_id)
             DO UPDATE SET approved_count = mission_members.approved_count + 1
             RETURNING approved_count",
        )
        .bind(mission_id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query(
            "UPDATE mission_members SET role = $3
             WHERE mission_id = $1 AND user_id = $2",
        )
        .bind(mission_id)
        .bind(user_id)
        .bind(derive_role(approved_count).as_str())
        .execute(&mut *conn)
        .await?;
        Ok(approved_count)
    }
}
