//! Repository for the `missions` table.

use std::collections::HashMap;

use crowdlabel_core::mission::{Annotation, DataFile, Mission};
use crowdlabel_core::schema::MissionTaskConfig;
use crowdlabel_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use crate::models::mission::{CreateMission, MissionRow, UpdateMission};
use crate::repositories::{DataFileRepo, DatasetRepo, FileAnnotationRepo, MissionMemberRepo};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, data_type, status, goal_count, tasks, \
                       created_by, created_at, updated_at";

pub struct MissionRepo;

impl MissionRepo {
    /// Insert a new mission, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateMission,
        created_by: DbId,
    ) -> Result<MissionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO missions (title, description, data_type, goal_count, tasks, created_by)
             VALUES ($1, COALESCE($2, ''), $3, COALESCE($4, 0), $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MissionRow>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.data_type)
            .bind(input.goal_count)
            .bind(Json(&input.tasks))
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<MissionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM missions WHERE id = $1");
        sqlx::query_as::<_, MissionRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List missions newest first, optionally only those in `status`.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MissionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM missions
             WHERE $1::TEXT IS NULL OR status = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, MissionRow>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count missions, optionally only those in `status`.
    pub async fn count(pool: &PgPool, status: Option<&str>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM missions
             WHERE $1::TEXT IS NULL OR status = $1",
        )
        .bind(status)
        .fetch_one(pool)
        .await
    }

    /// Delete a mission with its datasets, files, annotations, responses and
    /// memberships. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM missions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update mission metadata. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMission,
    ) -> Result<Option<MissionRow>, sqlx::Error> {
        let query = format!(
            "UPDATE missions SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                goal_count = COALESCE($5, goal_count),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MissionRow>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.status)
            .bind(input.goal_count)
            .fetch_optional(pool)
            .await
    }

    /// Replace the mission's schema wholesale.
    pub async fn replace_tasks(
        pool: &PgPool,
        id: DbId,
        tasks: &[MissionTaskConfig],
    ) -> Result<Option<MissionRow>, sqlx::Error> {
        let query = format!(
            "UPDATE missions SET tasks = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MissionRow>(&query)
            .bind(id)
            .bind(Json(tasks))
            .fetch_optional(pool)
            .await
    }

    /// Load the full mission: schema, datasets, files with their annotation
    /// history, and contributors.
    ///
    /// All reads share one `REPEATABLE READ` read-only transaction.
    pub async fn snapshot(pool: &PgPool, id: DbId) -> Result<Option<Mission>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let Some(row) = Self::find_by_id(&mut *tx, id).await? else {
            return Ok(None);
        };

        let mut annotations: HashMap<DbId, Vec<Annotation>> = HashMap::new();
        for a in FileAnnotationRepo::list_for_mission(&mut *tx, id).await? {
            annotations.entry(a.file_id).or_default().push(a.into_core());
        }

        let mut files: HashMap<DbId, Vec<DataFile>> = HashMap::new();
        for f in DataFileRepo::list_for_mission(&mut *tx, id).await? {
            let history = annotations.remove(&f.id).unwrap_or_default();
            files.entry(f.dataset_id).or_default().push(f.into_core(history)?);
        }

        let datasets = DatasetRepo::list_for_mission(&mut *tx, id)
            .await?
            .into_iter()
            .map(|d| {
                let own = files.remove(&d.id).unwrap_or_default();
                d.into_core(own)
            })
            .collect::<Vec<_>>();

        let contributors = MissionMemberRepo::list_for_mission(&mut *tx, id)
            .await?
            .iter()
            .map(|m| m.to_contributor())
            .collect::<Vec<_>>();
        tx.commit().await?;

        tracing::debug!(
            mission_id = id,
            datasets = datasets.len(),
            contributors = contributors.len(),
            "Mission snapshot assembled"
        );
        row.into_core(datasets, contributors).map(Some)
    }
}
