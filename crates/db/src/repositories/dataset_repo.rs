//! Repository for the `datasets` table.

use crowdlabel_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::dataset::{CreateDataset, DatasetRow};

const COLUMNS: &str = "id, mission_id, name, description, accepted_types, created_at";

pub struct DatasetRepo;

impl DatasetRepo {
    pub async fn create(
        pool: &PgPool,
        mission_id: DbId,
        input: &CreateDataset,
    ) -> Result<DatasetRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO datasets (mission_id, name, description, accepted_types)
             VALUES ($1, $2, COALESCE($3, ''), $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DatasetRow>(&query)
            .bind(mission_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.accepted_types)
            .fetch_one(pool)
            .await
    }

    /// Find a dataset, scoped to its mission.
    pub async fn find_in_mission(
        pool: &PgPool,
        mission_id: DbId,
        id: DbId,
    ) -> Result<Option<DatasetRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM datasets WHERE id = $1 AND mission_id = $2");
        sqlx::query_as::<_, DatasetRow>(&query)
            .bind(id)
            .bind(mission_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_mission<'e>(
        executor: impl PgExecutor<'e>,
        mission_id: DbId,
    ) -> Result<Vec<DatasetRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM datasets WHERE mission_id = $1 ORDER BY id");
        sqlx::query_as::<_, DatasetRow>(&query)
            .bind(mission_id)
            .fetch_all(executor)
            .await
    }
}
