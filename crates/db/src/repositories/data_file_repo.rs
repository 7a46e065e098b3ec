//! Repository for the `data_files` table.

use crowdlabel_core::review::FileStatus;
use crowdlabel_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::data_file::{CreateDataFile, DataFileRow};

const COLUMNS: &str = "f.id, f.dataset_id, f.filename, f.size_kb, f.file_type, f.status, \
                       f.contributor_id, u.username AS contributor_name, f.uploaded_at";

/// Files joined to their dataset (for mission scoping) and uploader.
const FROM: &str = "data_files f
     JOIN datasets d ON d.id = f.dataset_id
     LEFT JOIN users u ON u.id = f.contributor_id";

pub struct DataFileRepo;

impl DataFileRepo {
    /// Record an uploaded file. The row always starts `pending`.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateDataFile,
    ) -> Result<DataFileRow, sqlx::Error> {
        sqlx::query_as::<_, DataFileRow>(
            "INSERT INTO data_files (dataset_id, filename, size_kb, file_type, status, contributor_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, dataset_id, filename, size_kb, file_type, status, contributor_id,
                       (SELECT username FROM users WHERE users.id = contributor_id) AS contributor_name,
                       uploaded_at",
        )
        .bind(input.dataset_id)
        .bind(&input.filename)
        .bind(input.size_kb)
        .bind(&input.file_type)
        .bind(FileStatus::Pending.as_str())
        .bind(input.contributor_id)
        .fetch_one(executor)
        .await
    }

    /// Find a file belonging to `mission_id`.
    pub async fn find_in_mission<'e>(
        executor: impl PgExecutor<'e>,
        mission_id: DbId,
        file_id: DbId,
    ) -> Result<Option<DataFileRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {FROM} WHERE f.id = $1 AND d.mission_id = $2");
        sqlx::query_as::<_, DataFileRow>(&query)
            .bind(file_id)
            .bind(mission_id)
            .fetch_optional(executor)
            .await
    }

    /// Like [`Self::find_in_mission`] but locks the file row until the
    /// surrounding transaction ends.
    pub async fn lock_in_mission<'e>(
        executor: impl PgExecutor<'e>,
        mission_id: DbId,
        file_id: DbId,
    ) -> Result<Option<DataFileRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM {FROM} WHERE f.id = $1 AND d.mission_id = $2 FOR UPDATE OF f"
        );
        sqlx::query_as::<_, DataFileRow>(&query)
            .bind(file_id)
            .bind(mission_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_for_mission<'e>(
        executor: impl PgExecutor<'e>,
        mission_id: DbId,
    ) -> Result<Vec<DataFileRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM {FROM} WHERE d.mission_id = $1 ORDER BY f.uploaded_at, f.id"
        );
        sqlx::query_as::<_, DataFileRow>(&query)
            .bind(mission_id)
            .fetch_all(executor)
            .await
    }

    pub async fn set_status<'e>(
        executor: impl PgExecutor<'e>,
        file_id: DbId,
        status: FileStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE data_files SET status = $2 WHERE id = $1")
            .bind(file_id)
            .bind(status.as_str())
            .execute(executor)
            .await?;
        Ok(())
    }
}
