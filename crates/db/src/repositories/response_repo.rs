//! Repository for the `file_responses` table.

use crowdlabel_core::responses::AnnotationResponseSet;
use crowdlabel_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::response::FileResponse;

const COLUMNS: &str = "file_id, payload, updated_by, updated_at";

pub struct ResponseRepo;

impl ResponseRepo {
    pub async fn find(pool: &PgPool, file_id: DbId) -> Result<Option<FileResponse>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM file_responses WHERE file_id = $1");
        sqlx::query_as::<_, FileResponse>(&query)
            .bind(file_id)
            .fetch_optional(pool)
            .await
    }

    /// Store `set` as the file's response set, replacing any previous one.
    pub async fn upsert(
        pool: &PgPool,
        file_id: DbId,
        set: &AnnotationResponseSet,
        updated_by: DbId,
    ) -> Result<FileResponse, sqlx::Error> {
        let query = format!(
            "INSERT INTO file_responses (file_id, payload, updated_by)
             VALUES ($1, $2, $3)
             ON CONFLICT (file_id)
             DO UPDATE SET payload = EXCLUDED.payload,
                           updated_by = EXCLUDED.updated_by,
                           updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FileResponse>(&query)
            .bind(file_id)
            .bind(Json(&set.values))
            .bind(updated_by)
            .fetch_one(pool)
            .await
    }
}
