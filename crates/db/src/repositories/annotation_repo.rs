//! Repository for the append-only `file_annotations` table.

use crowdlabel_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::annotation::{CreateFileAnnotation, FileAnnotation};

pub struct FileAnnotationRepo;

impl FileAnnotationRepo {
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateFileAnnotation,
    ) -> Result<FileAnnotation, sqlx::Error> {
        sqlx::query_as::<_, FileAnnotation>(
            "INSERT INTO file_annotations (file_id, annotator_id, label, notes)
             VALUES ($1, $2, $3, $4)
             RETURNING id, file_id, annotator_id,
                       (SELECT username FROM users WHERE users.id = annotator_id) AS annotator_name,
                       label, notes, created_at",
        )
        .bind(input.file_id)
        .bind(input.annotator_id)
        .bind(&input.label)
        .bind(&input.notes)
        .fetch_one(executor)
        .await
    }

    /// Every annotation on every file of a mission, oldest first.
    pub async fn list_for_mission<'e>(
        executor: impl PgExecutor<'e>,
        mission_id: DbId,
    ) -> Result<Vec<FileAnnotation>, sqlx::Error> {
        sqlx::query_as::<_, FileAnnotation>(
            "SELECT a.id, a.file_id, a.annotator_id, u.username AS annotator_name,
                    a.label, a.notes, a.created_at
             FROM file_annotations a
             JOIN data_files f ON f.id = a.file_id
             JOIN datasets d ON d.id = f.dataset_id
             LEFT JOIN users u ON u.id = a.annotator_id
             WHERE d.mission_id = $1
             ORDER BY a.created_at, a.id",
        )
        .bind(mission_id)
        .fetch_all(executor)
        .await
    }
}
