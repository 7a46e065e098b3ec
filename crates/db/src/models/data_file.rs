//! Data file entity model and DTOs.

use crowdlabel_core::mission::{Annotation, DataFile};
use crowdlabel_core::review::FileStatus;
use crowdlabel_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `data_files`, joined with the uploader's username.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DataFileRow {
    pub id: DbId,
    pub dataset_id: DbId,
    pub filename: String,
    pub size_kb: i64,
    pub file_type: String,
    pub status: String,
    pub contributor_id: Option<DbId>,
    pub contributor_name: Option<String>,
    pub uploaded_at: Timestamp,
}

impl DataFileRow {
    pub fn file_status(&self) -> Result<FileStatus, sqlx::Error> {
        FileStatus::from_str(&self.status).map_err(super::decode_error)
    }

    pub fn into_core(self, annotations: Vec<Annotation>) -> Result<DataFile, sqlx::Error> {
        Ok(DataFile {
            status: self.file_status()?,
            id: self.id,
            dataset_id: self.dataset_id,
            filename: self.filename,
            size_kb: self.size_kb,
            file_type: self.file_type,
            contributor_id: self.contributor_id,
            contributor_name: self.contributor_name.unwrap_or_default(),
            uploaded_at: self.uploaded_at,
            annotations,
        })
    }
}

/// DTO for recording an uploaded file. New files always start `pending`.
#[derive(Debug, Clone)]
pub struct CreateDataFile {
    pub dataset_id: DbId,
    pub filename: String,
    pub size_kb: i64,
    pub file_type: String,
    pub contributor_id: Option<DbId>,
}
