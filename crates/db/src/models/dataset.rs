//! Dataset entity model and DTOs.

use crowdlabel_core::mission::{DataFile, Dataset};
use crowdlabel_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DatasetRow {
    pub id: DbId,
    pub mission_id: DbId,
    pub name: String,
    pub description: String,
    pub accepted_types: Option<Vec<String>>,
    pub created_at: Timestamp,
}

impl DatasetRow {
    pub fn into_core(self, files: Vec<DataFile>) -> Dataset {
        Dataset {
            id: self.id,
            mission_id: self.mission_id,
            name: self.name,
            description: self.description,
            accepted_types: self.accepted_types,
            files,
        }
    }

    /// Whether a file of `file_type` may be uploaded here.
    ///
    /// Entries match either the full MIME type (`image/png`) or its top-level
    /// type (`image`).
    pub fn accepts(&self, file_type: &str) -> bool {
        let Some(accepted) = &self.accepted_types else {
            return true;
        };
        let top_level = file_type.split('/').next().unwrap_or(file_type);
        accepted
            .iter()
            .any(|a| a.eq_ignore_ascii_case(file_type) || a.eq_ignore_ascii_case(top_level))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDataset {
    pub name: String,
    pub description: Option<String>,
    pub accepted_types: Option<Vec<String>>,
}
