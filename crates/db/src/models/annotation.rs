//! File annotation audit records.

use crowdlabel_core::mission::Annotation;
use crowdlabel_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `file_annotations`, joined with the annotator's username.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FileAnnotation {
    pub id: DbId,
    pub file_id: DbId,
    pub annotator_id: Option<DbId>,
    pub annotator_name: Option<String>,
    pub label: String,
    pub notes: String,
    pub created_at: Timestamp,
}

impl FileAnnotation {
    pub fn into_core(self) -> Annotation {
        Annotation {
            id: Some(self.id),
            annotator_id: self.annotator_id,
            annotator_name: self.annotator_name.unwrap_or_default(),
            label: self.label,
            notes: self.notes,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateFileAnnotation {
    pub file_id: DbId,
    pub annotator_id: DbId,
    pub label: String,
    pub notes: String,
}
