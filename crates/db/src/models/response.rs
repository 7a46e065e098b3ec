//! Stored annotation response sets.

use std::collections::BTreeMap;

use crowdlabel_core::responses::{AnnotationResponseSet, TaskValue};
use crowdlabel_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct FileResponse {
    pub file_id: DbId,
    pub payload: Json<BTreeMap<String, Option<TaskValue>>>,
    pub updated_by: Option<DbId>,
    pub updated_at: Timestamp,
}

impl FileResponse {
    pub fn into_core(self) -> AnnotationResponseSet {
        AnnotationResponseSet {
            values: self.payload.0,
            updated_at: Some(self.updated_at),
        }
    }
}
