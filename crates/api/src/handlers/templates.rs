//! Handler for the task template catalog.

use axum::Json;
use crowdlabel_core::catalog::{self, TaskTemplate};

use crate::response::DataResponse;

/// GET /api/v1/templates
pub async fn list() -> Json<DataResponse<&'static [TaskTemplate]>> {
    Json(DataResponse {
        data: catalog::all(),
    })
}
