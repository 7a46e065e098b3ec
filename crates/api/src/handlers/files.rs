//! Handlers for uploading and moving files through review.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use crowdlabel_core::error::CoreError;
use crowdlabel_core::mission::DataFile;
use crowdlabel_core::review::{submission_transition, validate_review, FileStatus, ReviewAction};
use crowdlabel_core::types::DbId;
use crowdlabel_db::models::annotation::{CreateFileAnnotation, FileAnnotation};
use crowdlabel_db::models::data_file::{CreateDataFile, DataFileRow};
use crowdlabel_db::repositories::{
    DataFileRepo, DatasetRepo, FileAnnotationRepo, MissionMemberRepo,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::missions::find_mission;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::require_mission_reviewer;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReviewParams {
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct AnnotateParams {
    pub label: String,
    #[serde(default)]
    pub notes: String,
}

/// Result of a review decision.
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub file_id: DbId,
    pub from: FileStatus,
    pub to: FileStatus,
    /// Whether the uploader was credited with an approved contribution.
    pub counted: bool,
}

/// One file read from the multipart body.
struct Upload {
    filename: String,
    content_type: String,
    size: usize,
}

fn not_found_file(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "DataFile",
        id,
    })
}

/// Size in whole kilobytes, rounded up so a non-empty file is never 0 KB.
fn size_kb(bytes: usize) -> i64 {
    bytes.div_ceil(1024) as i64
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/missions/{id}/datasets/{dataset_id}/files
///
/// Accepts one or more `file` fields. Each becomes a `pending` file credited
/// to the caller, whose upload count grows accordingly.
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((mission_id, dataset_id)): Path<(DbId, DbId)>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<DataFile>>>)> {
    find_mission(&state.pool, mission_id).await?;
    let dataset = DatasetRepo::find_in_mission(&state.pool, mission_id, dataset_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Dataset",
            id: dataset_id,
        }))?;

    let limit = state.config.max_upload_bytes;
    let mut total = 0usize;
    let mut uploads = Vec::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        if !dataset.accepts(&content_type) {
            return Err(AppError::BadRequest(format!(
                "Dataset {dataset_id} does not accept files of type '{content_type}'"
            )));
        }

        let mut size = 0usize;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            size += chunk.len();
            total += chunk.len();
            if total > limit {
                return Err(AppError::PayloadTooLarge(limit));
            }
        }
        uploads.push(Upload {
            filename,
            content_type,
            size,
        });
    }

    if uploads.is_empty() {
        return Err(AppError::BadRequest(
            "Multipart body must contain at least one 'file' field".into(),
        ));
    }

    let mut tx = state.pool.begin().await?;
    let mut stored = Vec::with_capacity(uploads.len());
    for upload in &uploads {
        let row = DataFileRepo::create(
            &mut *tx,
            &CreateDataFile {
                dataset_id,
                filename: upload.filename.clone(),
                size_kb: size_kb(upload.size),
                file_type: upload.content_type.clone(),
                contributor_id: Some(auth.user_id),
            },
        )
        .await?;
        stored.push(row.into_core(Vec::new())?);
    }
    let count = i32::try_from(stored.len())
        .map_err(|_| AppError::BadRequest("Too many files in one request".into()))?;
    MissionMemberRepo::record_uploads(&mut *tx, mission_id, auth.user_id, count).await?;
    tx.commit().await?;

    tracing::info!(
        mission_id,
        dataset_id,
        user_id = auth.user_id,
        count,
        bytes = total,
        "Files uploaded"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: stored })))
}

/// POST /api/v1/missions/{mission_id}/files/{file_id}/review?action=approve|reject
///
/// Reviewer only. The file row stays locked for the whole decision so two
/// concurrent approvals cannot both credit the uploader.
pub async fn review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((mission_id, file_id)): Path<(DbId, DbId)>,
    Query(params): Query<ReviewParams>,
) -> AppResult<Json<ReviewResponse>> {
    let action = ReviewAction::from_str(&params.action)?;
    find_mission(&state.pool, mission_id).await?;

    let mut tx = state.pool.begin().await?;
    require_mission_reviewer(&mut *tx, mission_id, &auth).await?;

    let file = DataFileRepo::lock_in_mission(&mut *tx, mission_id, file_id)
        .await?
        .ok_or_else(|| not_found_file(file_id))?;
    let transition = validate_review(file.file_status()?, action)?;

    DataFileRepo::set_status(&mut *tx, file_id, transition.to).await?;
    let counted = match (transition.counts_approval, file.contributor_id) {
        (true, Some(uploader)) => {
            MissionMemberRepo::record_approval(&mut *tx, mission_id, uploader).await?;
            true
        }
        _ => false,
    };
    tx.commit().await?;

    tracing::info!(
        mission_id,
        file_id,
        reviewer_id = auth.user_id,
        action = action.as_str(),
        from = %transition.from,
        to = %transition.to,
        counted,
        "File reviewed"
    );
    Ok(Json(ReviewResponse {
        file_id,
        from: transition.from,
        to: transition.to,
        counted,
    }))
}

/// POST /api/v1/missions/{mission_id}/files/{file_id}/annotate?label=&notes=
///
/// Appends an audit annotation and sends the file to review. Any
/// authenticated user may submit.
pub async fn annotate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((mission_id, file_id)): Path<(DbId, DbId)>,
    Query(params): Query<AnnotateParams>,
) -> AppResult<(StatusCode, Json<FileAnnotation>)> {
    if params.label.trim().is_empty() {
        return Err(CoreError::Validation("Annotation label must not be empty".into()).into());
    }

    let mut tx = state.pool.begin().await?;
    let file: DataFileRow = DataFileRepo::lock_in_mission(&mut *tx, mission_id, file_id)
        .await?
        .ok_or_else(|| not_found_file(file_id))?;
    let status = file.file_status()?;
    let transition = submission_transition(status).ok_or_else(|| {
        CoreError::Conflict(format!(
            "File {file_id} is '{status}' and is not awaiting annotation"
        ))
    })?;

    let annotation = FileAnnotationRepo::create(
        &mut *tx,
        &CreateFileAnnotation {
            file_id,
            annotator_id: auth.user_id,
            label: params.label,
            notes: params.notes,
        },
    )
    .await?;
    DataFileRepo::set_status(&mut *tx, file_id, transition.to).await?;
    tx.commit().await?;

    tracing::info!(
        mission_id,
        file_id,
        annotator_id = auth.user_id,
        annotation_id = annotation.id,
        "Annotation submitted"
    );
    Ok((StatusCode::CREATED, Json(annotation)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_round_up_to_whole_kilobytes() {
        assert_eq!(size_kb(0), 0);
        assert_eq!(size_kb(1), 1);
        assert_eq!(size_kb(1024), 1);
        assert_eq!(size_kb(1025), 2);
    }
}
