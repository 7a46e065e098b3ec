//! Route definitions for the `/missions` resource and everything nested in it.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{datasets, files, members, missions, responses, tasks};
use crate::state::AppState;

/// Routes mounted at `/missions`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(missions::list).post(missions::create))
        .route(
            "/{id}",
            get(missions::get_by_id)
                .patch(missions::update)
                .delete(missions::delete),
        )
        .route("/{id}/tasks", get(tasks::list).post(tasks::replace))
        .route("/{id}/tasks/resolved", get(tasks::resolved))
        .route("/{id}/join", post(members::join))
        .route("/{id}/members", get(members::list))
        .route("/{id}/datasets", post(datasets::create))
        // The upload handler enforces `max_upload_bytes` while streaming.
        .route(
            "/{id}/datasets/{dataset_id}/files",
            post(files::upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/{id}/files/{file_id}/review", post(files::review))
        .route("/{id}/files/{file_id}/annotate", post(files::annotate))
        .route(
            "/{id}/files/{file_id}/responses",
            get(responses::get).put(responses::put),
        )
}
