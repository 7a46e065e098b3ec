pub mod auth;
pub mod health;
pub mod missions;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/register                                      register (public)
/// /auth/login                                         login (public)
/// /auth/me                                            current user
///
/// /templates                                          task template catalog
///
/// /missions                                           list, create (admin)
/// /missions/{id}                                      full mission, update (admin)
/// /missions/{id}/tasks                                schema, replace (reviewer)
/// /missions/{id}/tasks/resolved                       schema merged with templates
/// /missions/{id}/join                                 join (POST)
/// /missions/{id}/members                              members with effective roles
/// /missions/{id}/datasets                             create (reviewer)
/// /missions/{id}/datasets/{dataset_id}/files          upload (multipart)
/// /missions/{id}/files/{file_id}/review               approve / reject (reviewer)
/// /missions/{id}/files/{file_id}/annotate             submit annotation
/// /missions/{id}/files/{file_id}/responses            get, replace response set
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .route("/templates", get(handlers::templates::list))
        .nest("/missions", missions::router())
}
