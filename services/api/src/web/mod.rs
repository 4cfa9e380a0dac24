pub mod middleware;
pub mod rest;
pub mod state;

// Re-export the handlers to make them easily accessible
// to the binary that builds the web server router.
pub use middleware::require_user;
pub use rest::{
    create_lecture_handler, delete_lecture_handler, download_lecture_handler,
    grade_progress_handler, list_lectures_handler, list_topics_handler,
    progress_overview_handler, toggle_completion_handler,
};

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use state::AppState;
use std::sync::Arc;

/// Builds the catalog API router. Every route requires a resolved user.
pub fn router(app_state: Arc<AppState>) -> Router {
    let max_upload_bytes = app_state.config.max_upload_bytes;

    Router::new()
        .route("/topics", get(list_topics_handler))
        .route("/lectures", get(list_lectures_handler).post(create_lecture_handler))
        .route("/lectures/{id}", delete(delete_lecture_handler))
        .route("/lectures/{id}/file", get(download_lecture_handler))
        .route("/lectures/{id}/completion", post(toggle_completion_handler))
        .route("/progress", get(progress_overview_handler))
        .route("/progress/{grade}", get(grade_progress_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_user,
        ))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(app_state)
}
