//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{multipart::Field, Extension, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use lecture_catalog_core::{
    encoder, CatalogError, EncodedFile, Grade, GradeProgress, Lecture, LectureDraft, PortError,
    Topic, TopicFilter, User,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::StreamReader;
use tracing::{error, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_topics_handler,
        list_lectures_handler,
        create_lecture_handler,
        delete_lecture_handler,
        download_lecture_handler,
        toggle_completion_handler,
        progress_overview_handler,
        grade_progress_handler,
    ),
    components(
        schemas(TopicResponse, LectureResponse, ProgressResponse, CompletionResponse)
    ),
    tags(
        (name = "Lecture Catalog API", description = "Lectures by grade and topic, and per-grade completion progress.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct TopicResponse {
    id: String,
    grade: u8,
    month: u8,
    name: String,
    icon: String,
}

impl From<Topic> for TopicResponse {
    fn from(topic: Topic) -> Self {
        Self {
            id: topic.id,
            grade: topic.grade.level(),
            month: topic.month,
            name: topic.name,
            icon: topic.icon,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LectureResponse {
    id: String,
    topic_id: String,
    title: String,
    description: String,
    /// A `data:` URI usable directly as a download or preview link.
    file_url: String,
    file_name: String,
    /// `PDF` or `IMAGE`.
    file_type: String,
    created_at: DateTime<Utc>,
}

impl From<Lecture> for LectureResponse {
    fn from(lecture: Lecture) -> Self {
        Self {
            id: lecture.id,
            topic_id: lecture.topic_id,
            title: lecture.title,
            description: lecture.description,
            file_url: lecture.file_url,
            file_name: lecture.file_name,
            file_type: lecture.file_type.as_str().to_string(),
            created_at: lecture.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ProgressResponse {
    grade: u8,
    completed: usize,
    total: usize,
    percent: u8,
}

impl From<GradeProgress> for ProgressResponse {
    fn from(progress: GradeProgress) -> Self {
        Self {
            grade: progress.grade.level(),
            completed: progress.completed,
            total: progress.total,
            percent: progress.percent,
        }
    }
}

/// The caller's completion state after a toggle.
#[derive(Serialize, ToSchema)]
pub struct CompletionResponse {
    lecture_id: String,
    completed: bool,
    completed_lecture_ids: Vec<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct GradeQuery {
    /// 10, 11 or 12.
    grade: u8,
}

#[derive(Deserialize, IntoParams)]
pub struct LectureQuery {
    /// 10, 11 or 12.
    grade: u8,
    /// A topic id, or `ALL` (the default).
    topic: Option<String>,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

type HandlerError = (StatusCode, String);

fn parse_grade(level: u8) -> Result<Grade, HandlerError> {
    Grade::try_from(level).map_err(|e| (StatusCode::BAD_REQUEST, e))
}

/// Every core error is reported locally; store outages are logged and hidden.
fn catalog_error(e: CatalogError) -> HandlerError {
    let status = match &e {
        CatalogError::UnsupportedFileKind(_)
        | CatalogError::MissingRequiredField(_)
        | CatalogError::UnknownTopic(_)
        | CatalogError::MalformedDataUri(_) => StatusCode::BAD_REQUEST,
        CatalogError::FileReadError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CatalogError::Forbidden => StatusCode::FORBIDDEN,
        CatalogError::StoreWriteError(missing @ PortError::NotFound(_)) => {
            warn!("Rejected catalog request: {}", e);
            return (StatusCode::NOT_FOUND, missing.to_string());
        }
        CatalogError::StoreWriteError(_) | CatalogError::StoreReadError(_) => {
            error!("Catalog store failure: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "The catalog store is unavailable".to_string(),
            );
        }
    };
    warn!("Rejected catalog request: {}", e);
    (status, e.to_string())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the topics of one grade.
#[utoipa::path(
    get,
    path = "/topics",
    params(GradeQuery, ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses(
        (status = 200, description = "Topics of the grade", body = [TopicResponse]),
        (status = 400, description = "Unsupported grade")
    )
)]
pub async fn list_topics_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<GradeQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let grade = parse_grade(query.grade)?;
    let topics = app_state.catalog.topics(grade).await.map_err(catalog_error)?;
    Ok(Json(topics.into_iter().map(TopicResponse::from).collect::<Vec<_>>()))
}

/// List the lectures of a grade, optionally narrowed to one topic.
#[utoipa::path(
    get,
    path = "/lectures",
    params(LectureQuery, ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses(
        (status = 200, description = "Lectures in catalog order", body = [LectureResponse]),
        (status = 400, description = "Unsupported grade")
    )
)]
pub async fn list_lectures_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<LectureQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let grade = parse_grade(query.grade)?;
    let filter = query
        .topic
        .as_deref()
        .map(TopicFilter::parse)
        .unwrap_or_default();
    let lectures = app_state
        .catalog
        .lectures(grade, &filter)
        .await
        .map_err(catalog_error)?;
    Ok(Json(lectures.into_iter().map(LectureResponse::from).collect::<Vec<_>>()))
}

/// Encodes the uploaded file part. `None` means the server is shutting down.
async fn encode_upload(
    field: Field<'_>,
    app_state: &AppState,
) -> Result<Option<EncodedFile>, CatalogError> {
    let name = field.file_name().unwrap_or("untitled").to_string();
    let media_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    // Rejected before any of the body is read.
    encoder::accept_media_type(&media_type)?;

    let stream = Box::pin(field.map_err(std::io::Error::other));
    encoder::encode_file_cancellable(StreamReader::new(stream), &name, &media_type, &app_state.shutdown)
        .await
}

/// Add a lecture by uploading a PDF or an image.
///
/// Accepts a multipart/form-data request with `title`, `description`,
/// `topic_id` and a `file` part. Requires an admin or teacher.
#[utoipa::path(
    post,
    path = "/lectures",
    request_body(content_type = "multipart/form-data", description = "Lecture fields and the file to upload."),
    responses(
        (status = 201, description = "Lecture created", body = LectureResponse),
        (status = 400, description = "Missing field, unknown topic or unsupported file kind"),
        (status = 403, description = "The user may not edit the catalog"),
        (status = 422, description = "The file could not be read"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn create_lecture_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    // Refuse before accepting an upload that could never be admitted.
    if !user.can_edit() {
        return Err(catalog_error(CatalogError::Forbidden));
    }

    let mut draft = LectureDraft::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => match encode_upload(field, &app_state).await.map_err(catalog_error)? {
                Some(file) => draft.file = Some(file),
                None => {
                    return Err((
                        StatusCode::SERVICE_UNAVAILABLE,
                        "Server is shutting down".to_string(),
                    ))
                }
            },
            "title" | "description" | "topic_id" => {
                let text = field.text().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read field {}: {}", field_name, e),
                    )
                })?;
                match field_name.as_str() {
                    "title" => draft.title = text,
                    "description" => draft.description = text,
                    _ => draft.topic_id = text,
                }
            }
            _ => {}
        }
    }

    let lecture = app_state
        .catalog
        .create_lecture(&user, draft)
        .await
        .map_err(catalog_error)?;
    Ok((StatusCode::CREATED, Json(LectureResponse::from(lecture))))
}

/// Remove a lecture. Removing an unknown id succeeds.
#[utoipa::path(
    delete,
    path = "/lectures/{id}",
    params(
        ("id" = String, Path, description = "The lecture id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 204, description = "Lecture removed"),
        (status = 403, description = "The user may not edit the catalog"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_lecture_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(lecture_id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    app_state
        .catalog
        .delete_lecture(&user, &lecture_id)
        .await
        .map_err(catalog_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Download the raw file of a lecture, decoded from its data URI.
#[utoipa::path(
    get,
    path = "/lectures/{id}/file",
    params(
        ("id" = String, Path, description = "The lecture id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 200, description = "The uploaded file with its original media type"),
        (status = 404, description = "No such lecture"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn download_lecture_handler(
    State(app_state): State<Arc<AppState>>,
    Path(lecture_id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let lecture = app_state
        .catalog
        .lecture(&lecture_id)
        .await
        .map_err(catalog_error)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Lecture {} not found", lecture_id)))?;

    let (media_type, bytes) = encoder::decode_data_uri(&lecture.file_url).map_err(|e| {
        error!("Stored file of lecture {} is unreadable: {}", lecture.id, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Stored file is unreadable".to_string(),
        )
    })?;
    Ok((
        [
            (header::CONTENT_TYPE, media_type),
            (header::CONTENT_DISPOSITION, content_disposition(&lecture.file_name)),
        ],
        bytes,
    ))
}

/// A visible-ASCII `filename` for old clients plus the exact name as an
/// RFC 5987 `filename*`.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            ' ' => ' ',
            c if c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    format!(
        "inline; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}

/// Toggle the caller's completion of a lecture.
#[utoipa::path(
    post,
    path = "/lectures/{id}/completion",
    params(
        ("id" = String, Path, description = "The lecture id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 200, description = "New completion state", body = CompletionResponse),
        (status = 404, description = "No such lecture to mark completed"),
        (status = 500, description = "The store rejected the change; nothing was toggled")
    )
)]
pub async fn toggle_completion_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(lecture_id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let completed_ids = app_state
        .catalog
        .toggle_completion(&user, &lecture_id)
        .await
        .map_err(catalog_error)?;

    let mut completed_lecture_ids: Vec<String> = completed_ids.iter().cloned().collect();
    completed_lecture_ids.sort();
    Ok(Json(CompletionResponse {
        completed: completed_ids.contains(&lecture_id),
        lecture_id,
        completed_lecture_ids,
    }))
}

/// Completion progress for every grade.
#[utoipa::path(
    get,
    path = "/progress",
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses(
        (status = 200, description = "One entry per grade, ascending", body = [ProgressResponse])
    )
)]
pub async fn progress_overview_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, HandlerError> {
    let overview = app_state.catalog.overview(&user).await.map_err(catalog_error)?;
    Ok(Json(overview.into_iter().map(ProgressResponse::from).collect::<Vec<_>>()))
}

/// Completion progress for one grade.
#[utoipa::path(
    get,
    path = "/progress/{grade}",
    params(
        ("grade" = u8, Path, description = "10, 11 or 12."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 200, description = "Progress of the grade", body = ProgressResponse),
        (status = 400, description = "Unsupported grade")
    )
)]
pub async fn grade_progress_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(level): Path<u8>,
) -> Result<impl IntoResponse, HandlerError> {
    let grade = parse_grade(level)?;
    let progress = app_state
        .catalog
        .progress(&user, grade)
        .await
        .map_err(catalog_error)?;
    Ok(Json(ProgressResponse::from(progress)))
}
