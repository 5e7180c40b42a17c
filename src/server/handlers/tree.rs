use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use utoipa::IntoParams;

use super::{required, LessonQuery};
use crate::errors::MindMapError;
use crate::export::ExportFormat;
use crate::mindmap::{Forest, GraphMode, GraphView, TreeSnapshot};
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult, ErrorBody};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct GraphQuery {
    pub lesson_id: Option<String>,
    /// `admin` (default) or `student`
    pub mode: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    pub lesson_id: Option<String>,
    /// `json` (default), `csv` or `mermaid`
    pub format: Option<String>,
    /// `ar` selects Arabic labels in the Mermaid export
    pub lang: Option<String>,
}

/// Strong validator of a serialized payload
pub fn etag_for(body: &[u8]) -> String {
    format!("\"{:x}\"", Sha256::digest(body))
}

fn matches_etag(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate == etag || candidate.trim_start_matches("W/") == etag)
}

/// Flat lesson snapshot; answers 304 when `If-None-Match` carries the current ETag
#[utoipa::path(
    get,
    path = "/api/v1/mindmap/tree",
    tag = "tree",
    params(LessonQuery),
    responses(
        (status = 200, description = "Nodes and relationships of the lesson", body = TreeSnapshot),
        (status = 304, description = "Snapshot unchanged"),
        (status = 400, description = "Missing lessonId", body = ErrorBody)
    )
)]
pub async fn get_tree(
    State(state): State<AppState>,
    Query(query): Query<LessonQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let lesson_id = query.lesson_id()?;
    let snapshot = state.ctx.node_service().get_tree(lesson_id).await?;

    let body = serde_json::to_vec(snapshot.as_ref())
        .map_err(|e| MindMapError::internal(format!("Failed to serialize tree: {}", e)))?;
    let etag = etag_for(&body);
    let etag_value = HeaderValue::from_str(&etag)
        .map_err(|e| MindMapError::internal(format!("Invalid ETag: {}", e)))?;

    if matches_etag(&headers, &etag) {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag_value)]).into_response());
    }

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::ETAG, etag_value),
        ],
        body,
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/mindmap/forest",
    tag = "tree",
    params(LessonQuery),
    responses(
        (status = 200, description = "Nested tree with orphans and cyclic ids", body = Forest),
        (status = 400, description = "Missing lessonId", body = ErrorBody)
    )
)]
pub async fn get_forest(
    State(state): State<AppState>,
    Query(query): Query<LessonQuery>,
) -> ApiResult<Json<Forest>> {
    let lesson_id = query.lesson_id()?;
    Ok(Json(state.ctx.tree_service().assemble(lesson_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/mindmap/graph",
    tag = "tree",
    params(GraphQuery),
    responses(
        (status = 200, description = "Positioned nodes with hierarchy and relationship edges", body = GraphView),
        (status = 400, description = "Missing lessonId or unknown mode", body = ErrorBody)
    )
)]
pub async fn get_graph(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
) -> ApiResult<Json<GraphView>> {
    let lesson_id = required(query.lesson_id.as_deref(), "lessonId")?;
    let mode = match query.mode.as_deref() {
        Some(mode) => mode
            .parse::<GraphMode>()
            .map_err(|e| ApiError(MindMapError::validation(e)))?,
        None => GraphMode::default(),
    };
    Ok(Json(state.ctx.tree_service().graph(lesson_id, mode).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/mindmap/export",
    tag = "tree",
    params(ExportQuery),
    responses(
        (status = 200, description = "Lesson rendered in the requested format"),
        (status = 400, description = "Missing lessonId or unknown format", body = ErrorBody)
    )
)]
pub async fn export_lesson(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let lesson_id = required(query.lesson_id.as_deref(), "lessonId")?;
    let format = match query.format.as_deref() {
        Some(format) => format
            .parse::<ExportFormat>()
            .map_err(|e| ApiError(MindMapError::validation(e)))?,
        None => ExportFormat::default(),
    };
    let lang = query.lang.as_deref().unwrap_or("en");

    let body = state
        .ctx
        .tree_service()
        .export(lesson_id, format, lang)
        .await?;
    let disposition = format!(
        "attachment; filename=\"{}.{}\"",
        lesson_id.replace(|c: char| !c.is_ascii_alphanumeric() && c != '-' && c != '_', "_"),
        format.extension()
    );
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| MindMapError::internal(format!("Invalid header: {}", e)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(format.content_type())),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
