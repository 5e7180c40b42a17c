use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::mindmap::{
    MindMapNode, NodeFields, PositionSaveResult, PositionUpdate, RemovalPreview,
};
use crate::server::app::AppState;
use crate::server::error::{ApiResult, ErrorBody};
use crate::server::extract::ValidatedJson;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub node_id: String,
    /// `null` or absent moves the node to the lesson's root level
    pub new_parent_id: Option<String>,
    /// Index among the new siblings; absent appends
    pub new_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SavePositionsRequest {
    pub updates: Vec<PositionUpdate>,
}

#[utoipa::path(
    post,
    path = "/api/v1/mindmap/reorder",
    tag = "hierarchy",
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Node after the move", body = MindMapNode),
        (status = 400, description = "Move would create a cycle or crosses lessons", body = ErrorBody),
        (status = 404, description = "Node or parent not found", body = ErrorBody)
    )
)]
pub async fn reorder(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ReorderRequest>,
) -> ApiResult<Json<MindMapNode>> {
    let node = state
        .ctx
        .hierarchy_service()
        .reparent(
            &request.node_id,
            request.new_parent_id.as_deref(),
            request.new_order.unwrap_or(i32::MAX),
        )
        .await?;
    Ok(Json(node))
}

#[utoipa::path(
    post,
    path = "/api/v1/mindmap/positions",
    tag = "hierarchy",
    request_body = SavePositionsRequest,
    responses(
        (status = 200, description = "Saved and unknown ids", body = PositionSaveResult),
        (status = 400, description = "Invalid coordinate", body = ErrorBody)
    )
)]
pub async fn save_positions(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SavePositionsRequest>,
) -> ApiResult<Json<PositionSaveResult>> {
    Ok(Json(
        state.ctx.node_service().save_positions(request.updates).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/mindmap/nodes/{id}/children",
    tag = "hierarchy",
    params(("id" = String, Path, description = "Parent node id")),
    request_body = NodeFields,
    responses(
        (status = 201, description = "Child created", body = MindMapNode),
        (status = 400, description = "Invalid node", body = ErrorBody),
        (status = 404, description = "Parent not found", body = ErrorBody)
    )
)]
pub async fn add_child(
    State(state): State<AppState>,
    Path(parent_id): Path<String>,
    ValidatedJson(fields): ValidatedJson<NodeFields>,
) -> ApiResult<(StatusCode, Json<MindMapNode>)> {
    let node = state
        .ctx
        .hierarchy_service()
        .add_child(&parent_id, fields)
        .await?;
    Ok((StatusCode::CREATED, Json(node)))
}

/// What a delete of this node would remove, without removing anything
#[utoipa::path(
    get,
    path = "/api/v1/mindmap/nodes/{id}/removal-preview",
    tag = "hierarchy",
    params(("id" = String, Path, description = "Node id")),
    responses(
        (status = 200, description = "Nodes and relationships in the subtree", body = RemovalPreview),
        (status = 404, description = "Node not found", body = ErrorBody)
    )
)]
pub async fn removal_preview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RemovalPreview>> {
    Ok(Json(
        state.ctx.hierarchy_service().preview_removal(&id).await?,
    ))
}
