use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::mindmap::{DeletedNodes, MindMapNode, NodeFields, NodePatch};
use crate::server::app::AppState;
use crate::server::error::{ApiResult, ErrorBody};
use crate::server::extract::ValidatedJson;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeRequest {
    pub lesson_id: String,
    pub parent_id: Option<String>,
    #[serde(flatten)]
    pub fields: NodeFields,
}

#[utoipa::path(
    post,
    path = "/api/v1/mindmap/nodes",
    tag = "nodes",
    request_body = CreateNodeRequest,
    responses(
        (status = 201, description = "Node created", body = MindMapNode),
        (status = 400, description = "Invalid node", body = ErrorBody),
        (status = 404, description = "Parent not found in this lesson", body = ErrorBody)
    )
)]
pub async fn create_node(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateNodeRequest>,
) -> ApiResult<(StatusCode, Json<MindMapNode>)> {
    let node = state
        .ctx
        .node_service()
        .create_node(&request.lesson_id, request.parent_id.as_deref(), request.fields)
        .await?;
    Ok((StatusCode::CREATED, Json(node)))
}

#[utoipa::path(
    get,
    path = "/api/v1/mindmap/nodes/{id}",
    tag = "nodes",
    params(("id" = String, Path, description = "Node id")),
    responses(
        (status = 200, description = "The node", body = MindMapNode),
        (status = 404, description = "Node not found", body = ErrorBody)
    )
)]
pub async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MindMapNode>> {
    Ok(Json(state.ctx.node_service().get_node(&id).await?))
}

/// Patch display fields; absent fields are left alone, `null` clears them
#[utoipa::path(
    put,
    path = "/api/v1/mindmap/nodes/{id}",
    tag = "nodes",
    params(("id" = String, Path, description = "Node id")),
    request_body = NodePatch,
    responses(
        (status = 200, description = "Updated node", body = MindMapNode),
        (status = 400, description = "Invalid patch or structural field", body = ErrorBody),
        (status = 404, description = "Node not found", body = ErrorBody)
    )
)]
pub async fn update_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<NodePatch>,
) -> ApiResult<Json<MindMapNode>> {
    Ok(Json(state.ctx.node_service().update_node(&id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/mindmap/nodes/{id}",
    tag = "nodes",
    params(("id" = String, Path, description = "Node id")),
    responses(
        (status = 200, description = "Ids of every removed node", body = DeletedNodes),
        (status = 404, description = "Node not found", body = ErrorBody)
    )
)]
pub async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedNodes>> {
    Ok(Json(state.ctx.node_service().delete_node(&id).await?))
}
