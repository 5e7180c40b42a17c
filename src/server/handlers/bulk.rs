use axum::{extract::State, response::Json};

use crate::server::app::AppState;
use crate::server::error::{ApiResult, ErrorBody};
use crate::server::extract::ValidatedJson;
use crate::services::{BulkOutcome, BulkRequest};

#[utoipa::path(
    post,
    path = "/api/v1/mindmap/bulk",
    tag = "bulk",
    request_body = BulkRequest,
    responses(
        (status = 200, description = "`{affected, notFound}`, `{data, count, notFound}` for export, or `{nodeIds, relationshipIds, nodeCount, relationshipCount, notFound}` for a delete dry run"),
        (status = 400, description = "Unknown operation, empty id list or dryRun on anything but delete", body = ErrorBody)
    )
)]
pub async fn bulk(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<BulkRequest>,
) -> ApiResult<Json<BulkOutcome>> {
    Ok(Json(
        state.ctx.bulk_service().execute_request(request).await?,
    ))
}
