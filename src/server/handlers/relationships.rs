use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{required, LessonQuery};
use crate::mindmap::{MindMapRelationship, NewRelationship};
use crate::server::app::AppState;
use crate::server::error::{ApiResult, ErrorBody};
use crate::server::extract::ValidatedJson;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RelationshipIdQuery {
    /// Relationship id; ids of hierarchy edges are refused
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RelationshipDeleted {
    pub deleted: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/mindmap/relationships",
    tag = "relationships",
    request_body = NewRelationship,
    responses(
        (status = 201, description = "Relationship created", body = MindMapRelationship),
        (status = 400, description = "Invalid relationship", body = ErrorBody),
        (status = 404, description = "Endpoint node not found", body = ErrorBody),
        (status = 409, description = "Relationship already exists", body = ErrorBody)
    )
)]
pub async fn create_relationship(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<NewRelationship>,
) -> ApiResult<(StatusCode, Json<MindMapRelationship>)> {
    let relationship = state
        .ctx
        .relationship_service()
        .create_relationship(input)
        .await?;
    Ok((StatusCode::CREATED, Json(relationship)))
}

#[utoipa::path(
    get,
    path = "/api/v1/mindmap/relationships",
    tag = "relationships",
    params(LessonQuery),
    responses(
        (status = 200, description = "Relationships of the lesson", body = Vec<MindMapRelationship>),
        (status = 400, description = "Missing lessonId", body = ErrorBody)
    )
)]
pub async fn list_relationships(
    State(state): State<AppState>,
    Query(query): Query<LessonQuery>,
) -> ApiResult<Json<Vec<MindMapRelationship>>> {
    let lesson_id = query.lesson_id()?;
    Ok(Json(
        state
            .ctx
            .relationship_service()
            .list_relationships(lesson_id)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/mindmap/relationships",
    tag = "relationships",
    params(RelationshipIdQuery),
    responses(
        (status = 200, description = "Relationship deleted", body = RelationshipDeleted),
        (status = 400, description = "Missing id or hierarchy edge", body = ErrorBody),
        (status = 404, description = "Relationship not found", body = ErrorBody)
    )
)]
pub async fn delete_relationship(
    State(state): State<AppState>,
    Query(query): Query<RelationshipIdQuery>,
) -> ApiResult<Json<RelationshipDeleted>> {
    let id = required(query.id.as_deref(), "id")?;
    state.ctx.relationship_service().delete_relationship(id).await?;
    Ok(Json(RelationshipDeleted {
        deleted: id.to_string(),
    }))
}
