use anyhow::{anyhow, Result};
use axum::{
    http::{header, HeaderValue, Method},
    response::Json,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use super::handlers::{bulk, health, hierarchy, nodes, relationships, tree};
use super::openapi::ApiDoc;
use crate::app_context::AppContext;

#[derive(Clone)]
pub struct AppState {
    pub ctx: AppContext,
}

pub async fn create_app(db: DatabaseConnection, cors_origin: Option<&str>) -> Result<Router> {
    create_app_with_context(AppContext::new(db), cors_origin)
}

pub fn create_app_with_context(ctx: AppContext, cors_origin: Option<&str>) -> Result<Router> {
    let state = AppState { ctx };

    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = match cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .map_err(|e| anyhow!("Invalid CORS origin: {}", e))?,
            )
            .allow_methods(methods)
            .allow_headers(Any)
            .expose_headers([header::ETAG]),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
            .expose_headers([header::ETAG]),
    };

    let app = Router::new()
        .route("/health", get(health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api/v1/mindmap", mindmap_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    Ok(app)
}

fn mindmap_routes() -> Router<AppState> {
    Router::new()
        .route("/tree", get(tree::get_tree))
        .route("/forest", get(tree::get_forest))
        .route("/graph", get(tree::get_graph))
        .route("/export", get(tree::export_lesson))
        .route("/nodes", post(nodes::create_node))
        .route(
            "/nodes/:id",
            get(nodes::get_node)
                .put(nodes::update_node)
                .delete(nodes::delete_node),
        )
        .route("/nodes/:id/children", post(hierarchy::add_child))
        .route("/nodes/:id/removal-preview", get(hierarchy::removal_preview))
        .route(
            "/relationships",
            get(relationships::list_relationships)
                .post(relationships::create_relationship)
                .delete(relationships::delete_relationship),
        )
        .route("/reorder", post(hierarchy::reorder))
        .route("/positions", post(hierarchy::save_positions))
        .route("/bulk", post(bulk::bulk))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
