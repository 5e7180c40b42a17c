pub mod app;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod openapi;

use anyhow::Result;
use tracing::info;

use crate::app_context::AppContext;
use crate::config::AppConfig;
use crate::database::connection::{establish_connection, get_database_url, setup_database};

pub async fn start_server(config: &AppConfig) -> Result<()> {
    let database_url = get_database_url(Some(&config.database.path));
    let db = establish_connection(&database_url).await?;

    setup_database(&db).await?;
    info!("Database migrations completed");

    let ctx = AppContext::with_settings(db, config.layout, config.cache_ttl());
    let app = app::create_app_with_context(ctx, config.server.cors_origin.as_deref())?;

    log_routes();

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Server running on http://{}", address);

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  /health                                   - Health check");
    info!("  /api-docs/openapi.json                    - OpenAPI document");
    info!("  /api/v1/mindmap/tree|forest|graph|export  - Lesson views (?lessonId=)");
    info!("  /api/v1/mindmap/nodes[/:id]               - Node CRUD, children, removal preview");
    info!("  /api/v1/mindmap/relationships             - Cross-links");
    info!("  /api/v1/mindmap/reorder|positions|bulk    - Structural and batch edits");
}
