pub mod request_id;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::controllers::{health, phrase::PhraseController};
use crate::infrastructure::config::Config;
use crate::infrastructure::db::DbPool;

pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};

/// Build the application router
pub fn build_router(pool: Arc<DbPool>, phrase_controller: Arc<PhraseController>) -> Router {
    let phrase_routes = Router::new()
        .route(
            "/api/phrases",
            post(PhraseController::generate).get(PhraseController::retrieve),
        )
        .route("/api/phrases/random", get(PhraseController::random))
        .route(
            "/api/phrases/:hash",
            get(PhraseController::find).delete(PhraseController::delete),
        )
        .route("/api/phrases/:hash/audio", get(PhraseController::audio))
        .with_state(phrase_controller);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(pool)
        .merge(phrase_routes)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http()),
        )
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    pool: Arc<DbPool>,
    config: Arc<Config>,
    phrase_controller: Arc<PhraseController>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = build_router(pool, phrase_controller);
    if config.is_development() {
        app = app.layer(CorsLayer::permissive());
    }

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
