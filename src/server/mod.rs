mod routes;

pub use routes::AppState;

use crate::config::Config;
use crate::error::ServerError;
use crate::status::PlanningRegistry;
use crate::workflow::Coordinator;
use axum::routing::{get, post};
use std::sync::Arc;
use tracing::info;

pub fn router(state: Arc<AppState>) -> axum::Router {
    let cors = tower_http::cors::CorsLayer::permissive();

    axum::Router::new()
        .route("/plan", post(routes::plan))
        .route("/planning_status/:id", get(routes::planning_status))
        .route("/download/:id", get(routes::download))
        .layer(cors)
        .with_state(state)
}

/// Serve the planning API until the process is stopped
pub async fn serve(config: Arc<Config>) -> Result<(), ServerError> {
    let addr = config.server.bind.clone();
    let state = Arc::new(AppState {
        registry: PlanningRegistry::new(config.server.retain_completed),
        coordinator: Arc::new(Coordinator::from_config(config)),
    });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!("Planning service listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
