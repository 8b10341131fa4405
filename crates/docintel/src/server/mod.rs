//! HTTP surface over intake, queue and broadcaster.

mod error;
mod routes;
mod state;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::AppState;

/// Builds the API router with all endpoints.
///
/// The blanket body limit is off; uploads are bounded per file and per
/// request count by the upload handler.
pub fn build_router(state: AppState) -> Router {
    routes::router()
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `addr` and serves until `shutdown` resolves.
pub async fn serve<F>(addr: &str, state: AppState, shutdown: F) -> Result<(), std::io::Error>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
