mod documents;
mod stream;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub queue_size: usize,
    pub subscribers: usize,
}

pub async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Document Intelligence API",
        queue_size: state.queue.size(),
        subscribers: state.broadcaster.subscriber_count(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/documents", get(documents::list_documents))
        .route("/documents/upload", post(documents::upload_documents))
        .route("/documents/stream", get(stream::stream_documents))
        .route(
            "/documents/:id",
            get(documents::get_document).delete(documents::delete_document),
        )
        .route("/documents/:id/status", get(documents::get_document_status))
}
