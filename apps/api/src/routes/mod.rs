pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::documents::handlers as document_handlers;
use crate::evaluation::handlers as evaluation_handlers;
use crate::state::AppState;
use crate::uploads::handlers as upload_handlers;

/// Multipart bodies carry PDFs; axum's 2 MB default is too small.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidate intake
        .route("/upload", post(upload_handlers::handle_upload))
        // Evaluation jobs
        .route("/evaluate", post(evaluation_handlers::handle_evaluate))
        .route("/result/:id", get(evaluation_handlers::handle_result))
        // Ground-truth documents (RAG)
        .route(
            "/documents",
            get(document_handlers::handle_list_documents)
                .post(document_handlers::handle_ingest_document),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
