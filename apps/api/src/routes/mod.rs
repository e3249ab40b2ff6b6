pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::context::handlers as context;
use crate::generation::handlers as generation;
use crate::meeting::handlers as meeting;
use crate::verify::handlers as verify;
use crate::state::AppState;

/// Context uploads and specs under verification may be full PDFs.
const UPLOAD_LIMIT_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Reference material
        .route("/api/v1/files", get(context::handle_list_files))
        .route(
            "/api/v1/context/refresh",
            post(context::handle_refresh_context),
        )
        .route(
            "/api/v1/context/upload",
            post(context::handle_upload_context).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        // Clarification
        .route("/api/v1/analyze", post(generation::handle_analyze))
        .route("/api/v1/qa", post(generation::handle_save_qa))
        // Generation
        .route("/api/v1/generate", post(generation::handle_generate))
        .route(
            "/api/v1/meeting/enhance",
            post(meeting::handle_enhance_meeting_data),
        )
        // Corpus chat
        .route("/api/v1/chat", post(chat::handle_chat))
        .route("/api/v1/chat/clear", post(chat::handle_clear_chat))
        // Review
        .route(
            "/api/v1/verify",
            post(verify::handle_verify).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .with_state(state)
}
