pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::editor::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/templates", get(handlers::handle_list_templates))
        // Documents
        .route("/api/v1/documents", post(handlers::handle_create_document))
        .route(
            "/api/v1/documents/:id",
            get(handlers::handle_get_document).delete(handlers::handle_delete_document),
        )
        // Editing
        .route(
            "/api/v1/documents/:id/mutations",
            post(handlers::handle_apply_mutation),
        )
        .route("/api/v1/documents/:id/drag", post(handlers::handle_drag_event))
        // Views
        .route(
            "/api/v1/documents/:id/views/form",
            get(handlers::handle_form_view),
        )
        .route(
            "/api/v1/documents/:id/views/preview",
            get(handlers::handle_preview_view),
        )
        // Persistence
        .route(
            "/api/v1/documents/:id/save-status",
            get(handlers::handle_save_status),
        )
        .route("/api/v1/documents/:id/save", post(handlers::handle_save))
        .route("/api/v1/documents/:id/events", get(handlers::handle_events))
        .with_state(state)
}
