pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::ai_client::handlers as ai;
use crate::applications::handlers as applications;
use crate::drafts::handlers as drafts;
use crate::export::handlers as export;
use crate::layout::handlers as layout;
use crate::state::AppState;

/// Captures at 2x density of a multi-page CV run to several megabytes.
const MAX_REQUEST_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Drafts
        .route(
            "/api/v1/drafts/current",
            get(drafts::handle_get_current).put(drafts::handle_save_current),
        )
        .route(
            "/api/v1/drafts/history",
            get(drafts::handle_list_history).post(drafts::handle_save_to_history),
        )
        .route(
            "/api/v1/drafts/history/:id",
            patch(drafts::handle_rename_in_history).delete(drafts::handle_delete_from_history),
        )
        .route(
            "/api/v1/drafts/history/:id/export",
            get(drafts::handle_export_draft),
        )
        .route("/api/v1/drafts/import", post(drafts::handle_import_draft))
        // Export
        .route("/api/v1/export/pdf", post(export::handle_export_pdf))
        .route("/api/v1/export/docx", post(export::handle_export_docx))
        // Layout
        .route("/api/v1/layout/fit", post(layout::handle_fit))
        // AI
        .route("/api/v1/ai/polish", post(ai::handle_polish))
        .route("/api/v1/ai/ats-score", post(ai::handle_ats_score))
        .route("/api/v1/ai/cover-letter", post(ai::handle_cover_letter))
        .route("/api/v1/ai/parse", post(ai::handle_parse))
        // Application log
        .route(
            "/api/v1/applications",
            get(applications::handle_list_applications).post(applications::handle_add_application),
        )
        .route(
            "/api/v1/applications/:id",
            patch(applications::handle_update_application)
                .delete(applications::handle_delete_application),
        )
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .with_state(state)
}
