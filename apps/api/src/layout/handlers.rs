use axum::{extract::State, Json};
use serde::Deserialize;

use crate::layout::fit::{evaluate_fit, FitReport};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitRequest {
    pub measured_height_px: f32,
    #[serde(default)]
    pub compact_applied: bool,
}

/// POST /api/v1/layout/fit
pub async fn handle_fit(
    State(state): State<AppState>,
    Json(req): Json<FitRequest>,
) -> Json<FitReport> {
    Json(evaluate_fit(
        req.measured_height_px,
        req.compact_applied,
        &state.fit,
    ))
}
