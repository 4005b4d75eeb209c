//! Attendance settings endpoints
//!
//! GET reports the threshold an import would use right now and where it
//! came from; PUT stores an operator value in the database tier.

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{resolve_min_duration, ResolvedThreshold};
use crate::{ApiResult, AppState};

/// PUT /settings/attendance request
#[derive(Debug, Deserialize)]
pub struct UpdateAttendanceSettings {
    pub min_duration_minutes: f64,
}

/// PUT /settings/attendance response
#[derive(Debug, Serialize)]
pub struct UpdateAttendanceSettingsResponse {
    pub success: bool,
    pub message: String,
    pub threshold: ResolvedThreshold,
}

/// GET /settings/attendance
pub async fn get_attendance_settings(
    State(state): State<AppState>,
) -> ApiResult<Json<ResolvedThreshold>> {
    let threshold = resolve_min_duration(&state.db, &state.toml_config, None).await?;
    Ok(Json(threshold))
}

/// PUT /settings/attendance
///
/// **Errors:** 400 for a negative or non-finite value
pub async fn update_attendance_settings(
    State(state): State<AppState>,
    Json(payload): Json<UpdateAttendanceSettings>,
) -> ApiResult<Json<UpdateAttendanceSettingsResponse>> {
    crate::db::settings::set_min_duration_minutes(&state.db, payload.min_duration_minutes).await?;
    info!(
        minutes = payload.min_duration_minutes,
        "Minimum attendance duration updated"
    );

    let threshold = resolve_min_duration(&state.db, &state.toml_config, None).await?;

    Ok(Json(UpdateAttendanceSettingsResponse {
        success: true,
        message: "Minimum attendance duration saved".to_string(),
        threshold,
    }))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new().route(
        "/settings/attendance",
        get(get_attendance_settings).put(update_attendance_settings),
    )
}
