// Alive reminder mute commands

use axum::extract::{Query, State};
use chrono::Utc;
use serde::Deserialize;
use tracing::error;

use super::common::{
    bad_request, internal_error, service_unavailable, ApiResponse, ApiResult, ErrorResponse,
};
use crate::alive_reminder::{self, MuteStatus};
use crate::constants::alive_reminder::MAX_MUTE_SECONDS;
use crate::store::Store;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct MuteParams {
    /// Muted until unmuted when absent
    pub duration_seconds: Option<u64>,
}

fn store(state: &AppState) -> Result<&Store, ErrorResponse> {
    state.store.as_deref().ok_or_else(|| {
        service_unavailable("No database_path configured, the alive reminder cannot be muted")
    })
}

fn store_failed(what: &str, e: sqlx::Error) -> ErrorResponse {
    error!("{}: {}", what, e);
    internal_error(format!("{}: {}", what, e))
}

pub async fn get_alive_reminder_mute(State(state): State<AppState>) -> ApiResult<MuteStatus> {
    let store = store(&state)?;
    match alive_reminder::mute_status(store).await {
        Ok(status) => ApiResponse::ok(status),
        Err(e) => Err(store_failed("Could not read the alive reminder mute", e)),
    }
}

pub async fn mute_alive_reminder(
    State(state): State<AppState>,
    Query(params): Query<MuteParams>,
) -> ApiResult<MuteStatus> {
    let store = store(&state)?;

    if let Some(seconds) = params.duration_seconds {
        if seconds == 0 || seconds > MAX_MUTE_SECONDS {
            return Err(bad_request(format!(
                "duration_seconds must be between 1 and {}",
                MAX_MUTE_SECONDS
            )));
        }
    }

    match alive_reminder::mute(store, params.duration_seconds, Utc::now()).await {
        Ok(status) => ApiResponse::ok(status),
        Err(e) => Err(store_failed("Could not mute the alive reminder", e)),
    }
}

pub async fn unmute_alive_reminder(State(state): State<AppState>) -> ApiResult<MuteStatus> {
    let store = store(&state)?;
    match alive_reminder::unmute(store).await {
        Ok(status) => ApiResponse::ok(status),
        Err(e) => Err(store_failed("Could not unmute the alive reminder", e)),
    }
}
