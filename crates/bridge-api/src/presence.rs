use axum::{
    Extension, Json,
    extract::{Path, State},
};
use tracing::debug;

use bridge_social::PresenceTracker;
use bridge_types::api::{Claims, HeartbeatResponse};
use bridge_types::models::{AccountId, Presence};

use crate::error::{ApiResult, run_blocking};
use crate::state::AppState;

/// Best-effort activity record for read endpoints. Must run on a blocking
/// thread.
pub(crate) fn record_activity(presence: &PresenceTracker, user_id: AccountId) {
    if let Err(e) = presence.touch(user_id) {
        debug!("Activity for {} not recorded: {}", user_id, e);
    }
}

pub async fn heartbeat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<HeartbeatResponse>> {
    let timestamp = run_blocking(move || state.presence.touch(claims.sub)).await?;
    Ok(Json(HeartbeatResponse {
        status: "ok".into(),
        timestamp,
    }))
}

pub async fn user_status(
    State(state): State<AppState>,
    Path(user_id): Path<AccountId>,
) -> ApiResult<Json<Presence>> {
    let presence = run_blocking(move || state.presence.status(user_id)).await?;
    Ok(Json(presence))
}

pub async fn bulk_status(
    State(state): State<AppState>,
    Json(user_ids): Json<Vec<AccountId>>,
) -> ApiResult<Json<Vec<Presence>>> {
    let statuses = run_blocking(move || state.presence.bulk_status(&user_ids)).await?;
    Ok(Json(statuses))
}
