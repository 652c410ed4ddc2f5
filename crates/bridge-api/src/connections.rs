use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use bridge_social::{RequestParties, SocialError};
use bridge_types::api::{
    AccountSummary, Claims, ConnectionRequestResponse, RespondQuery, StatusMessage,
};
use bridge_types::models::{AccountId, ConnectionStatus};

use crate::error::{ApiResult, run_blocking};
use crate::state::AppState;

fn to_response(parties: &RequestParties) -> ConnectionRequestResponse {
    ConnectionRequestResponse::new(&parties.request, &parties.sender, &parties.receiver)
}

pub async fn send_request(
    State(state): State<AppState>,
    Path(receiver_id): Path<AccountId>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<StatusMessage>> {
    run_blocking(move || state.connections.send_request(claims.sub, receiver_id)).await?;
    Ok(Json(StatusMessage::new("Connection request sent")))
}

/// Only the receiver of a request may answer it. Anyone else sees it as
/// not found.
pub async fn respond(
    State(state): State<AppState>,
    Path(request_id): Path<i64>,
    Query(query): Query<RespondQuery>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<StatusMessage>> {
    let accept = query.accept;
    run_blocking(move || {
        match state.connections.find_request(request_id)? {
            Some(request) if request.receiver_id == claims.sub => {}
            _ => return Err(SocialError::NotFound("Request")),
        }
        state.connections.respond(request_id, accept)
    })
    .await?;

    Ok(Json(StatusMessage::new(if accept {
        "Connection Accepted"
    } else {
        "Connection Rejected"
    })))
}

pub async fn pending_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<ConnectionRequestResponse>>> {
    let pending = run_blocking(move || state.connections.list_pending(claims.sub)).await?;
    Ok(Json(pending.iter().map(to_response).collect()))
}

pub async fn sent_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<ConnectionRequestResponse>>> {
    let sent = run_blocking(move || state.connections.list_sent(claims.sub)).await?;
    Ok(Json(sent.iter().map(to_response).collect()))
}

pub async fn active_connections(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<AccountSummary>>> {
    let accounts =
        run_blocking(move || state.connections.list_active_connections(claims.sub)).await?;
    Ok(Json(accounts.iter().map(AccountSummary::from).collect()))
}

/// Removes an accepted connection or cancels a pending request. Removing
/// nothing is not an error.
pub async fn disconnect(
    State(state): State<AppState>,
    Path(user_id): Path<AccountId>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<StatusMessage>> {
    run_blocking(move || state.connections.disconnect(claims.sub, user_id)).await?;
    Ok(Json(StatusMessage::new("Connection removed")))
}

pub async fn connection_status(
    State(state): State<AppState>,
    Path(other_id): Path<AccountId>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<ConnectionStatus>> {
    let status = run_blocking(move || state.connections.status(claims.sub, other_id)).await?;
    Ok(Json(status))
}
