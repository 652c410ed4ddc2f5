use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use bridge_social::{ErrorKind, SocialError};
use bridge_types::api::{Claims, MessageResponse, SendMessageRequest};
use bridge_types::models::{AccountId, ConnectionPreview, ConversationSummary};

use crate::error::{ApiResult, run_blocking};
use crate::presence::record_activity;
use crate::state::AppState;

/// Chat sidebar: accepted connections with their latest message.
pub async fn chat_connections(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<ConnectionPreview>>> {
    let previews =
        run_blocking(move || state.aggregator.connections_with_preview(claims.sub)).await?;
    Ok(Json(previews))
}

/// Everyone the caller has exchanged messages with, connected or not.
pub async fn conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<ConversationSummary>>> {
    let summaries = run_blocking(move || {
        record_activity(&state.presence, claims.sub);
        state.aggregator.conversations(claims.sub)
    })
    .await?;
    Ok(Json(summaries))
}

pub async fn history(
    State(state): State<AppState>,
    Path(other_id): Path<AccountId>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<MessageResponse>>> {
    let me = claims.sub;
    let messages: Vec<MessageResponse> = run_blocking(move || {
        record_activity(&state.presence, me);
        let messages = state.messaging.history(me, other_id)?;
        let names: HashMap<AccountId, String> = state
            .directory
            .find_many(&[me, other_id])?
            .into_iter()
            .map(|a| (a.id, a.display_name))
            .collect();
        let name_of = |id: AccountId| names.get(&id).map(String::as_str).unwrap_or_default();

        Ok(messages
            .iter()
            .map(|m| MessageResponse::new(m, name_of(m.sender_id), name_of(m.receiver_id)))
            .collect())
    })
    .await?;
    Ok(Json(messages))
}

/// Stores the message and pushes it to the recipient's live channel.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let me = claims.sub;
    let message = run_blocking(move || {
        let sent = state
            .messaging
            .send(me, req.recipient_id, &req.content, req.event_id)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SocialError::InvalidInput("Invalid user".into()),
                _ => e,
            })?;
        record_activity(&state.presence, me);
        Ok(sent)
    })
    .await?;
    Ok(Json(message))
}
