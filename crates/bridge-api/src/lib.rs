//! REST surface for connections, presence and chat.

pub mod connections;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod presence;
pub mod state;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

pub use error::{ApiError, ApiResult};
pub use state::{AppState, AppStateInner};

/// Every route here requires a bearer token.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Connections
        .route("/api/users/connect/{receiver_id}", post(connections::send_request))
        .route("/api/users/connection/{request_id}/respond", post(connections::respond))
        .route("/api/users/connection-requests", get(connections::pending_requests))
        .route("/api/users/sent-requests", get(connections::sent_requests))
        .route("/api/users/connections", get(connections::active_connections))
        .route("/api/users/disconnect/{user_id}", post(connections::disconnect))
        .route("/api/users/connection-status/{other_id}", get(connections::connection_status))
        // Presence
        .route("/api/users/heartbeat", post(presence::heartbeat))
        .route("/api/users/{user_id}/status", get(presence::user_status))
        .route("/api/users/status/bulk", post(presence::bulk_status))
        // Chat
        .route("/api/chat/connections", get(messages::chat_connections))
        .route("/api/messages", get(messages::conversations).post(messages::send_message))
        .route("/api/messages/{user_id}", get(messages::history))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state)
}
