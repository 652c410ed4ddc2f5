use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use bridge_gateway::verify_token;
use bridge_social::SocialError;

use crate::error::ApiError;
use crate::state::AppState;

/// Extract and validate the bearer token, then expose its `Claims` to the
/// handler as a request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError(SocialError::Unauthenticated))?;

    let claims =
        verify_token(&state.jwt_secret, token).ok_or(ApiError(SocialError::Unauthenticated))?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
