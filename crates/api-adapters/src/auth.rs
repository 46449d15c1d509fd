//! Bearer-token guard for the management API.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

/// Extracts the token from an `Authorization: Bearer <token>` header.
/// Spaces after the scheme are skipped; the token itself is taken verbatim.
pub fn extract_bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim_start_matches(' ');
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

pub async fn require_api_token(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Owned so no borrow of the request is held across the await.
    let Some(token) = extract_bearer_token(&req).map(str::to_owned) else {
        return Err(ApiError::Unauthorized);
    };
    if !state.auth.verify_api_token(&token).await {
        tracing::warn!(path = %req.uri().path(), "rejected API token");
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(req).await)
}
