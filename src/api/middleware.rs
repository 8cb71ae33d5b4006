//! Login middleware: resolves the session token to the requesting user.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use super::AppState;
use crate::view::RequestContext;

/// Require a valid session. The resolved [`RequestContext`] is added to the
/// request extensions for handlers to pick up.
pub async fn require_login(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = match bearer_token(&request) {
        Ok(token) => token.to_string(),
        Err(reason) => {
            tracing::warn!("Rejected request: {}", reason);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    let session = state.db.get_session(&token).map_err(|e| {
        tracing::error!("Session lookup failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match session {
        Some(session) => {
            request.extensions_mut().insert(RequestContext::from(session));
            Ok(next.run(request).await)
        }
        None => {
            tracing::warn!("Unknown session token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

fn bearer_token(request: &Request<Body>) -> Result<&str, &'static str> {
    let header = request
        .headers()
        .get("Authorization")
        .ok_or("missing Authorization header")?
        .to_str()
        .map_err(|_| "unreadable Authorization header")?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or("invalid Authorization header format")
}
