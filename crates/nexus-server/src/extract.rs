use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use tracing::debug;

use nexus_core::Principal;

use crate::error::ApiError;
use crate::server::AppState;
use crate::session::SessionToken;

/// `Authorization: Bearer <token>`, if present and well-formed.
pub fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| SessionToken::from(token))
}

/// Resolve a token to the current directory entry. A token whose user has
/// been deleted is revoked on the way out.
pub async fn resolve_principal(state: &AppState, token: &SessionToken) -> Result<Principal, ApiError> {
    let user_id = state
        .sessions
        .resolve(token)
        .ok_or_else(ApiError::unauthenticated)?;
    match state.desk_call(move |desk| desk.principal(user_id)).await {
        Err(e) if e.status() == StatusCode::UNAUTHORIZED => {
            debug!(user_id = %user_id, "session for deleted user");
            state.sessions.revoke(token);
            Err(e)
        }
        result => result,
    }
}

/// The authenticated caller of a request.
pub struct Caller {
    pub principal: Principal,
    pub token: SessionToken,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(ApiError::unauthenticated)?;
        let principal = resolve_principal(state, &token).await?;
        Ok(Caller { principal, token })
    }
}
