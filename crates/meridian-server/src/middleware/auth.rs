//! Presence-only authentication middleware.
//!
//! Identity extraction, token issuance, and validation happen upstream of
//! this service; the middleware only checks that an identity was published
//! on the request — either as a bearer token or as the configured session
//! cookie — and rejects protected routes that carry neither.

use axum::{
    extract::{Request, State},
    http::header::{AUTHORIZATION, COOKIE},
    middleware::Next,
    response::Response,
};

use crate::{error::ServerError, state::AppState};

/// Rejects the request with `ServerError::Unauthorized` unless an identity
/// is present, either as `Authorization: Bearer <token>` or as the
/// configured session cookie.
pub async fn require_identity(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if !state.config().auth.enabled {
        return Ok(next.run(req).await);
    }

    if !has_identity(&req, &state.config().auth.identity_cookie_name) {
        return Err(ServerError::Unauthorized);
    }

    Ok(next.run(req).await)
}

fn has_identity(req: &Request, cookie_name: &str) -> bool {
    if req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|v| v.starts_with("Bearer "))
        .unwrap_or(false)
    {
        return true;
    }

    req.headers()
        .get(COOKIE)
        .and_then(|h| h.to_str().ok())
        .map(|cookies| cookie_header_has(cookies, cookie_name))
        .unwrap_or(false)
}

fn cookie_header_has(cookie_header: &str, name: &str) -> bool {
    cookie_header
        .split(';')
        .map(str::trim)
        .filter_map(|pair| pair.split_once('='))
        .any(|(k, _)| k == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_header_matches_the_named_cookie_among_several() {
        assert!(cookie_header_has("a=1; meridian_session=abc; b=2", "meridian_session"));
        assert!(!cookie_header_has("a=1; b=2", "meridian_session"));
    }

    #[test]
    fn cookie_header_ignores_leading_whitespace() {
        assert!(cookie_header_has("a=1;  meridian_session=abc", "meridian_session"));
    }
}
