use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::{
    claims::Claims,
    jwt::{JwtKeys, TokenError},
};
use crate::error::ApiError;

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(TokenError::Missing)?;

    // token is the second space-separated field; extra spaces leave it empty
    let mut fields = value.split(' ');
    let scheme = fields.next().unwrap_or_default();
    let token = fields.next().unwrap_or_default();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(TokenError::Missing);
    }
    Ok(token)
}

pub fn authenticate(headers: &HeaderMap, keys: &JwtKeys) -> Result<Claims, TokenError> {
    let token = bearer_token(headers)?;
    keys.verify(token)
}

/// Rejects the request unless it carries a valid token; on success the
/// [`Claims`] are available to the handler as a request extension.
pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = match authenticate(req.headers(), &keys) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, path = %req.uri().path(), "request not authenticated");
            return Err(e.into());
        }
    };
    debug!(username = %claims.username, "request authenticated");
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer abc")), Ok("abc"));
    }

    #[test]
    fn absent_or_malformed_header_is_missing() {
        assert_eq!(bearer_token(&HeaderMap::new()), Err(TokenError::Missing));
        assert_eq!(bearer_token(&headers("Bearer")), Err(TokenError::Missing));
        assert_eq!(bearer_token(&headers("Bearer ")), Err(TokenError::Missing));
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwdw==")), Err(TokenError::Missing));
    }

    #[test]
    fn extra_spaces_before_token_leave_it_missing() {
        assert_eq!(bearer_token(&headers("Bearer   abc.def.ghi")), Err(TokenError::Missing));
        assert_eq!(bearer_token(&headers("Bearer abc extra")), Ok("abc"));
    }
}
