use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::claims::Claims;
use crate::{config::JwtConfig, state::AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("access token not provided")]
    Missing,

    #[error("token expired")]
    Expired,

    #[error("invalid token")]
    Invalid,
}

/// HS256 signing and verification keys with the token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: Duration::minutes(cfg.ttl_minutes),
        }
    }

    pub fn issue(&self, username: &str) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(username, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(
        &self,
        username: &str,
        now: OffsetDateTime,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let exp = now + self.ttl;
        let claims = Claims {
            username: username.to_owned(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(username = %username, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => {
                debug!(username = %data.claims.username, "jwt verified");
                Ok(data.claims)
            }
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => {
                    debug!(error = %e, "jwt rejected");
                    Err(TokenError::Invalid)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, ttl_minutes: i64) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            ttl_minutes,
        })
    }

    #[test]
    fn sign_and_verify_returns_claims() {
        let keys = make_keys("dev-secret", 30);
        let token = keys.issue("alice").expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn default_lifetime_is_thirty_days() {
        let keys = make_keys("dev-secret", 60 * 24 * 30);
        let claims = keys.verify(&keys.issue("alice").unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 60 * 60);
    }

    #[test]
    fn verify_reports_expired_after_ttl() {
        let keys = make_keys("dev-secret", 1);
        let issued = OffsetDateTime::now_utc() - Duration::minutes(5);
        let token = keys.issue_at("alice", issued).unwrap();
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn verify_rejects_other_secret() {
        let token = make_keys("secret-a", 30).issue("alice").unwrap();
        let err = make_keys("secret-b", 30).verify(&token).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[test]
    fn verify_rejects_tampered_token() {
        let keys = make_keys("dev-secret", 30);
        let token = keys.issue("alice").unwrap();

        // flip the first character of each segment
        let segments: Vec<&str> = token.split('.').collect();
        for (i, _) in segments.iter().enumerate() {
            let mut parts: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
            let first = parts[i].remove(0);
            let swapped = if first == 'A' { 'B' } else { 'A' };
            parts[i].insert(0, swapped);
            let tampered = parts.join(".");
            assert_eq!(keys.verify(&tampered).unwrap_err(), TokenError::Invalid);
        }
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys("dev-secret", 30);
        assert_eq!(keys.verify("not-a-jwt").unwrap_err(), TokenError::Invalid);
        assert_eq!(keys.verify("").unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn signature_is_checked_before_expiry() {
        let issued = OffsetDateTime::now_utc() - Duration::minutes(5);
        let token = make_keys("secret-a", 1).issue_at("alice", issued).unwrap();
        let err = make_keys("secret-b", 1).verify(&token).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }
}
