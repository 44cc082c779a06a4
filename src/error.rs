use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{
    auth::{jwt::TokenError, password::CryptoError},
    users::repo::StoreError,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("User not found")]
    NotFound,

    #[error("User already exists")]
    Duplicate,

    #[error("Invalid password")]
    InvalidCredentials,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => ApiError::Duplicate,
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            // plain text, unlike every other error body
            ApiError::Duplicate => {
                return (StatusCode::BAD_REQUEST, "User already exists").into_response()
            }
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid password".to_string())
            }
            ApiError::Token(TokenError::Missing) => (
                StatusCode::UNAUTHORIZED,
                "Access token not provided".to_string(),
            ),
            ApiError::Token(_) => (
                StatusCode::FORBIDDEN,
                "Invalid or expired token".to_string(),
            ),
            ApiError::Store(_) | ApiError::Crypto(_) | ApiError::Internal(_) => {
                error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// `Json` extractor whose rejections render as [`ApiError::Validation`].
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        Ok(AppJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn render(err: ApiError) -> (StatusCode, String) {
        let res = err.into_response();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn token_errors_split_between_401_and_403() {
        let (status, body) = render(TokenError::Missing.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, r#"{"error":"Access token not provided"}"#);

        for err in [TokenError::Expired, TokenError::Invalid] {
            let (status, body) = render(err.into()).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
            assert_eq!(body, r#"{"error":"Invalid or expired token"}"#);
        }
    }

    #[tokio::test]
    async fn duplicate_renders_plain_text() {
        let res = ApiError::Duplicate.into_response();
        let content_type = res.headers()[axum::http::header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("text/plain"));
        let (status, body) = render(ApiError::Duplicate).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "User already exists");
    }

    #[tokio::test]
    async fn store_duplicate_maps_to_duplicate() {
        assert!(matches!(
            ApiError::from(StoreError::Duplicate),
            ApiError::Duplicate
        ));
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        let (status, body) =
            render(StoreError::Database("relation \"users\" does not exist".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"error":"Internal Server Error"}"#);

        let (_, body) = render(StoreError::Timeout.into()).await;
        assert!(!body.contains("timed out"));
    }
}
