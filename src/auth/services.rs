use tracing::error;

use crate::{error::ApiError, state::AppState};

/// Argon2 is CPU-bound; both calls run on the blocking pool.
pub async fn hash_password(state: &AppState, plain: String) -> Result<String, ApiError> {
    let hasher = state.hasher.clone();
    let hash = tokio::task::spawn_blocking(move || hasher.hash(&plain))
        .await
        .map_err(|e| {
            error!(error = %e, "hash_password task failed");
            ApiError::Internal(e.to_string())
        })??;
    Ok(hash)
}

pub async fn verify_password(
    state: &AppState,
    plain: String,
    hash: String,
) -> Result<bool, ApiError> {
    let hasher = state.hasher.clone();
    let ok = tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
        .await
        .map_err(|e| {
            error!(error = %e, "verify_password task failed");
            ApiError::Internal(e.to_string())
        })??;
    Ok(ok)
}
