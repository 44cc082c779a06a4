use std::future::Future;

use tracing::{error, info};
use uuid::Uuid;

use crate::{
    auth::services::hash_password,
    error::ApiError,
    state::AppState,
    users::{
        repo::StoreError,
        repo_types::{User, UserFields},
    },
};

/// Every store call is bounded by the configured timeout.
async fn timed<T, F>(state: &AppState, op: &'static str, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(state.config.store_timeout(), fut).await {
        Ok(res) => res,
        Err(_) => {
            error!(op, timeout_ms = state.config.store_timeout_ms, "store call timed out");
            Err(StoreError::Timeout)
        }
    }
}

async fn with_hashed_password(
    state: &AppState,
    mut fields: UserFields,
) -> Result<UserFields, ApiError> {
    fields.password = hash_password(state, fields.password).await?;
    Ok(fields)
}

/// The only write path for new users; the password is always hashed first.
pub async fn create_user(state: &AppState, fields: UserFields) -> Result<User, ApiError> {
    let fields = with_hashed_password(state, fields).await?;
    let user = User::new(Uuid::new_v4(), fields);
    timed(state, "insert", state.store.insert(&user)).await?;
    info!(user_id = %user.id, username = %user.username, "user created");
    Ok(user)
}

pub async fn find_by_username(state: &AppState, username: &str) -> Result<Option<User>, ApiError> {
    Ok(timed(state, "find_by_username", state.store.find_by_username(username)).await?)
}

pub async fn list_users(state: &AppState) -> Result<Vec<User>, ApiError> {
    Ok(timed(state, "list", state.store.list()).await?)
}

pub async fn update_user(state: &AppState, id: Uuid, fields: UserFields) -> Result<User, ApiError> {
    let fields = with_hashed_password(state, fields).await?;
    let user = timed(state, "replace", state.store.replace(id, &fields))
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(user_id = %user.id, "user updated");
    Ok(user)
}

pub async fn delete_user(state: &AppState, id: Uuid) -> Result<User, ApiError> {
    let user = timed(state, "delete", state.store.delete(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(user_id = %user.id, "user deleted");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(username: &str, password: &str) -> UserFields {
        UserFields {
            username: username.into(),
            password: password.into(),
            email: format!("{username}@example.com"),
            phone_number: 9876543210,
            city: "Pune".into(),
        }
    }

    #[tokio::test]
    async fn create_user_stores_hash_not_plaintext() {
        let state = AppState::fake();
        let user = create_user(&state, fields("alice", "pw1")).await.unwrap();
        assert_ne!(user.password, "pw1");
        assert!(state.hasher.verify("pw1", &user.password).unwrap());

        let stored = find_by_username(&state, "alice").await.unwrap().unwrap();
        assert_eq!(stored, user);
    }

    #[tokio::test]
    async fn update_user_rehashes_password() {
        let state = AppState::fake();
        let user = create_user(&state, fields("alice", "pw1")).await.unwrap();
        let updated = update_user(&state, user.id, fields("alice", "pw2"))
            .await
            .unwrap();
        assert_eq!(updated.id, user.id);
        assert!(state.hasher.verify("pw2", &updated.password).unwrap());
        assert!(!state.hasher.verify("pw1", &updated.password).unwrap());
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let state = AppState::fake();
        let err = update_user(&state, Uuid::new_v4(), fields("x", "y"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
        let err = delete_user(&state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
        assert!(list_users(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_create_with_same_username_is_duplicate() {
        let state = AppState::fake();
        create_user(&state, fields("alice", "pw1")).await.unwrap();
        let err = create_user(&state, fields("alice", "pw2")).await.unwrap_err();
        assert!(matches!(err, ApiError::Duplicate));
        assert_eq!(list_users(&state).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn slow_store_call_times_out() {
        let state = AppState::fake();
        let res: Result<(), StoreError> = timed(&state, "sleep", async {
            tokio::time::sleep(state.config.store_timeout() * 2).await;
            Ok(())
        })
        .await;
        assert!(matches!(res, Err(StoreError::Timeout)));
    }
}
