use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put, MethodRouter},
    Extension, Json, Router,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    auth::{claims::Claims, middleware::require_auth},
    error::{ApiError, AppJson},
    state::AppState,
    users::{
        repo_types::{User, UserFields},
        services,
    },
};

/// Read-all is always guarded; create/update/delete only when
/// `guard_mutations` is set.
pub fn user_routes(state: &AppState) -> Router<AppState> {
    let guard = middleware::from_fn_with_state(state.clone(), require_auth);
    let guard_mutations = state.config.guard_mutations;
    let mutation = |route: MethodRouter<AppState>| {
        if guard_mutations {
            route.route_layer(guard.clone())
        } else {
            route
        }
    };

    Router::new()
        .route(
            "/getusers/",
            get(list_users)
                .route_layer(guard.clone())
                .merge(mutation(post(create_user))),
        )
        .route(
            "/getusers/:id",
            mutation(put(update_user).delete(delete_user)),
        )
}

/// Ids that are not UUIDs cannot exist in the store.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UserFields>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = services::create_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, claims))]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = services::list_users(&state).await?;
    debug!(requested_by = %claims.username, count = users.len(), "users listed");
    Ok(Json(users))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UserFields>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id(&id)?;
    let user = services::update_user(&state, id, payload).await?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<&'static str>, ApiError> {
    let id = parse_id(&id)?;
    services::delete_user(&state, id).await?;
    Ok(Json("User deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_uuid_ids_are_not_found() {
        assert!(matches!(parse_id("65f1c0ffee"), Err(ApiError::NotFound)));
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn user_serializes_with_underscore_id() {
        let user = User {
            id: Uuid::nil(),
            username: "alice".into(),
            password: "$argon2id$...".into(),
            email: "alice@example.com".into(),
            phone_number: 123,
            city: "Oslo".into(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["_id"], Uuid::nil().to_string());
        assert_eq!(json["phone_number"], 123);
        assert!(json.get("id").is_none());
    }
}
