use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User record as stored and as returned by the CRUD routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub password: String, // always an Argon2 PHC string once persisted
    pub email: String,
    pub phone_number: i64,
    pub city: String,
}

/// The five mutable fields of a user.
#[derive(Debug, Clone, Deserialize)]
pub struct UserFields {
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone_number: i64,
    pub city: String,
}

impl User {
    pub fn new(id: Uuid, fields: UserFields) -> Self {
        Self {
            id,
            username: fields.username,
            password: fields.password,
            email: fields.email,
            phone_number: fields.phone_number,
            city: fields.city,
        }
    }
}
