use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// A row of the `users` table.
///
/// `password` holds the bcrypt hash and is never serialized; clients see
/// [`UserProfile`] instead.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, embedded as the `author` of todos.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: u32,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The identifier carried in tokens.
    ///
    /// Row ids come from a `BIGSERIAL`, tokens carry 32 bits; an id past that
    /// range cannot be issued a token.
    pub fn subject_id(&self) -> Result<u32, AppError> {
        u32::try_from(self.id).map_err(|_| {
            AppError::InternalServerError(format!("user id {} does not fit a token", self.id))
        })
    }

    pub fn profile(&self) -> Result<UserProfile, AppError> {
        Ok(UserProfile {
            id: self.subject_id()?,
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
