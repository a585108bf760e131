use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::user::UserProfile;
use crate::security::prepare_text;

/// Upper bound on the number of todos returned for one user.
pub const USER_TODOS_LIMIT: i64 = 100;

/// A row of the `todos` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct ToDo {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Owner of the todo; references `users.id`.
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of create and update requests.
///
/// The author is never taken from the body; it is always the acting user.
#[derive(Debug, Deserialize, Validate)]
pub struct ToDoInput {
    #[validate(length(min = 1, max = 100, message = "Required Title"))]
    pub title: String,
    #[validate(length(min = 1, message = "Required Content"))]
    pub content: String,
}

impl ToDoInput {
    /// Trims and escapes both fields; call before `validate`.
    pub fn prepare(&mut self) {
        self.title = prepare_text(&self.title);
        self.content = prepare_text(&self.content);
    }
}

/// A todo as returned by the API, with its author embedded.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToDoResponse {
    #[serde(flatten)]
    pub todo: ToDo,
    pub author: UserProfile,
}
