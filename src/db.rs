//! Schema setup and demo data.

use sqlx::PgPool;

use crate::{auth::hash_password, error::AppError};

const CREATE_USERS: &str = "CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    username VARCHAR(255) NOT NULL UNIQUE,
    email VARCHAR(100) NOT NULL UNIQUE,
    password VARCHAR(100) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

const CREATE_TODOS: &str = "CREATE TABLE IF NOT EXISTS todos (
    id BIGSERIAL PRIMARY KEY,
    title VARCHAR(100) NOT NULL UNIQUE,
    content TEXT NOT NULL,
    author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE ON UPDATE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

const CREATE_TODOS_AUTHOR_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS todos_author_created_idx ON todos (author_id, created_at DESC)";

/// Demo accounts, each owning the todo at the same position in `SEED_TODOS`.
const SEED_USERS: [(&str, &str, &str); 2] = [
    ("stev", "stev@gmail.com", "stev123"),
    ("martin", "martin@gmail.com", "martin123"),
];

const SEED_TODOS: [(&str, &str); 2] = [
    ("Dance class", "I have to find dance class near me"),
    ("Coding", "I have to learn coding"),
];

/// Creates the `users` and `todos` tables when they do not exist yet.
pub async fn migrate(pool: &PgPool) -> Result<(), AppError> {
    for statement in [CREATE_USERS, CREATE_TODOS, CREATE_TODOS_AUTHOR_INDEX] {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Drops both tables, recreates them and loads the demo users and todos.
///
/// Destroys all existing data; only runs when `SEED_DATABASE` is enabled.
pub async fn seed(pool: &PgPool) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    sqlx::query("DROP TABLE IF EXISTS todos, users")
        .execute(&mut *tx)
        .await?;
    for statement in [CREATE_USERS, CREATE_TODOS, CREATE_TODOS_AUTHOR_INDEX] {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    let demo_rows = SEED_USERS.into_iter().zip(SEED_TODOS);
    for ((username, email, password), (title, content)) in demo_rows {
        let (user_id,) = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO users (username, email, password) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(username)
        .bind(email)
        .bind(hash_password(password)?)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO todos (title, content, author_id) VALUES ($1, $2, $3)")
            .bind(title)
            .bind(content)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    log::info!("seeded {} users with one todo each", SEED_USERS.len());
    Ok(())
}
