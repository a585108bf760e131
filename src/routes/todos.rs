use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{ToDo, ToDoInput, ToDoResponse, User, UserProfile, USER_TODOS_LIMIT},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

const TODO_COLUMNS: &str = "id, title, content, author_id, created_at, updated_at";

async fn fetch_author(pool: &PgPool, author_id: i64) -> Result<UserProfile, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(author_id)
    .fetch_one(pool)
    .await?;
    user.profile()
}

/// Loads a todo and checks that the acting user owns it.
///
/// Missing todos are `NotFound`; todos of other users are `Forbidden`.
async fn fetch_owned_todo(
    pool: &PgPool,
    user: &AuthenticatedUser,
    todo_id: i64,
) -> Result<ToDo, AppError> {
    let todo = sqlx::query_as::<_, ToDo>(&format!(
        "SELECT {} FROM todos WHERE id = $1",
        TODO_COLUMNS
    ))
    .bind(todo_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("ToDo not found".into()))?;

    user.ensure_owns(todo.author_id)?;
    Ok(todo)
}

/// Creates a todo owned by the authenticated user.
///
/// ## Responses:
/// - `201 Created`: the new todo with its `author`.
/// - `401 Unauthorized`: missing or invalid token.
/// - `409 Conflict`: a todo with this title already exists.
/// - `422 Unprocessable Entity`: blank title or content, or title over 100 characters.
#[post("")]
pub async fn create_todo(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    todo_data: web::Json<ToDoInput>,
) -> Result<impl Responder, AppError> {
    let mut input = todo_data.into_inner();
    input.prepare();
    input.validate()?;

    let todo = sqlx::query_as::<_, ToDo>(&format!(
        "INSERT INTO todos (title, content, author_id) VALUES ($1, $2, $3) RETURNING {}",
        TODO_COLUMNS
    ))
    .bind(&input.title)
    .bind(&input.content)
    .bind(i64::from(user.subject_id()))
    .fetch_one(&**pool)
    .await?;

    let author = fetch_author(&pool, todo.author_id).await?;
    Ok(HttpResponse::Created().json(ToDoResponse { todo, author }))
}

/// Replaces the title and content of a todo the authenticated user owns.
///
/// ## Responses:
/// - `200 OK`: the updated todo.
/// - `403 Forbidden`: the todo belongs to someone else.
/// - `404 Not Found`: no todo with this id.
#[put("/{id}")]
pub async fn update_todo(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    todo_id: web::Path<i64>,
    todo_data: web::Json<ToDoInput>,
) -> Result<impl Responder, AppError> {
    let mut input = todo_data.into_inner();
    input.prepare();
    input.validate()?;

    let existing = fetch_owned_todo(&pool, &user, todo_id.into_inner()).await?;

    let todo = sqlx::query_as::<_, ToDo>(&format!(
        "UPDATE todos SET title = $1, content = $2, updated_at = NOW()
         WHERE id = $3 AND author_id = $4
         RETURNING {}",
        TODO_COLUMNS
    ))
    .bind(&input.title)
    .bind(&input.content)
    .bind(existing.id)
    .bind(existing.author_id)
    .fetch_one(&**pool)
    .await?;

    let author = fetch_author(&pool, todo.author_id).await?;
    Ok(HttpResponse::Ok().json(ToDoResponse { todo, author }))
}

/// Deletes a todo the authenticated user owns.
///
/// ## Responses:
/// - `200 OK`: `{"deleted": <id>}`.
/// - `403 Forbidden`: the todo belongs to someone else.
/// - `404 Not Found`: no todo with this id.
#[delete("/{id}")]
pub async fn delete_todo(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    todo_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let existing = fetch_owned_todo(&pool, &user, todo_id.into_inner()).await?;

    let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND author_id = $2")
        .bind(existing.id)
        .bind(existing.author_id)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("ToDo not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "deleted": existing.id })))
}

/// Lists the newest todos of a user, at most `USER_TODOS_LIMIT`.
///
/// The path id must be the authenticated user; asking for anyone else's list
/// is `403 Forbidden`.
#[get("/{id}")]
pub async fn get_user_todos(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    user_id: web::Path<u32>,
) -> Result<impl Responder, AppError> {
    let requested = user_id.into_inner();
    if requested != user.subject_id() {
        log::debug!(
            "user {} asked for the todos of user {}",
            user.subject_id(),
            requested
        );
        return Err(AppError::Forbidden(
            "Cannot list another user's todos".into(),
        ));
    }

    let author_id = i64::from(requested);
    let todos = sqlx::query_as::<_, ToDo>(&format!(
        "SELECT {} FROM todos WHERE author_id = $1 ORDER BY created_at DESC LIMIT $2",
        TODO_COLUMNS
    ))
    .bind(author_id)
    .bind(USER_TODOS_LIMIT)
    .fetch_all(&**pool)
    .await?;

    let response: Vec<ToDoResponse> = if todos.is_empty() {
        Vec::new()
    } else {
        let author = fetch_author(&pool, author_id).await?;
        todos
            .into_iter()
            .map(|todo| ToDoResponse {
                todo,
                author: author.clone(),
            })
            .collect()
    };

    Ok(HttpResponse::Ok().json(response))
}
