use crate::{
    auth::{hash_password, verify_password, AuthResponse, LoginRequest, SignupRequest, TokenService},
    error::AppError,
    models::User,
};
use actix_web::{post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Sign up
///
/// Creates a user account and returns a token for it, so a client can start
/// using the protected routes right away.
#[post("/signup")]
pub async fn signup(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    signup_data: web::Json<SignupRequest>,
) -> Result<impl Responder, AppError> {
    let mut signup_data = signup_data.into_inner();
    signup_data.prepare();
    signup_data.validate()?;

    let existing_user = sqlx::query_as::<_, (i64,)>(
        "SELECT id FROM users WHERE email = $1 OR username = $2",
    )
    .bind(&signup_data.email)
    .bind(&signup_data.username)
    .fetch_optional(&**pool)
    .await?;

    if existing_user.is_some() {
        return Err(AppError::BadRequest(
            "Username or email already registered".into(),
        ));
    }

    let password_hash = hash_password(&signup_data.password)?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, email, password) VALUES ($1, $2, $3)
         RETURNING id, username, email, password, created_at, updated_at",
    )
    .bind(&signup_data.username)
    .bind(&signup_data.email)
    .bind(password_hash)
    .fetch_one(&**pool)
    .await?;

    let user_id = user.subject_id()?;
    let token = tokens.issue_token(user_id)?;
    log::info!("registered user {}", user_id);

    Ok(HttpResponse::Created().json(AuthResponse { token, user_id }))
}

/// Log in
///
/// Exchanges an email and password for a token. Unknown emails and wrong
/// passwords get the same response.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let mut login_data = login_data.into_inner();
    login_data.prepare();
    login_data.validate()?;

    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password, created_at, updated_at FROM users WHERE email = $1",
    )
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    match user {
        Some(user) if verify_password(&login_data.password, &user.password) => {
            let user_id = user.subject_id()?;
            let token = tokens.issue_token(user_id)?;
            Ok(HttpResponse::Ok().json(AuthResponse { token, user_id }))
        }
        _ => Err(AppError::Unauthorized("Invalid credentials".into())),
    }
}
