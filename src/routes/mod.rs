pub mod auth;
pub mod health;
pub mod todos;

use actix_web::{
    error::{JsonPayloadError, PathError},
    web, HttpRequest,
};

use crate::{auth::AuthMiddleware, error::AppError};

/// Mounts the `/api/v1` routes.
///
/// `signup` and `login` are public; the todo scopes sit behind
/// `AuthMiddleware`. Expects `web::Data<PgPool>` and
/// `web::Data<TokenService>` to be registered on the app.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(path_config())
            .service(auth::signup)
            .service(auth::login)
            .service(
                web::scope("/todos")
                    .wrap(AuthMiddleware)
                    .service(todos::create_todo)
                    .service(todos::update_todo)
                    .service(todos::delete_todo),
            )
            .service(
                web::scope("/user_todos")
                    .wrap(AuthMiddleware)
                    .service(todos::get_user_todos),
            ),
    );
}

/// JSON extractor settings that report bad bodies as `{"error": ...}`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        AppError::BadRequest(err.to_string()).into()
    })
}

/// Path extractor settings; an id segment that does not parse is a
/// `400 {"error": ...}` instead of actix's plain-text 404.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: PathError, req: &HttpRequest| {
        log::debug!("unparseable path {}: {}", req.path(), err);
        AppError::BadRequest(format!("Invalid path parameter: {}", err)).into()
    })
}
