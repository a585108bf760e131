use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::{AppError, UNAUTHORIZED_MESSAGE};

/// The acting user of a request, decoded once from its bearer token.
///
/// `AuthMiddleware` inserts this into request extensions after the token
/// verifies; handlers on protected scopes take it as an argument and scope
/// every query to [`AuthenticatedUser::subject_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub u32);

impl AuthenticatedUser {
    pub fn subject_id(&self) -> u32 {
        self.0
    }

    /// Fails with `Forbidden` unless `owner_id` is the acting user.
    pub fn ensure_owns(&self, owner_id: i64) -> Result<(), AppError> {
        if i64::from(self.0) == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Resource belongs to another user".into(),
            ))
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().copied() {
            Some(user) => ready(Ok(user)),
            None => {
                // Reached only when a handler is mounted outside the middleware.
                log::error!(
                    "no authenticated user in request extensions for {}",
                    req.path()
                );
                ready(Err(
                    AppError::Unauthorized(UNAUTHORIZED_MESSAGE.into()).into()
                ))
            }
        }
    }
}
