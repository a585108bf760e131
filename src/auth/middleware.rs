use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::{extract_token, TokenError, TokenService};
use crate::error::AppError;

/// Rejects requests without a valid bearer token.
///
/// Wrap it around the scopes that need authentication. It reads the
/// `TokenService` from application data, decodes the token once and stores the
/// resulting `AuthenticatedUser` in request extensions. Failed requests never
/// reach the wrapped service.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(tokens) = req.app_data::<web::Data<TokenService>>() else {
            log::error!("TokenService is not registered as app data");
            let app_err = AppError::InternalServerError("Authentication unavailable".into());
            return Box::pin(async move { Err(app_err.into()) });
        };

        let token = extract_token(req.request());

        match tokens.authenticate(&token) {
            Ok(user) => {
                req.extensions_mut().insert(user);
                Box::pin(self.service.call(req))
            }
            Err(token_err) => {
                match &token_err {
                    TokenError::UnexpectedAlgorithm(alg) => log::warn!(
                        "rejected token with unexpected algorithm {:?} on {} from {:?}",
                        alg,
                        req.path(),
                        req.connection_info().realip_remote_addr()
                    ),
                    other => log::debug!("rejected token on {}: {}", req.path(), other),
                }
                let app_err = AppError::from(token_err);
                Box::pin(async move { Err(app_err.into()) })
            }
        }
    }
}
