//! Bearer-token authentication.
//!
//! `token` signs and verifies tokens, `middleware` gates protected scopes,
//! `extractors` hands the acting user to handlers and `password` hashes
//! credentials.

pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{extract_token, Claims, TokenError, TokenService};

use crate::security::prepare_text;

/// Payload of `POST /api/v1/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid Email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Required Password"))]
    pub password: String,
}

/// Payload of `POST /api/v1/signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 255, message = "Required Username"))]
    pub username: String,
    #[validate(
        email(message = "Invalid Email"),
        length(max = 100, message = "Email is too long")
    )]
    pub email: String,
    #[validate(length(min = 6, message = "Password should be at least 6 characters"))]
    pub password: String,
}

impl SignupRequest {
    /// Trims and escapes the free-text fields before validation and storage.
    pub fn prepare(&mut self) {
        self.username = prepare_text(&self.username);
        self.email = prepare_text(&self.email);
    }
}

impl LoginRequest {
    pub fn prepare(&mut self) {
        self.email = prepare_text(&self.email);
    }
}

/// Response of a successful signup or login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer token to send as `Authorization: Bearer <token>` or `?token=`.
    pub token: String,
    pub user_id: u32,
}
