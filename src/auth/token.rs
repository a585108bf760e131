use std::collections::HashMap;
use std::str::FromStr;

use actix_web::{web, HttpRequest};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::auth::extractors::AuthenticatedUser;

/// Claims carried by every issued token.
///
/// `authorized` is always `true`; existing clients read it from the payload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub authorized: bool,
    /// Identifier of the user the token was issued to.
    pub id: u32,
}

/// Claims as decoded from the wire, before any typing is applied.
pub type RawClaims = HashMap<String, Value>;

/// Ways in which issuing or checking a token can fail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("unexpected signing method: {0}")]
    UnexpectedAlgorithm(String),
    #[error("token signature does not match")]
    SignatureMismatch,
    #[error("invalid claim: {0}")]
    ClaimDecode(String),
}

/// Only the `alg` field of the header matters before verification.
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Issues and verifies HMAC-signed bearer tokens.
///
/// Holds pre-computed keys derived from the shared secret, so a single
/// instance is built at startup and cloned into every worker.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    has_secret: bool,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            has_secret: !secret.is_empty(),
        }
    }

    /// Signs `{authorized: true, id: subject_id}` with HS256.
    ///
    /// Returns `TokenError::Signing` when the service was built with an empty
    /// secret or the encoder fails.
    pub fn issue_token(&self, subject_id: u32) -> Result<String, TokenError> {
        if !self.has_secret {
            return Err(TokenError::Signing("API_SECRET is empty".into()));
        }

        let claims = Claims {
            authorized: true,
            id: subject_id,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Checks structure, algorithm and signature of `token`.
    pub fn validate_token(&self, token: &str) -> Result<(), TokenError> {
        let claims = self.verify(token)?;
        if log::log_enabled!(log::Level::Debug) {
            if let Ok(pretty) = serde_json::to_string_pretty(&claims) {
                log::debug!("validated token claims: {}", pretty);
            }
        }
        Ok(())
    }

    /// Verifies `token` and returns the user id it was issued to.
    pub fn extract_subject_id(&self, token: &str) -> Result<u32, TokenError> {
        let claims = self.verify(token)?;
        subject_id_from_claims(&claims)
    }

    /// Verifies `token` once and builds the per-request identity from it.
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, TokenError> {
        self.extract_subject_id(token).map(AuthenticatedUser)
    }

    fn verify(&self, token: &str) -> Result<RawClaims, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(TokenError::Malformed(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        }

        // The algorithm is checked before any signature work so that `none`
        // and asymmetric headers are refused outright.
        let algorithm = header_algorithm(segments[0])?;

        let mut validation = Validation::new(algorithm);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        decode::<RawClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::SignatureMismatch,
                ErrorKind::InvalidAlgorithm => {
                    TokenError::UnexpectedAlgorithm(format!("{:?}", algorithm))
                }
                _ => TokenError::Malformed(e.to_string()),
            })
    }
}

fn header_algorithm(encoded_header: &str) -> Result<Algorithm, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded_header.trim_end_matches('='))
        .map_err(|e| TokenError::Malformed(format!("header is not base64url: {}", e)))?;
    let header: RawHeader = serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::Malformed(format!("header is not valid JSON: {}", e)))?;

    match Algorithm::from_str(&header.alg) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        _ => Err(TokenError::UnexpectedAlgorithm(header.alg)),
    }
}

/// Reads the `id` claim, which travels as a generic JSON number.
///
/// Fractional values are rounded to the nearest integer, ties to even; anything missing,
/// non-numeric, negative or wider than 32 bits is rejected.
fn subject_id_from_claims(claims: &RawClaims) -> Result<u32, TokenError> {
    let value = claims
        .get("id")
        .ok_or_else(|| TokenError::ClaimDecode("missing `id` claim".into()))?;

    let number = match value {
        Value::Number(number) => number,
        other => {
            return Err(TokenError::ClaimDecode(format!(
                "`id` is not a number: {}",
                other
            )))
        }
    };

    if let Some(id) = number.as_u64() {
        return u32::try_from(id)
            .map_err(|_| TokenError::ClaimDecode(format!("`id` out of range: {}", id)));
    }

    let raw = number
        .as_f64()
        .ok_or_else(|| TokenError::ClaimDecode(format!("`id` is not numeric: {}", number)))?;
    if raw.is_sign_negative() {
        return Err(TokenError::ClaimDecode(format!("`id` is negative: {}", number)));
    }

    // Halves go to the even neighbour: 2.5 is 2, 3.5 is 4.
    let rounded = raw.round_ties_even();
    if rounded.is_finite() && rounded <= u32::MAX as f64 {
        Ok(rounded as u32)
    } else {
        Err(TokenError::ClaimDecode(format!("`id` out of range: {}", number)))
    }
}

/// Locates the raw bearer token in a request.
///
/// A non-empty `token` query parameter wins; when the key repeats, the first
/// occurrence is the one considered. Otherwise the `Authorization`
/// header is split on single spaces and the second part is used, but only
/// when there are exactly two parts. No token yields an empty string, which
/// later fails verification as malformed.
pub fn extract_token(req: &HttpRequest) -> String {
    let from_query = web::Query::<Vec<(String, String)>>::from_query(req.query_string())
        .ok()
        .and_then(|query| {
            query
                .into_inner()
                .into_iter()
                .find(|(key, _)| key == "token")
        })
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty());
    if let Some(token) = from_query {
        return token;
    }

    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_segment)
        .unwrap_or_default()
}

fn bearer_segment(header: &str) -> Option<String> {
    let parts: Vec<&str> = header.split(' ').collect();
    match parts.as_slice() {
        [_, token] => Some((*token).to_string()),
        _ => None,
    }
}
