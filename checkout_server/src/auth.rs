//! Bearer token identity.
//!
//! Users sign in with an external identity provider, which issues HS256 JWTs signed with the secret in
//! [`AuthConfig`]. The `sub` claim is taken as the trusted user id. The server never issues tokens itself in
//! production; [`issue_token`] exists for tooling and tests.
//!
//! Two extractors are provided:
//! * [`AuthenticatedUser`] rejects the request with 401 unless a valid token is present.
//! * [`OptionalUser`] is used where identity is optional. No `Authorization` header means "guest", but a header with a
//!   bad or expired token is still rejected, so a stale session never silently turns into a guest checkout.
use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use checkout_engine::db_types::UserId;
use chrono::{Duration, Utc};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

pub fn issue_token(config: &AuthConfig, user_id: &UserId, valid_for: Duration) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = JwtClaims { sub: user_id.to_string(), exp: (now + valid_for).timestamp(), iat: now.timestamp() };
    let key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))
}

pub fn validate_token(config: &AuthConfig, token: &str) -> Result<UserId, AuthError> {
    let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
    let data = decode::<JwtClaims>(token, &key, &Validation::new(Algorithm::HS256)).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            AuthError::PoorlyFormattedToken(e.to_string())
        },
        _ => AuthError::ValidationError(e.to_string()),
    })?;
    let sub = data.claims.sub.trim();
    if sub.is_empty() {
        return Err(AuthError::ValidationError("The token does not name a user".to_string()));
    }
    Ok(UserId::from(sub))
}

/// Reads the bearer token from the request. `Ok(None)` means there was no `Authorization` header at all.
fn bearer_token(req: &HttpRequest) -> Result<Option<&str>, AuthError> {
    let Some(header) = req.headers().get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
        _ => Err(AuthError::PoorlyFormattedToken("Expected 'Authorization: Bearer <token>'".to_string())),
    }
}

fn identify(req: &HttpRequest) -> Result<Option<UserId>, ServerError> {
    let Some(token) = bearer_token(req)? else {
        return Ok(None);
    };
    let config = req.app_data::<web::Data<AuthConfig>>().ok_or_else(|| {
        error!("🔐️ AuthConfig is not registered as app data. Bearer tokens cannot be checked.");
        ServerError::ConfigurationError("Authentication is not configured".to_string())
    })?;
    let user_id = validate_token(config, token).map_err(|e| {
        debug!("🔐️ Rejected bearer token. {e}");
        e
    })?;
    trace!("🔐️ Request authenticated as {user_id}");
    Ok(Some(user_id))
}

/// The identity of a signed-in caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

impl AuthenticatedUser {
    pub fn user_id(&self) -> &UserId {
        &self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = identify(req).and_then(|id| id.map(Self).ok_or(AuthError::MissingToken.into()));
        ready(result)
    }
}

/// The identity of the caller if there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalUser(pub Option<UserId>);

impl OptionalUser {
    pub fn into_inner(self) -> Option<UserId> {
        self.0
    }
}

impl FromRequest for OptionalUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(identify(req).map(Self))
    }
}
