//! Identity resolution: the [`CurrentUser`] extractor and credential helpers.
//!
//! A request authenticates with one of
//!
//! - `Authorization: Bearer <token>` (or the `api_token` query parameter),
//!   matched against the SHA-256 digest stored for each user;
//! - `Authorization: Basic <base64 username:password>`, verified against the
//!   user's argon2 hash.
//!
//! Anything else is rejected with 401 before a handler runs.

use std::sync::{Arc, LazyLock};

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::{FromRequestParts, Query},
  http::{header, request::Parts},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::{OsRng, RngCore};
use roster_core::{store::ContactStore, user::User};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::ApiError;

/// Number of random bytes in an API token (hex-encoded on the wire).
const TOKEN_BYTES: usize = 32;

/// Verified against when a Basic username is unknown, so both paths pay for
/// one argon2 verification.
static DUMMY_PHC: LazyLock<String> =
  LazyLock::new(|| hash_password("roster-unknown-user").unwrap_or_default());

/// The authenticated caller, resolved from the request's credentials.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Credentials presented by a request, before they are checked.
#[derive(Debug, PartialEq, Eq)]
enum Presented {
  Token(String),
  Basic { username: String, password: String },
}

#[derive(Deserialize)]
struct TokenQuery {
  api_token: Option<String>,
}

fn presented(parts: &Parts) -> Result<Presented, ApiError> {
  if let Some(value) = parts.headers.get(header::AUTHORIZATION) {
    let value = value.to_str().map_err(|_| ApiError::Unauthorized)?;

    if let Some(token) = strip_scheme(value, "Bearer") {
      return non_empty(token).map(Presented::Token);
    }

    let encoded = strip_scheme(value, "Basic").ok_or(ApiError::Unauthorized)?;
    let decoded = B64.decode(encoded.trim()).map_err(|_| ApiError::Unauthorized)?;
    let creds   = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;
    let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
    return Ok(Presented::Basic {
      username: username.to_owned(),
      password: password.to_owned(),
    });
  }

  let Query(query) = Query::<TokenQuery>::try_from_uri(&parts.uri)
    .map_err(|_| ApiError::Unauthorized)?;
  query
    .api_token
    .as_deref()
    .ok_or(ApiError::Unauthorized)
    .and_then(non_empty)
    .map(Presented::Token)
}

/// The credentials following `scheme` in an `Authorization` value. Schemes
/// compare without regard to ASCII case.
fn strip_scheme<'a>(value: &'a str, scheme: &str) -> Option<&'a str> {
  let (name, rest) = value.split_once(' ')?;
  name.eq_ignore_ascii_case(scheme).then_some(rest)
}

fn non_empty(token: &str) -> Result<String, ApiError> {
  let token = token.trim();
  if token.is_empty() {
    Err(ApiError::Unauthorized)
  } else {
    Ok(token.to_owned())
  }
}

impl<S> FromRequestParts<Arc<S>> for CurrentUser
where
  S: ContactStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    let user = match presented(parts)? {
      Presented::Token(token) => store
        .find_user_by_token_hash(hash_token(&token))
        .await
        .map_err(|e| ApiError::Store(Box::new(e)))?,
      Presented::Basic { username, password } => {
        match store
          .find_credentials(username)
          .await
          .map_err(|e| ApiError::Store(Box::new(e)))?
        {
          Some(creds) => {
            verify_password(&password, &creds.password_hash).then_some(creds.user)
          }
          None => {
            verify_password(&password, &DUMMY_PHC);
            None
          }
        }
      }
    };

    let user = user.ok_or(ApiError::Unauthorized)?;
    tracing::debug!(user_id = user.user_id, "request authenticated");
    Ok(CurrentUser(user))
  }
}

// ─── Credential helpers ──────────────────────────────────────────────────────

/// SHA-256 hex digest of an API token, as stored in the users table.
pub fn hash_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

/// A fresh random API token.
pub fn generate_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// Hash a password into an argon2 PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

/// Returns `true` if `password` matches the PHC string `phc`.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}
