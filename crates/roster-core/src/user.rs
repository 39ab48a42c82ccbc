//! User — the owner of contacts.
//!
//! Users are provisioned outside the request path; the service only ever
//! reads them to resolve the caller of a request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated principal. Carries no credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    i64,
  pub username:   String,
  pub created_at: DateTime<Utc>,
}

/// A user together with the stored argon2 PHC string, as needed for
/// password verification.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user:          User,
  pub password_hash: String,
}

/// Input to [`crate::store::ContactStore::add_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  /// SHA-256 hex digest of the user's API token.
  pub token_hash:    String,
}
