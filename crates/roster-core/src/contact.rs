//! Contact types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The four business fields of a contact, normalized.
///
/// Only [`crate::validation::validate`] produces this from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
  pub name:     String,
  pub email:    String,
  pub birthday: NaiveDate,
  pub company:  String,
}

/// A persisted contact record owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
  pub contact_id: i64,
  /// The owning user's `user_id`.
  pub user_id:    i64,
  pub name:       String,
  pub email:      String,
  pub birthday:   NaiveDate,
  pub company:    String,
  /// Store-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
  /// Bumped on every successful update.
  pub updated_at: DateTime<Utc>,
}

