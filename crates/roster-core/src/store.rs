//! The `ContactStore` trait.
//!
//! Implemented by storage backends (e.g. `roster-store-sqlite`). The API
//! layer depends on this abstraction, not on any concrete backend.
//!
//! Every method is keyed by explicit identifiers; ownership is never implied
//! by a query scope except in [`ContactStore::list_contacts`], whose whole
//! purpose is the per-owner listing.

use std::future::Future;

use crate::{
  contact::{Contact, ContactFields},
  user::{Credentials, NewUser, User},
};

/// Abstraction over a Roster record store.
///
/// Each method is a single-row operation (or a single owner-scoped read);
/// atomicity of each call is the backend's responsibility.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ContactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Fails if the username or token digest is taken.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look up a user and password hash by username.
  fn find_credentials(
    &self,
    username: String,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + '_;

  /// Look up the user whose API token hashes to `token_hash`.
  fn find_user_by_token_hash(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Contacts ──────────────────────────────────────────────────────────

  /// All contacts owned by `user_id`, in creation order.
  fn list_contacts(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  /// Retrieve a contact by id regardless of owner. Returns `None` if absent.
  fn get_contact(
    &self,
    contact_id: i64,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Persist a new contact owned by `user_id`. Timestamps are set by the
  /// store.
  fn create_contact(
    &self,
    user_id: i64,
    fields: ContactFields,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// Replace the four business fields and bump `updated_at`.
  /// Returns `None` if the contact does not exist.
  fn update_contact(
    &self,
    contact_id: i64,
    fields: ContactFields,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Permanently remove a contact. Returns `false` if it did not exist.
  fn delete_contact(
    &self,
    contact_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
