//! Handlers for `/contacts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/contacts` | Caller's contacts as `{"data": [...]}` |
//! | `POST`   | `/contacts` | Body: `{name, email, birthday, company}`; returns 201 |
//! | `GET`    | `/contacts/:id` | 404 if absent, 403 if not the caller's |
//! | `PATCH`  | `/contacts/:id` | Full replace of the four fields; `PUT` is an alias |
//! | `DELETE` | `/contacts/:id` | 204 on success |
//!
//! Every handler resolves the record, checks the policy, then validates, so
//! nothing is written unless all three succeed. A body that is not a JSON
//! object is a validation failure and is only reported after the first two.

use std::sync::Arc;

use axum::{
  Json,
  extract::{OriginalUri, Path, State, rejection::JsonRejection},
  http::{StatusCode, header},
  response::IntoResponse,
};
use chrono::Utc;
use roster_core::{
  contact::Contact,
  policy::{self, Ability, Target},
  store::ContactStore,
  user::User,
  validation::{self, ValidationErrors},
};
use serde_json::{Map, Value};

use crate::{
  auth::CurrentUser,
  error::ApiError,
  resource::{Collection, ContactResource},
};

/// Untyped request body; only [`validation::validate`] turns it into fields.
pub type Payload = Map<String, Value>;

/// The request body as extracted; rejections are deferred to `read_payload`.
pub type Body = Result<Json<Payload>, JsonRejection>;

const BODY_NOT_AN_OBJECT: &str = "The request body must be a JSON object.";

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn find<S>(store: &S, contact_id: i64) -> Result<Contact, ApiError>
where
  S: ContactStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  store
    .get_contact(contact_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| not_found(contact_id))
}

fn not_found(contact_id: i64) -> ApiError {
  ApiError::NotFound(format!("contact {contact_id} not found"))
}

fn read_payload(body: Body) -> Result<Payload, ApiError> {
  body.map(|Json(payload)| payload).map_err(|rejection| {
    tracing::debug!(error = %rejection.body_text(), "request body rejected");
    let mut errors = ValidationErrors::default();
    errors.add("body", BODY_NOT_AN_OBJECT);
    ApiError::Validation(errors)
  })
}

fn authorize(user: &User, ability: Ability, target: Target<'_>) -> Result<(), ApiError> {
  policy::authorize(user, ability, target).map_err(|e| {
    tracing::warn!(user_id = user.user_id, error = %e, "authorization denied");
    ApiError::from(e)
  })
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /contacts`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Collection<ContactResource>>, ApiError>
where
  S: ContactStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  authorize(&user, Ability::ViewAny, Target::Collection)?;

  let contacts = store
    .list_contacts(user.user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let now = Utc::now();
  Ok(Json(Collection {
    data: contacts.iter().map(|c| ContactResource::new(c, now)).collect(),
  }))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /contacts` — returns 201, the resource, and a `Location` header.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  OriginalUri(uri): OriginalUri,
  CurrentUser(user): CurrentUser,
  body: Body,
) -> Result<impl IntoResponse, ApiError>
where
  S: ContactStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  authorize(&user, Ability::Create, Target::Collection)?;
  let payload = read_payload(body)?;
  let fields = validation::validate(&payload).map_err(roster_core::Error::from)?;

  let contact = store
    .create_contact(user.user_id, fields)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  tracing::info!(contact_id = contact.contact_id, user_id = user.user_id, "contact created");

  let location = format!("{}/{}", uri.path().trim_end_matches('/'), contact.contact_id);
  Ok((
    StatusCode::CREATED,
    [(header::LOCATION, location)],
    Json(ContactResource::new(&contact, Utc::now())),
  ))
}

// ─── Show ─────────────────────────────────────────────────────────────────────

/// `GET /contacts/:id`
pub async fn show<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(contact_id): Path<i64>,
) -> Result<Json<ContactResource>, ApiError>
where
  S: ContactStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let contact = find(store.as_ref(), contact_id).await?;
  authorize(&user, Ability::View, Target::Contact(&contact))?;
  Ok(Json(ContactResource::new(&contact, Utc::now())))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /contacts/:id` (and `PUT`) — replaces all four business fields.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(contact_id): Path<i64>,
  body: Body,
) -> Result<Json<ContactResource>, ApiError>
where
  S: ContactStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let contact = find(store.as_ref(), contact_id).await?;
  authorize(&user, Ability::Update, Target::Contact(&contact))?;
  let payload = read_payload(body)?;
  let fields = validation::validate(&payload).map_err(roster_core::Error::from)?;

  // The record may have been deleted since it was resolved.
  let updated = store
    .update_contact(contact_id, fields)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| not_found(contact_id))?;
  tracing::info!(contact_id, user_id = user.user_id, "contact updated");

  Ok(Json(ContactResource::new(&updated, Utc::now())))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /contacts/:id` — permanent; returns 204.
pub async fn destroy<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(contact_id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: ContactStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let contact = find(store.as_ref(), contact_id).await?;
  authorize(&user, Ability::Delete, Target::Contact(&contact))?;

  let deleted = store
    .delete_contact(contact_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !deleted {
    return Err(not_found(contact_id));
  }
  tracing::info!(contact_id, user_id = user.user_id, "contact deleted");

  Ok(StatusCode::NO_CONTENT)
}
