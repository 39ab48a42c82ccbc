//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by any [`roster_core::store::ContactStore`].
//! Every route requires a resolved [`auth::CurrentUser`]; TLS and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", roster_api::api_router(store.clone()))
//! ```

pub mod auth;
pub mod contacts;
pub mod error;
pub mod resource;

use std::sync::Arc;

use axum::{Router, routing::get};
use roster_core::store::ContactStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ContactStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/contacts", get(contacts::list::<S>).post(contacts::create::<S>))
    .route(
      "/contacts/{id}",
      get(contacts::show::<S>)
        .patch(contacts::update::<S>)
        .put(contacts::update::<S>)
        .delete(contacts::destroy::<S>),
    )
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use roster_core::{
    contact::Contact,
    user::{NewUser, User},
  };
  use roster_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use crate::auth::{hash_password, hash_token};

  struct Fixture {
    store: Arc<SqliteStore>,
    alice: User,
    bob:   User,
  }

  async fn fixture() -> Fixture {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let alice = add_user(&store, "alice", "unused").await;
    let bob = add_user(&store, "bob", "unused").await;
    Fixture { store, alice, bob }
  }

  async fn add_user(store: &SqliteStore, username: &str, password_hash: &str) -> User {
    store
      .add_user(NewUser {
        username:      username.into(),
        password_hash: password_hash.into(),
        token_hash:    hash_token(&token_for(username)),
      })
      .await
      .unwrap()
  }

  fn token_for(username: &str) -> String { format!("{username}-token") }

  fn bearer(user: &User) -> String { format!("Bearer {}", token_for(&user.username)) }

  fn valid_payload() -> Value {
    json!({
      "name":     "Test Name",
      "email":    "test@example.com",
      "birthday": "05/14/1988",
      "company":  "ABC String",
    })
  }

  async fn send(
    store: &Arc<SqliteStore>,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
      builder = builder.header(header::AUTHORIZATION, auth);
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    api_router(store.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap()
  }

  async fn send_raw(
    store: &Arc<SqliteStore>,
    method: &str,
    uri: &str,
    auth: &str,
    body: &'static str,
  ) -> Response {
    let req = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::AUTHORIZATION, auth)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body))
      .unwrap();
    api_router(store.clone()).oneshot(req).await.unwrap()
  }

  async fn body_bytes(resp: Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap()
      .to_vec()
  }

  async fn body_json(resp: Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
  }

  async fn contact_of(f: &Fixture, owner: &User) -> Contact {
    let resp = send(&f.store, "POST", "/contacts", Some(&bearer(owner)), Some(valid_payload())).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let id = body_json(resp).await["contact_id"].as_i64().unwrap();
    f.store.get_contact(id).await.unwrap().unwrap()
  }

  // ── Create ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn a_contact_can_be_added() {
    let f = fixture().await;
    let resp = send(&f.store, "POST", "/contacts", Some(&bearer(&f.alice)), Some(valid_payload())).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let location = resp.headers().get(header::LOCATION).unwrap().to_str().unwrap().to_string();
    let json = body_json(resp).await;
    let id = json["contact_id"].as_i64().unwrap();
    assert_eq!(location, format!("/contacts/{id}"));
    assert_eq!(json["name"], "Test Name");
    assert_eq!(json["email"], "test@example.com");
    assert_eq!(json["birthday"], "05/14/1988");
    assert_eq!(json["company"], "ABC String");
    assert!(json["last_updated"].as_str().unwrap().ends_with("ago"));

    let stored = f.store.list_contacts(f.alice.user_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].company, "ABC String");
    assert_eq!(stored[0].user_id, f.alice.user_id);
    assert_eq!(stored[0].birthday.to_string(), "1988-05-14");
  }

  #[tokio::test]
  async fn fields_are_required() {
    let f = fixture().await;
    for field in ["name", "email", "birthday", "company"] {
      let mut payload = valid_payload();
      payload.as_object_mut().unwrap().remove(field);

      let resp = send(&f.store, "POST", "/contacts", Some(&bearer(&f.alice)), Some(payload)).await;
      assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{field}");
      let json = body_json(resp).await;
      assert_eq!(json["message"], "The given data was invalid.");
      assert!(json["errors"][field].is_array(), "{field}: {json}");
    }
    assert!(f.store.list_contacts(f.alice.user_id).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn email_must_be_valid() {
    let f = fixture().await;
    let mut payload = valid_payload();
    payload["email"] = json!("not an email");

    let resp = send(&f.store, "POST", "/contacts", Some(&bearer(&f.alice)), Some(payload)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(resp).await;
    assert_eq!(json["errors"]["email"][0], "The email must be a valid email address.");
    assert!(f.store.list_contacts(f.alice.user_id).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn owner_cannot_be_injected() {
    let f = fixture().await;
    let mut payload = valid_payload();
    payload["user_id"] = json!(f.bob.user_id);

    let resp = send(&f.store, "POST", "/contacts", Some(&bearer(&f.alice)), Some(payload)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(f.store.list_contacts(f.bob.user_id).await.unwrap().is_empty());
  }

  // ── List ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_returns_only_callers_contacts() {
    let f = fixture().await;
    let first = contact_of(&f, &f.alice).await;
    contact_of(&f, &f.bob).await;
    let second = contact_of(&f, &f.alice).await;

    let resp = send(&f.store, "GET", "/contacts", Some(&bearer(&f.alice)), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let ids: Vec<i64> = json["data"]
      .as_array()
      .unwrap()
      .iter()
      .map(|c| c["contact_id"].as_i64().unwrap())
      .collect();
    assert_eq!(ids, [first.contact_id, second.contact_id]);
  }

  #[tokio::test]
  async fn list_is_empty_for_new_user() {
    let f = fixture().await;
    let resp = send(&f.store, "GET", "/contacts", Some(&bearer(&f.bob)), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "data": [] }));
  }

  // ── Show ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn owner_can_retrieve_contact() {
    let f = fixture().await;
    let contact = contact_of(&f, &f.alice).await;

    let resp = send(&f.store, "GET", &format!("/contacts/{}", contact.contact_id), Some(&bearer(&f.alice)), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["contact_id"], contact.contact_id);
    assert_eq!(json["birthday"], "05/14/1988");
  }

  #[tokio::test]
  async fn missing_contact_returns_404() {
    let f = fixture().await;
    let resp = send(&f.store, "GET", "/contacts/7", Some(&bearer(&f.alice)), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "contact 7 not found");
  }

  // ── Update ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn a_contact_can_be_patched() {
    let f = fixture().await;
    let contact = contact_of(&f, &f.alice).await;
    let mut payload = valid_payload();
    payload["company"] = json!("New Co");

    let uri = format!("/contacts/{}", contact.contact_id);
    let resp = send(&f.store, "PATCH", &uri, Some(&bearer(&f.alice)), Some(payload)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["company"], "New Co");

    let refreshed = f.store.get_contact(contact.contact_id).await.unwrap().unwrap();
    assert_eq!(refreshed.company, "New Co");
    assert_eq!(refreshed.name, contact.name);
    assert_eq!(refreshed.email, contact.email);
    assert_eq!(refreshed.birthday, contact.birthday);
    assert_eq!(refreshed.user_id, f.alice.user_id);
    assert!(refreshed.updated_at >= contact.updated_at);
  }

  #[tokio::test]
  async fn put_is_accepted_for_update() {
    let f = fixture().await;
    let contact = contact_of(&f, &f.alice).await;
    let mut payload = valid_payload();
    payload["name"] = json!("Renamed");

    let uri = format!("/contacts/{}", contact.contact_id);
    let resp = send(&f.store, "PUT", &uri, Some(&bearer(&f.alice)), Some(payload)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["name"], "Renamed");
  }

  #[tokio::test]
  async fn invalid_update_leaves_contact_untouched() {
    let f = fixture().await;
    let contact = contact_of(&f, &f.alice).await;
    let payload = json!({ "name": "Only A Name" });

    let uri = format!("/contacts/{}", contact.contact_id);
    let resp = send(&f.store, "PATCH", &uri, Some(&bearer(&f.alice)), Some(payload)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = body_json(resp).await["errors"].clone();
    for field in ["email", "birthday", "company"] {
      assert!(errors[field].is_array(), "{field}");
    }

    let unchanged = f.store.get_contact(contact.contact_id).await.unwrap().unwrap();
    assert_eq!(unchanged, contact);
  }

  #[tokio::test]
  async fn update_missing_returns_404() {
    let f = fixture().await;
    let resp = send(&f.store, "PATCH", "/contacts/7", Some(&bearer(&f.alice)), Some(valid_payload())).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Delete ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn a_contact_can_be_deleted() {
    let f = fixture().await;
    let contact = contact_of(&f, &f.alice).await;
    let uri = format!("/contacts/{}", contact.contact_id);

    let resp = send(&f.store, "DELETE", &uri, Some(&bearer(&f.alice)), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = send(&f.store, "GET", &uri, Some(&bearer(&f.alice)), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&f.store, "GET", "/contacts", Some(&bearer(&f.alice)), None).await;
    assert_eq!(body_json(resp).await, json!({ "data": [] }));
  }

  #[tokio::test]
  async fn delete_missing_returns_404() {
    let f = fixture().await;
    let resp = send(&f.store, "DELETE", "/contacts/7", Some(&bearer(&f.alice)), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Ownership ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn other_users_get_403_and_nothing_changes() {
    let f = fixture().await;
    let contact = contact_of(&f, &f.alice).await;
    let uri = format!("/contacts/{}", contact.contact_id);
    let mut payload = valid_payload();
    payload["company"] = json!("Hijacked");

    let cases = [
      ("GET", None),
      ("PATCH", Some(payload.clone())),
      ("PUT", Some(payload)),
      ("DELETE", None),
    ];
    for (method, body) in cases {
      let resp = send(&f.store, method, &uri, Some(&bearer(&f.bob)), body).await;
      assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{method}");
      assert!(body_bytes(resp).await.is_empty(), "{method}");
    }

    let unchanged = f.store.get_contact(contact.contact_id).await.unwrap().unwrap();
    assert_eq!(unchanged, contact);
  }

  #[tokio::test]
  async fn ownership_is_checked_before_validation() {
    let f = fixture().await;
    let contact = contact_of(&f, &f.alice).await;
    let uri = format!("/contacts/{}", contact.contact_id);

    let resp = send(&f.store, "PATCH", &uri, Some(&bearer(&f.bob)), Some(json!({}))).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn non_object_body_is_checked_after_resolve_and_ownership() {
    let f = fixture().await;
    let contact = contact_of(&f, &f.alice).await;
    let uri = format!("/contacts/{}", contact.contact_id);

    let resp = send_raw(&f.store, "PATCH", &uri, &bearer(&f.bob), "[]").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(body_bytes(resp).await.is_empty());

    let resp = send_raw(&f.store, "PATCH", "/contacts/999", &bearer(&f.alice), "[]").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send_raw(&f.store, "PATCH", &uri, &bearer(&f.alice), "[]").await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let unchanged = f.store.get_contact(contact.contact_id).await.unwrap().unwrap();
    assert_eq!(unchanged, contact);
  }

  #[tokio::test]
  async fn malformed_bodies_get_the_validation_shape() {
    let f = fixture().await;

    for body in ["\"str\"", "[]", "{bad"] {
      let resp = send_raw(&f.store, "POST", "/contacts", &bearer(&f.alice), body).await;
      assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{body}");
      let json = body_json(resp).await;
      assert_eq!(json["message"], "The given data was invalid.", "{body}");
      assert!(json["errors"]["body"].is_array(), "{body}");
    }

    assert!(f.store.list_contacts(f.alice.user_id).await.unwrap().is_empty());
  }

  // ── Authentication ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unauthenticated_requests_return_401() {
    let f = fixture().await;
    let contact = contact_of(&f, &f.alice).await;
    let uri = format!("/contacts/{}", contact.contact_id);

    for (method, uri, body) in [
      ("GET", "/contacts", None),
      ("POST", "/contacts", Some(valid_payload())),
      ("GET", uri.as_str(), None),
      ("DELETE", uri.as_str(), None),
    ] {
      let resp = send(&f.store, method, uri, None, body).await;
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
      assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    let resp = send(&f.store, "GET", "/contacts", Some("Bearer wrong-token"), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    assert!(f.store.get_contact(contact.contact_id).await.unwrap().is_some());
    assert_eq!(f.store.list_contacts(f.alice.user_id).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn api_token_query_parameter_authenticates() {
    let f = fixture().await;
    contact_of(&f, &f.alice).await;

    let uri = format!("/contacts?api_token={}", token_for("alice"));
    let resp = send(&f.store, "GET", &uri, None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"].as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn basic_auth_authenticates() {
    let f = fixture().await;
    let carol = add_user(&f.store, "carol", &hash_password("secret").unwrap()).await;

    let good = format!("Basic {}", B64.encode("carol:secret"));
    let resp = send(&f.store, "POST", "/contacts", Some(&good), Some(valid_payload())).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(f.store.list_contacts(carol.user_id).await.unwrap().len(), 1);

    let bad = format!("Basic {}", B64.encode("carol:wrong"));
    let resp = send(&f.store, "GET", "/contacts", Some(&bad), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let unknown = format!("Basic {}", B64.encode("mallory:secret"));
    let resp = send(&f.store, "GET", "/contacts", Some(&unknown), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }
}
