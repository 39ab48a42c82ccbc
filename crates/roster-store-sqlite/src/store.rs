//! [`SqliteStore`] — the SQLite implementation of [`ContactStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value};

use roster_core::{
  contact::{Contact, ContactFields},
  store::ContactStore,
  user::{Credentials, NewUser, User},
};

use crate::{
  Error, Result,
  encode::{CONTACT_COLUMNS, RawContact, RawUser, encode_date, encode_dt},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Roster record store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single-row user lookup with `where_clause` bound to `param`.
  async fn query_user(
    &self,
    where_clause: &'static str,
    param: Value,
  ) -> Result<Option<RawUser>> {
    let sql = format!(
      "SELECT user_id, username, created_at, password_hash FROM users WHERE {where_clause}"
    );
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![param], RawUser::from_row)
            .optional()?,
        )
      })
      .await?;
    Ok(raw)
  }
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let created_at = Utc::now();
    let at_str     = encode_dt(created_at);
    let NewUser { username, password_hash, token_hash } = input;
    let name       = username.clone();

    let inserted = self
      .conn
      .call(move |conn| {
        let res = conn.execute(
          "INSERT INTO users (username, password_hash, token_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![name, password_hash, token_hash, at_str],
        );
        match res {
          Ok(_) => Ok(Ok(conn.last_insert_rowid())),
          Err(rusqlite::Error::SqliteFailure(e, msg))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
          {
            Ok(Err(msg))
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    // SQLite names the failed column: "UNIQUE constraint failed: users.token_hash".
    let user_id = inserted.map_err(|msg| match msg {
      Some(m) if m.contains("users.token_hash") => Error::TokenTaken,
      _ => Error::UsernameTaken(username.clone()),
    })?;
    Ok(User { user_id, username, created_at })
  }

  async fn find_credentials(&self, username: String) -> Result<Option<Credentials>> {
    self
      .query_user("username = ?1", Value::Text(username))
      .await?
      .map(RawUser::into_credentials)
      .transpose()
  }

  async fn find_user_by_token_hash(&self, token_hash: String) -> Result<Option<User>> {
    self
      .query_user("token_hash = ?1", Value::Text(token_hash))
      .await?
      .map(RawUser::into_user)
      .transpose()
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  async fn list_contacts(&self, user_id: i64) -> Result<Vec<Contact>> {
    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CONTACT_COLUMNS} FROM contacts WHERE user_id = ?1 ORDER BY contact_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], RawContact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }

  async fn get_contact(&self, contact_id: i64) -> Result<Option<Contact>> {
    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE contact_id = ?1"),
              rusqlite::params![contact_id],
              RawContact::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn create_contact(&self, user_id: i64, fields: ContactFields) -> Result<Contact> {
    let now          = Utc::now();
    let at_str       = encode_dt(now);
    let birthday_str = encode_date(fields.birthday);
    let (name, email, company) =
      (fields.name.clone(), fields.email.clone(), fields.company.clone());

    let contact_id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO contacts (
             user_id, name, email, birthday, company, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![user_id, name, email, birthday_str, company, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Contact {
      contact_id,
      user_id,
      name: fields.name,
      email: fields.email,
      birthday: fields.birthday,
      company: fields.company,
      created_at: now,
      updated_at: now,
    })
  }

  async fn update_contact(
    &self,
    contact_id: i64,
    fields: ContactFields,
  ) -> Result<Option<Contact>> {
    let at_str       = encode_dt(Utc::now());
    let birthday_str = encode_date(fields.birthday);
    let ContactFields { name, email, company, .. } = fields;

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "UPDATE contacts
                 SET name = ?1, email = ?2, birthday = ?3, company = ?4, updated_at = ?5
                 WHERE contact_id = ?6
                 RETURNING {CONTACT_COLUMNS}"
              ),
              rusqlite::params![name, email, birthday_str, company, at_str, contact_id],
              RawContact::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn delete_contact(&self, contact_id: i64) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM contacts WHERE contact_id = ?1",
          rusqlite::params![contact_id],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }
}
