//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and birthdays as ISO 8601
//! calendar dates.

use chrono::{DateTime, NaiveDate, Utc};
use roster_core::{
  contact::Contact,
  user::{Credentials, User},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawContact::from_row`].
pub const CONTACT_COLUMNS: &str =
  "contact_id, user_id, name, email, birthday, company, created_at, updated_at";

/// Raw values read directly from a `contacts` row.
pub struct RawContact {
  pub contact_id: i64,
  pub user_id:    i64,
  pub name:       String,
  pub email:      String,
  pub birthday:   String,
  pub company:    String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawContact {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      contact_id: row.get(0)?,
      user_id:    row.get(1)?,
      name:       row.get(2)?,
      email:      row.get(3)?,
      birthday:   row.get(4)?,
      company:    row.get(5)?,
      created_at: row.get(6)?,
      updated_at: row.get(7)?,
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      contact_id: self.contact_id,
      user_id:    self.user_id,
      name:       self.name,
      email:      self.email,
      birthday:   decode_date(&self.birthday)?,
      company:    self.company,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:       i64,
  pub username:      String,
  pub created_at:    String,
  pub password_hash: String,
}

impl RawUser {
  /// Expects `user_id, username, created_at, password_hash`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      created_at:    row.get(2)?,
      password_hash: row.get(3)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    self.user_id,
      username:   self.username,
      created_at: decode_dt(&self.created_at)?,
    })
  }

  pub fn into_credentials(mut self) -> Result<Credentials> {
    let password_hash = std::mem::take(&mut self.password_hash);
    Ok(Credentials { user: self.into_user()?, password_hash })
  }
}
