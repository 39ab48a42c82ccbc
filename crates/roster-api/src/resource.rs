//! JSON response shapes.

use chrono::{DateTime, Utc};
use roster_core::contact::Contact;
use serde::{Deserialize, Serialize};

/// Wire format of birthdays in responses.
pub const BIRTHDAY_FORMAT: &str = "%m/%d/%Y";

/// The public view of a [`Contact`]. Owner and creation time are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactResource {
  pub contact_id:   i64,
  pub name:         String,
  pub email:        String,
  /// `MM/DD/YYYY`
  pub birthday:     String,
  pub company:      String,
  /// Relative to the time of the response, e.g. `"3 minutes ago"`.
  pub last_updated: String,
}

impl ContactResource {
  pub fn new(contact: &Contact, now: DateTime<Utc>) -> Self {
    Self {
      contact_id:   contact.contact_id,
      name:         contact.name.clone(),
      email:        contact.email.clone(),
      birthday:     contact.birthday.format(BIRTHDAY_FORMAT).to_string(),
      company:      contact.company.clone(),
      last_updated: diff_for_humans(contact.updated_at, now),
    }
  }
}

/// A list of resources wrapped under `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection<T> {
  pub data: Vec<T>,
}

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// Render the distance between `then` and `now` as `"<n> <unit>(s) ago"`
/// (or `"... from now"` for future instants), using the largest whole unit.
pub fn diff_for_humans(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let secs = (now - then).num_seconds();
  let (secs, suffix) = if secs < 0 { (-secs, "from now") } else { (secs, "ago") };

  let (count, unit) = match secs {
    s if s < MINUTE => (s, "second"),
    s if s < HOUR => (s / MINUTE, "minute"),
    s if s < DAY => (s / HOUR, "hour"),
    s if s < WEEK => (s / DAY, "day"),
    s if s < MONTH => (s / WEEK, "week"),
    s if s < YEAR => (s / MONTH, "month"),
    s => (s / YEAR, "year"),
  };
  let count = count.max(1);
  let plural = if count == 1 { "" } else { "s" };

  format!("{count} {unit}{plural} {suffix}")
}
