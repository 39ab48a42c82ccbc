//! Contact payload validation.
//!
//! [`validate`] turns an untyped JSON object into [`ContactFields`] or a set
//! of per-field messages. Every rule is checked so that a single response can
//! report all failing fields at once.

use std::{collections::BTreeMap, fmt, sync::LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::contact::ContactFields;

/// The only keys a contact payload may carry.
pub const FIELDS: [&str; 4] = ["name", "email", "birthday", "company"];

/// Upper bound on an email address (RFC 5321 path limit minus brackets).
const MAX_EMAIL_LEN: usize = 254;

// WHATWG "valid email address" grammar.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
  )
  .expect("email pattern compiles")
});

static US_DATE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("date pattern compiles")
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("date pattern compiles")
});

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Field name → messages. Serializes as a plain JSON object, ordered by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self.0.entry(field.to_owned()).or_default().push(message.into());
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn contains(&self, field: &str) -> bool { self.0.contains_key(field) }

  pub fn get(&self, field: &str) -> Option<&[String]> {
    self.0.get(field).map(Vec::as_slice)
  }

  /// Names of the failing fields, in sorted order.
  pub fn fields(&self) -> impl Iterator<Item = &str> {
    self.0.keys().map(String::as_str)
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, messages) in &self.0 {
      for message in messages {
        if !first {
          f.write_str("; ")?;
        }
        write!(f, "{field}: {message}")?;
        first = false;
      }
    }
    Ok(())
  }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Validate a raw contact payload.
///
/// String fields are trimmed; `birthday` is parsed into a calendar date.
/// Unknown keys and non-string values are reported against their key.
pub fn validate(
  payload: &Map<String, Value>,
) -> Result<ContactFields, ValidationErrors> {
  let mut errors = ValidationErrors::default();

  for key in payload.keys() {
    if !FIELDS.contains(&key.as_str()) {
      errors.add(key, format!("The {key} field is not allowed."));
    }
  }

  let name = required_string(payload, "name", &mut errors);

  let email = match required_string(payload, "email", &mut errors) {
    Some(e) if is_valid_email(&e) => Some(e),
    Some(_) => {
      errors.add("email", "The email must be a valid email address.");
      None
    }
    None => None,
  };

  let birthday = match required_string(payload, "birthday", &mut errors) {
    Some(raw) => {
      let parsed = parse_birthday(&raw);
      if parsed.is_none() {
        errors.add("birthday", "The birthday is not a valid date.");
      }
      parsed
    }
    None => None,
  };

  let company = required_string(payload, "company", &mut errors);

  match (name, email, birthday, company) {
    (Some(name), Some(email), Some(birthday), Some(company))
      if errors.is_empty() =>
    {
      Ok(ContactFields { name, email, birthday, company })
    }
    _ => Err(errors),
  }
}

/// Returns `true` if `email` is `local@domain` per the WHATWG grammar.
pub fn is_valid_email(email: &str) -> bool {
  email.len() <= MAX_EMAIL_LEN && EMAIL.is_match(email)
}

/// Parse `MM/DD/YYYY` (or ISO `YYYY-MM-DD`) into a date, rejecting
/// impossible calendar dates.
pub fn parse_birthday(raw: &str) -> Option<NaiveDate> {
  if let Some(c) = US_DATE.captures(raw) {
    return ymd(&c[3], &c[1], &c[2]);
  }
  let c = ISO_DATE.captures(raw)?;
  ymd(&c[1], &c[2], &c[3])
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
  NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn required_string(
  payload: &Map<String, Value>,
  field: &str,
  errors: &mut ValidationErrors,
) -> Option<String> {
  match payload.get(field) {
    None | Some(Value::Null) => {
      errors.add(field, format!("The {field} field is required."));
      None
    }
    Some(Value::String(s)) => {
      let trimmed = s.trim();
      if trimmed.is_empty() {
        errors.add(field, format!("The {field} field is required."));
        None
      } else {
        Some(trimmed.to_owned())
      }
    }
    Some(_) => {
      errors.add(field, format!("The {field} must be a string."));
      None
    }
  }
}
