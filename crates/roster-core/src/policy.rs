//! Ownership policy for contacts.
//!
//! The caller is always passed in explicitly; nothing here reads request
//! context.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, contact::Contact, user::User};

/// An action a user may attempt against contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
  ViewAny,
  View,
  Create,
  Update,
  Delete,
}

impl fmt::Display for Ability {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::ViewAny => "view contacts",
      Self::View => "view contact",
      Self::Create => "create contact",
      Self::Update => "update contact",
      Self::Delete => "delete contact",
    })
  }
}

/// What an ability is checked against.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
  /// The caller's contact collection as a whole.
  Collection,
  Contact(&'a Contact),
}

/// Decide whether `user` may perform `ability` on `target`.
pub fn allows(user: &User, ability: Ability, target: Target<'_>) -> bool {
  match (ability, target) {
    (Ability::ViewAny | Ability::Create, _) => true,
    (Ability::View | Ability::Update | Ability::Delete, Target::Contact(contact)) => {
      contact.user_id == user.user_id
    }
    (Ability::View | Ability::Update | Ability::Delete, Target::Collection) => false,
  }
}

/// Like [`allows`], but returns [`Error::Forbidden`] on denial.
pub fn authorize(user: &User, ability: Ability, target: Target<'_>) -> Result<()> {
  if allows(user, ability, target) {
    Ok(())
  } else {
    Err(Error::Forbidden(ability))
  }
}
