//! Error types for `roster-core`.

use thiserror::Error;

use crate::{policy::Ability, validation::ValidationErrors};

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(ValidationErrors),

  #[error("not permitted to {0}")]
  Forbidden(Ability),
}

impl From<ValidationErrors> for Error {
  fn from(errors: ValidationErrors) -> Self { Self::Validation(errors) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
