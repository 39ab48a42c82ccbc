//! Error type for `roster-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("username already taken: {0}")]
  UsernameTaken(String),

  #[error("api token digest already in use")]
  TokenTaken,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
