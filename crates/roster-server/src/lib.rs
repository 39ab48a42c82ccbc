//! Roster HTTP server: configuration and application assembly.
//!
//! The binary in `main.rs` only wires these pieces to a listener.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use roster_core::store::ContactStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Prefix for environment overrides, e.g. `ROSTER_PORT=9000`.
pub const ENV_PREFIX: &str = "ROSTER";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `roster.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("roster.db") }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       default_host(),
      port:       default_port(),
      store_path: default_store_path(),
    }
  }
}

impl ServerConfig {
  /// Load from an optional TOML file at `path`, overridden by `ROSTER_*`
  /// environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// `store_path` with a leading `~/` expanded to the user's home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The full application: the contacts API under `/api`, with request tracing.
pub fn app<S>(store: Arc<S>) -> Router
where
  S: ContactStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .nest("/api", roster_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}
