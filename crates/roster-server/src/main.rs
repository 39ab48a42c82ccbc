//! roster-server binary.
//!
//! Reads `roster.toml` (or the path specified with `--config`), opens the
//! SQLite store, and serves the contacts API over HTTP.
//!
//! # Provisioning users
//!
//! ```text
//! cargo run -p roster-server -- --add-user alice
//! ```
//!
//! prompts for a password on stdin, creates the user, and prints the API
//! token once. Only its digest is stored.

use std::{io, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use roster_api::auth::{generate_token, hash_password, hash_token};
use roster_core::{store::ContactStore, user::NewUser};
use roster_server::ServerConfig;
use roster_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Roster contacts server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "roster.toml")]
  config: PathBuf,

  /// Create a user with a password read from stdin, print its API token,
  /// and exit.
  #[arg(long, value_name = "USERNAME")]
  add_user: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load config from {:?}", cli.config))?;

  let store_path = server_cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(username) = cli.add_user {
    return add_user(&store, username).await;
  }

  let app = roster_server::app(Arc::new(store));
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn add_user(store: &SqliteStore, username: String) -> anyhow::Result<()> {
  let password = read_password()?;
  anyhow::ensure!(!password.is_empty(), "password must not be empty");

  let password_hash =
    hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
  let token = generate_token();

  let user = store
    .add_user(NewUser {
      username,
      password_hash,
      token_hash: hash_token(&token),
    })
    .await
    .context("failed to create user")?;

  tracing::info!(user_id = user.user_id, username = %user.username, "user created");
  println!("{token}");
  Ok(())
}

/// Read a password line from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{BufRead, Write};
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
