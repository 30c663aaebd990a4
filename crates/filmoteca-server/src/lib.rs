//! HTTP server for the Filmoteca merge engine: configuration, the auth gate,
//! and the top-level router that mounts the API under `/api`.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware};
use filmoteca_core::{merge::MergeOptions, store::PersonStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `FILMOTECA_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                       String,
  pub port:                       u16,
  pub database_path:              PathBuf,
  pub auth_username:              String,
  pub auth_password_hash:         String,
  /// Default for merges that do not say whether to keep the loser's name
  /// as an alternative name.
  #[serde(default)]
  pub record_loser_name_as_alias: bool,
}

impl ServerConfig {
  pub fn merge_defaults(&self) -> MergeOptions {
    MergeOptions { record_loser_name_as_alias: self.record_loser_name_as_alias }
  }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the server's router: every route requires Basic auth and every
/// request is traced.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: PersonStore + 'static,
{
  Router::new()
    .nest("/api", filmoteca_api::api_router(store, config.merge_defaults()))
    .layer(middleware::from_fn_with_state(Arc::new(config.auth()), require_auth))
    .layer(TraceLayer::new_for_http())
}
