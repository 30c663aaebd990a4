//! JSON REST API for the Filmoteca person merge engine.
//!
//! Exposes an axum [`Router`] backed by any [`PersonStore`]. Auth, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", filmoteca_api::api_router(store.clone(), MergeOptions::default()))
//! ```

pub mod error;
pub mod locations;
pub mod merge;
pub mod people;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use filmoteca_core::{merge::MergeOptions, store::PersonStore};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:          Arc<S>,
  /// Applied to merge requests that do not set the options themselves.
  pub merge_defaults: MergeOptions,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:          Arc::clone(&self.store),
      merge_defaults: self.merge_defaults,
    }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, merge_defaults: MergeOptions) -> Router<()>
where
  S: PersonStore + 'static,
{
  Router::new()
    // People
    .route("/people/{id}", get(people::get_one::<S>))
    // Merge
    .route("/people/merge/preview", post(merge::preview::<S>))
    .route("/people/merge", post(merge::execute::<S>))
    // Locations
    .route("/locations/{id}/path", get(locations::path::<S>))
    .with_state(ApiState { store, merge_defaults })
}
