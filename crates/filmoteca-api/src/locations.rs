//! Handlers for `/locations/{id}/path`.

use axum::{
  Json,
  extract::{Path, State},
};
use filmoteca_core::{normalize::location_display, person::LocationId, store::PersonStore};
use serde::Serialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct LocationPath {
  /// The location first, then each ancestor up to the root.
  pub path:    Vec<String>,
  /// e.g. `"Rosario, Santa Fe, Argentina"`
  pub display: String,
}

/// `GET /locations/{id}/path`
pub async fn path<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<LocationId>,
) -> Result<Json<LocationPath>, ApiError>
where
  S: PersonStore,
{
  let path = state
    .store
    .location_path(id)
    .await
    .map_err(ApiError::from_store)?;
  if path.is_empty() {
    return Err(ApiError::NotFound(format!("location {id} not found")));
  }
  let display = location_display(&path);
  Ok(Json(LocationPath { path, display }))
}
