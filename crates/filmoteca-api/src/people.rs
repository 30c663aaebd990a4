//! Handlers for `/people/{id}`.

use axum::{
  Json,
  extract::{Path, State},
};
use filmoteca_core::{
  person::{Person, PersonId},
  store::PersonStore,
};

use crate::{ApiState, error::ApiError};

/// `GET /people/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<PersonId>,
) -> Result<Json<Person>, ApiError>
where
  S: PersonStore,
{
  let person = state
    .store
    .get_person(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(Json(person))
}
