//! Handlers for the merge workflow.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/people/merge/preview` | Body: [`PreviewBody`]; read-only |
//! | `POST` | `/people/merge` | Body: [`MergeBody`]; returns the survivor and a per-relation report |
//!
//! Ids are optional in the bodies so a missing one is reported as 400 with
//! the usual `{"error": ...}` body. Unparseable bodies get the same shape.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use filmoteca_core::{
  diff::MergePreview,
  merge::{CandidatePair, MergeOptions, MergeOutcome, MergeRequest},
  person::PersonId,
  store::{PersonStore, preview_merge},
};
use serde::Deserialize;
use tracing::debug;

use crate::{ApiState, error::ApiError};

fn required(id: Option<PersonId>, field: &str) -> Result<PersonId, ApiError> {
  id.ok_or_else(|| ApiError::BadRequest(format!("{field} is required")))
}

// ─── Preview ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PreviewBody {
  pub person_a_id: Option<PersonId>,
  pub person_b_id: Option<PersonId>,
}

/// `POST /people/merge/preview`, body: `{"person_a_id":1,"person_b_id":2}`
pub async fn preview<S>(
  State(state): State<ApiState<S>>,
  body: Result<Json<PreviewBody>, JsonRejection>,
) -> Result<Json<MergePreview>, ApiError>
where
  S: PersonStore,
{
  let Json(body) = body?;
  let pair = CandidatePair::new(
    required(body.person_a_id, "person_a_id")?,
    required(body.person_b_id, "person_b_id")?,
  )?;

  let preview = preview_merge(state.store.as_ref(), pair)
    .await
    .map_err(ApiError::from_store)?;
  debug!(
    a = pair.a(),
    b = pair.b(),
    fields = preview.field_comparisons.len(),
    "merge preview"
  );
  Ok(Json(preview))
}

// ─── Execute ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MergeBody {
  pub person_a_id:                Option<PersonId>,
  pub person_b_id:                Option<PersonId>,
  /// Must be one of the two candidates. There is no default: a tie in the
  /// preview has to be resolved by the caller.
  pub survivor_id:                Option<PersonId>,
  /// Overrides the server default when set.
  pub record_loser_name_as_alias: Option<bool>,
}

/// `POST /people/merge`, body:
/// `{"person_a_id":1,"person_b_id":2,"survivor_id":2}`
pub async fn execute<S>(
  State(state): State<ApiState<S>>,
  body: Result<Json<MergeBody>, JsonRejection>,
) -> Result<Json<MergeOutcome>, ApiError>
where
  S: PersonStore,
{
  let Json(body) = body?;
  let request = MergeRequest::new(
    required(body.person_a_id, "person_a_id")?,
    required(body.person_b_id, "person_b_id")?,
    required(body.survivor_id, "survivor_id")?,
  )?;

  let options = MergeOptions {
    record_loser_name_as_alias: body
      .record_loser_name_as_alias
      .unwrap_or(state.merge_defaults.record_loser_name_as_alias),
  };

  let outcome = state
    .store
    .merge(request, options)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(outcome))
}
