//! The `PersonStore` trait: what the merge engine needs from a storage
//! backend.
//!
//! The trait is implemented by storage backends (e.g.
//! `filmoteca-store-sqlite`). Higher layers (`filmoteca-api`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  Error,
  diff::{self, MergePreview},
  merge::{CandidatePair, MergeOptions, MergeOutcome, MergeRequest},
  person::{LocationId, Person, PersonId},
  snapshot::PersonSnapshot,
};

// ─── Error classification ────────────────────────────────────────────────────

/// Recover the domain condition, if any, carried by a backend error.
///
/// Lets callers tell "not found" or "merge failed" apart from I/O failures
/// without knowing the backend's error type.
pub trait DomainError {
  fn domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the catalog's person storage.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait PersonStore: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;

  /// Retrieve a person by id. Returns `None` if not found.
  fn get_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Ancestor names of a location, the location itself first.
  fn location_path(
    &self,
    id: LocationId,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Load both candidates and every relation the merge looks at, in one
  /// read transaction.
  ///
  /// Fails with [`Error::PersonNotFound`] if either id does not resolve.
  fn load_candidates(
    &self,
    pair: CandidatePair,
  ) -> impl Future<Output = Result<(PersonSnapshot, PersonSnapshot), Self::Error>>
  + Send
  + '_;

  /// Consolidate the loser into the survivor and delete the loser, all in
  /// one transaction. Returns the survivor as stored after commit.
  ///
  /// Fails with [`Error::PersonNotFound`] if either id does not resolve, and
  /// with [`Error::MergeFailed`] if anything goes wrong while applying; in
  /// both cases nothing is changed.
  fn merge(
    &self,
    request: MergeRequest,
    options: MergeOptions,
  ) -> impl Future<Output = Result<MergeOutcome, Self::Error>> + Send + '_;
}

/// Read both candidates and compute the merge preview. Read-only.
pub async fn preview_merge<S: PersonStore>(
  store: &S,
  pair: CandidatePair,
) -> Result<MergePreview, S::Error> {
  let (a, b) = store.load_candidates(pair).await?;
  Ok(diff::preview(&a, &b))
}
