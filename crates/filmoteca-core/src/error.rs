//! Error types for `filmoteca-core`.

use thiserror::Error;

use crate::person::PersonId;

/// The conditions a preview or merge can fail with.
///
/// A tied survivor suggestion is not an error; see
/// [`SuggestedSurvivor::Tie`](crate::survivor::SuggestedSurvivor::Tie).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// Rejected before any read: identical ids, a missing id, or a survivor
  /// that is not one of the two candidates.
  #[error("invalid request: {0}")]
  InvalidRequest(String),

  #[error("person not found: {0}")]
  PersonNotFound(PersonId),

  /// The merge transaction was rolled back; no changes were applied.
  #[error("merge failed, no changes applied: {0}")]
  MergeFailed(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
