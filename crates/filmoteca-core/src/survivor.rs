//! Survivor suggestion: the candidate with more credited work should
//! normally be the one that remains.
//!
//! Advisory only. The merge always takes an explicit survivor choice.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestedSurvivor {
  A,
  B,
  /// Equal volumes (including 0/0); the admin has to pick.
  #[serde(rename = "tie")]
  Tie,
}

/// Compare total credited-work volumes (cast + crew rows).
pub fn suggest(credits_a: u64, credits_b: u64) -> SuggestedSurvivor {
  match credits_a.cmp(&credits_b) {
    std::cmp::Ordering::Greater => SuggestedSurvivor::A,
    std::cmp::Ordering::Less => SuggestedSurvivor::B,
    std::cmp::Ordering::Equal => SuggestedSurvivor::Tie,
  }
}
