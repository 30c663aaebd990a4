//! Person: the identity that every relation in the catalog hangs off.
//!
//! Scalar fields are all optional: imports arrive with whatever subset the
//! source happened to know. Several fields only make sense together (a date's
//! parts, a photo's URL and storage id, a TMDB id and its popularity score),
//! so they are modelled as grouped values and always move as one unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type PersonId = i64;
pub type LocationId = i64;
pub type MovieId = i64;
pub type RoleId = i64;
/// Surrogate primary key of a relation row.
pub type RowId = i64;

// ─── Emptiness ───────────────────────────────────────────────────────────────

/// Whether a scalar value carries information.
///
/// A blank string counts as empty; imports frequently store `""` where they
/// mean "unknown".
pub trait Blank {
  fn is_blank(&self) -> bool;
}

impl Blank for Option<String> {
  fn is_blank(&self) -> bool {
    self.as_deref().is_none_or(|s| s.trim().is_empty())
  }
}

impl Blank for Option<i64> {
  fn is_blank(&self) -> bool { self.is_none() }
}

impl Blank for Option<Gender> {
  fn is_blank(&self) -> bool { self.is_none() }
}

// ─── Partial date ────────────────────────────────────────────────────────────

/// A date where the year is required and month/day may be independently
/// absent. A date with no year carries no information.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct PartialDate {
  pub year:  Option<i32>,
  pub month: Option<u8>,
  pub day:   Option<u8>,
}

impl PartialDate {
  pub fn new(year: i32, month: Option<u8>, day: Option<u8>) -> Self {
    Self { year: Some(year), month, day }
  }

  /// `YYYY`, `YYYY-MM`, or `YYYY-MM-DD`; empty when the year is unknown.
  ///
  /// A day without a month is rendered as `YYYY-DD`; that shape can only be
  /// produced by hand-edited rows and is shown as-is rather than hidden.
  pub fn display(&self) -> String {
    let Some(year) = self.year else {
      return String::new();
    };
    let mut out = year.to_string();
    if let Some(month) = self.month {
      out.push_str(&format!("-{month:02}"));
    }
    if let Some(day) = self.day {
      out.push_str(&format!("-{day:02}"));
    }
    out
  }
}

impl Blank for PartialDate {
  fn is_blank(&self) -> bool { self.year.is_none() }
}

// ─── Gender ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
  Other,
}

impl Gender {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Male => "male",
      Self::Female => "female",
      Self::Other => "other",
    }
  }
}

// ─── Grouped values ──────────────────────────────────────────────────────────

/// First and last name. Either part may be missing on imported rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
}

impl PersonName {
  /// Non-blank parts joined with a single space.
  pub fn full(&self) -> String {
    [&self.first_name, &self.last_name]
      .into_iter()
      .filter_map(|p| p.as_deref().map(str::trim))
      .filter(|p| !p.is_empty())
      .collect::<Vec<_>>()
      .join(" ")
  }
}

impl Blank for PersonName {
  fn is_blank(&self) -> bool { self.full().is_empty() }
}

/// A portrait hosted on the image service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
  pub url:       Option<String>,
  /// Identifier of the asset on the image host, needed to delete it later.
  pub public_id: Option<String>,
}

impl Blank for Photo {
  fn is_blank(&self) -> bool { self.url.is_blank() }
}

/// The person's TMDB identity and the popularity score fetched with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TmdbIdentity {
  pub id:         Option<i64>,
  pub popularity: Option<f64>,
}

impl Blank for TmdbIdentity {
  fn is_blank(&self) -> bool { self.id.is_none() }
}

// ─── Person ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
  pub id:                PersonId,
  /// URL slug; unique across persons.
  pub slug:              Option<String>,
  #[serde(flatten)]
  pub name:              PersonName,
  pub real_name:         Option<String>,
  pub birth_date:        PartialDate,
  pub death_date:        PartialDate,
  pub birth_location_id: Option<LocationId>,
  pub death_location_id: Option<LocationId>,
  pub biography:         Option<String>,
  pub photo:             Photo,
  pub gender:            Option<Gender>,
  pub imdb_id:           Option<String>,
  pub tmdb:              TmdbIdentity,
  /// Denormalised: whether any [`PersonLink`](crate::relation::PersonLink)
  /// rows exist for this person.
  pub has_links:         bool,
  pub updated_at:        DateTime<Utc>,
}

/// Input for creating a person. `id`, `has_links`, and `updated_at` are
/// assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewPerson {
  pub slug:              Option<String>,
  pub name:              PersonName,
  pub real_name:         Option<String>,
  pub birth_date:        PartialDate,
  pub death_date:        PartialDate,
  pub birth_location_id: Option<LocationId>,
  pub death_location_id: Option<LocationId>,
  pub biography:         Option<String>,
  pub photo:             Photo,
  pub gender:            Option<Gender>,
  pub imdb_id:           Option<String>,
  pub tmdb:              TmdbIdentity,
}

impl NewPerson {
  /// Convenience constructor with every optional field left empty.
  pub fn named(first_name: &str, last_name: &str) -> Self {
    Self {
      name: PersonName {
        first_name: Some(first_name.to_owned()),
        last_name:  Some(last_name.to_owned()),
      },
      ..Self::default()
    }
  }
}
