//! The relation inventory: every collection a person owns, its natural key,
//! and how a merge transfers it.
//!
//! This is configuration only. The diff engine and the merge planner both
//! read it, and the storage backend uses the table/column names to address
//! rows, so choosing the right key per relation here is what keeps a merge
//! from tripping a uniqueness constraint.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator as _, IntoStaticStr};

use crate::{
  normalize::comparison_key,
  person::{LocationId, MovieId, PersonId, RoleId, RowId},
};

// ─── Policies ────────────────────────────────────────────────────────────────

/// How rows of a relation move from the loser to the survivor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPolicy {
  /// Moved only if the survivor has no row with the same natural key;
  /// otherwise discarded.
  KeyDeduplicated,
  /// Always moved; no natural key beyond the owning person.
  Additive,
}

// ─── Relations ───────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Relation {
  AlternativeNames,
  Links,
  Nationalities,
  Cast,
  Crew,
  ImageAppearances,
  Awards,
  FestivalJury,
  FestivalAwardWinners,
  PageViews,
}

impl Relation {
  pub fn policy(self) -> TransferPolicy {
    match self {
      Self::AlternativeNames
      | Self::Links
      | Self::Nationalities
      | Self::Cast
      | Self::Crew => TransferPolicy::KeyDeduplicated,
      Self::ImageAppearances
      | Self::Awards
      | Self::FestivalJury
      | Self::FestivalAwardWinners
      | Self::PageViews => TransferPolicy::Additive,
    }
  }

  /// Backing table.
  pub fn table(self) -> &'static str {
    match self {
      Self::AlternativeNames => "person_alternative_names",
      Self::Links => "person_links",
      Self::Nationalities => "person_nationalities",
      Self::Cast => "movie_cast",
      Self::Crew => "movie_crew",
      Self::ImageAppearances => "image_people",
      Self::Awards => "movie_awards",
      Self::FestivalJury => "festival_jury",
      Self::FestivalAwardWinners => "festival_award_winners",
      Self::PageViews => "page_views",
    }
  }

  /// Column holding the owning person's id.
  pub fn person_column(self) -> &'static str {
    match self {
      Self::Awards => "recipient_person_id",
      _ => "person_id",
    }
  }

  pub fn name(self) -> &'static str { self.into() }

  pub fn all() -> impl Iterator<Item = Relation> { Self::iter() }

  pub fn key_deduplicated() -> impl Iterator<Item = Relation> {
    Self::iter().filter(|r| r.policy() == TransferPolicy::KeyDeduplicated)
  }

  pub fn additive() -> impl Iterator<Item = Relation> {
    Self::iter().filter(|r| r.policy() == TransferPolicy::Additive)
  }
}

// ─── Natural keys ────────────────────────────────────────────────────────────

/// The tuple that must stay unique per person for a key-deduplicated
/// relation.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NaturalKey {
  /// Alternative name after [`comparison_key`].
  Name(String),
  Url(String),
  Location(LocationId),
  Movie(MovieId),
  MovieRole(MovieId, RoleId),
}

/// A relation row that participates in key deduplication.
pub trait Keyed {
  fn natural_key(&self) -> NaturalKey;
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// An alias or stage name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeName {
  pub id:        RowId,
  pub person_id: PersonId,
  pub full_name: String,
}

impl Keyed for AlternativeName {
  fn natural_key(&self) -> NaturalKey {
    NaturalKey::Name(comparison_key(&self.full_name))
  }
}

/// An external reference (Wikipedia, IMDb page, official site, …).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonLink {
  pub id:            RowId,
  pub person_id:     PersonId,
  pub url:           String,
  pub link_type:     Option<String>,
  pub title:         Option<String>,
  pub is_verified:   bool,
  pub display_order: i64,
}

impl Keyed for PersonLink {
  fn natural_key(&self) -> NaturalKey { NaturalKey::Url(self.url.clone()) }
}

/// Person ↔ country. Keyed by `(person_id, location_id)` in storage; there
/// is no surrogate id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonNationality {
  pub person_id:     PersonId,
  pub location_id:   LocationId,
  pub location_name: String,
  pub is_primary:    bool,
}

impl Keyed for PersonNationality {
  fn natural_key(&self) -> NaturalKey { NaturalKey::Location(self.location_id) }
}

/// An acting credit. A person holds at most one per movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastCredit {
  pub id:                  RowId,
  pub movie_id:            MovieId,
  pub person_id:           PersonId,
  /// The alternative name the person was credited under, if any.
  pub alternative_name_id: Option<RowId>,
  pub character_name:      Option<String>,
  pub billing_order:       Option<i64>,
  pub is_principal:        bool,
  pub notes:               Option<String>,
}

impl Keyed for CastCredit {
  fn natural_key(&self) -> NaturalKey { NaturalKey::Movie(self.movie_id) }
}

/// A technical credit. A person may hold several roles in one movie, never
/// the same role twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewCredit {
  pub id:                  RowId,
  pub movie_id:            MovieId,
  pub person_id:           PersonId,
  pub role_id:             RoleId,
  pub alternative_name_id: Option<RowId>,
  pub billing_order:       Option<i64>,
  pub notes:               Option<String>,
}

impl Keyed for CrewCredit {
  fn natural_key(&self) -> NaturalKey {
    NaturalKey::MovieRole(self.movie_id, self.role_id)
  }
}

// ─── Scalar fields ───────────────────────────────────────────────────────────

/// Scalar fields of a [`Person`](crate::person::Person) as seen by the diff
/// and the merge. Grouped values (dates, photo, TMDB identity) are one field.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScalarField {
  Name,
  RealName,
  BirthDate,
  DeathDate,
  BirthLocation,
  DeathLocation,
  Biography,
  Photo,
  Gender,
  ImdbId,
  TmdbId,
}

impl ScalarField {
  pub fn label(self) -> &'static str {
    match self {
      Self::Name => "Name",
      Self::RealName => "Real name",
      Self::BirthDate => "Birth date",
      Self::DeathDate => "Death date",
      Self::BirthLocation => "Birth place",
      Self::DeathLocation => "Death place",
      Self::Biography => "Biography",
      Self::Photo => "Photo",
      Self::Gender => "Gender",
      Self::ImdbId => "IMDb ID",
      Self::TmdbId => "TMDB ID",
    }
  }

  pub fn all() -> impl Iterator<Item = ScalarField> { Self::iter() }
}
