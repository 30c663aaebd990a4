//! Diff engine: what merging two candidates would do.
//!
//! Works on two [`PersonSnapshot`]s that the store read in one transaction.
//! Everything here is pure and symmetric: swapping A and B swaps the
//! per-candidate numbers and leaves the shared counts untouched.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
  normalize::{location_display, same_name, truncate_for_display},
  person::{Blank as _, Person, PersonName},
  relation::{
    AlternativeName, NaturalKey, PersonLink, PersonNationality, Relation,
    ScalarField, TransferPolicy,
  },
  snapshot::PersonSnapshot,
  survivor::{SuggestedSurvivor, suggest},
};

// ─── Relation counts ─────────────────────────────────────────────────────────

/// Set comparison of one relation across the two candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationComparison {
  /// Keys present under both identities; `None` for additive relations,
  /// where sharing is impossible.
  pub shared:   Option<u64>,
  pub unique_a: u64,
  pub unique_b: u64,
}

/// Intersect and subtract two natural-key sets.
pub fn compare_keys(
  a: &BTreeSet<NaturalKey>,
  b: &BTreeSet<NaturalKey>,
) -> RelationComparison {
  let shared = a.intersection(b).count() as u64;
  RelationComparison {
    shared:   Some(shared),
    unique_a: a.len() as u64 - shared,
    unique_b: b.len() as u64 - shared,
  }
}

/// Compare one relation according to its transfer policy.
pub fn compare_relation(
  a: &PersonSnapshot,
  b: &PersonSnapshot,
  relation: Relation,
) -> RelationComparison {
  match relation.policy() {
    TransferPolicy::KeyDeduplicated => {
      compare_keys(&a.natural_keys(relation), &b.natural_keys(relation))
    }
    TransferPolicy::Additive => RelationComparison {
      shared:   None,
      unique_a: a.row_count(relation),
      unique_b: b.row_count(relation),
    },
  }
}

// ─── Field comparisons ───────────────────────────────────────────────────────

/// One scalar field that differs or is set on at least one side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldComparison {
  pub field:     ScalarField,
  pub label:     String,
  pub value_a:   Value,
  pub value_b:   Value,
  pub display_a: String,
  pub display_b: String,
}

struct ScalarView {
  raw:     Value,
  display: String,
  blank:   bool,
}

fn name_value(name: &PersonName) -> Value {
  json!({ "first_name": name.first_name, "last_name": name.last_name })
}

fn scalar_view(snapshot: &PersonSnapshot, field: ScalarField) -> ScalarView {
  let p = &snapshot.person;
  let text = |v: &Option<String>| ScalarView {
    raw:     json!(v),
    display: v.clone().unwrap_or_default(),
    blank:   v.is_blank(),
  };

  match field {
    ScalarField::Name => ScalarView {
      raw:     name_value(&p.name),
      display: p.name.full(),
      blank:   p.name.is_blank(),
    },
    ScalarField::RealName => text(&p.real_name),
    ScalarField::BirthDate => ScalarView {
      raw:     json!(p.birth_date),
      display: p.birth_date.display(),
      blank:   p.birth_date.is_blank(),
    },
    ScalarField::DeathDate => ScalarView {
      raw:     json!(p.death_date),
      display: p.death_date.display(),
      blank:   p.death_date.is_blank(),
    },
    ScalarField::BirthLocation => ScalarView {
      raw:     json!(p.birth_location_id),
      display: location_display(&snapshot.birth_location_path),
      blank:   p.birth_location_id.is_blank(),
    },
    ScalarField::DeathLocation => ScalarView {
      raw:     json!(p.death_location_id),
      display: location_display(&snapshot.death_location_path),
      blank:   p.death_location_id.is_blank(),
    },
    ScalarField::Biography => ScalarView {
      raw:     json!(p.biography),
      display: p.biography.as_deref().map(truncate_for_display).unwrap_or_default(),
      blank:   p.biography.is_blank(),
    },
    ScalarField::Photo => ScalarView {
      raw:     json!(p.photo.url),
      display: p.photo.url.clone().unwrap_or_default(),
      blank:   p.photo.is_blank(),
    },
    ScalarField::Gender => ScalarView {
      raw:     json!(p.gender),
      display: p.gender.map(|g| g.as_str().to_owned()).unwrap_or_default(),
      blank:   p.gender.is_blank(),
    },
    ScalarField::ImdbId => text(&p.imdb_id),
    ScalarField::TmdbId => ScalarView {
      raw:     json!(p.tmdb.id),
      display: p.tmdb.id.map(|id| id.to_string()).unwrap_or_default(),
      blank:   p.tmdb.is_blank(),
    },
  }
}

/// Scalar fields worth showing the admin.
///
/// A field empty on both sides is omitted. The name is only emitted when
/// the full names differ ignoring case and diacritics.
pub fn compare_fields(
  a: &PersonSnapshot,
  b: &PersonSnapshot,
) -> Vec<FieldComparison> {
  ScalarField::all()
    .filter_map(|field| {
      let va = scalar_view(a, field);
      let vb = scalar_view(b, field);

      let relevant = match field {
        ScalarField::Name => !same_name(&va.display, &vb.display),
        _ => !(va.blank && vb.blank),
      };

      relevant.then(|| FieldComparison {
        field,
        label: field.label().to_owned(),
        value_a: va.raw,
        value_b: vb.raw,
        display_a: va.display,
        display_b: vb.display,
      })
    })
    .collect()
}

// ─── Preview ─────────────────────────────────────────────────────────────────

/// A candidate as shown side by side in the preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
  #[serde(flatten)]
  pub person:                 Person,
  pub birth_location_path:    Vec<String>,
  pub death_location_path:    Vec<String>,
  /// `"Rosario, Santa Fe, Argentina"`; empty when the place is unknown.
  pub birth_location_display: String,
  pub death_location_display: String,
  pub alternative_names:      Vec<AlternativeName>,
  pub links:                  Vec<PersonLink>,
  pub nationalities:          Vec<PersonNationality>,
  /// Cast rows plus crew rows.
  pub credited_work_count:    u64,
}

impl From<&PersonSnapshot> for CandidateSummary {
  fn from(s: &PersonSnapshot) -> Self {
    Self {
      person:                 s.person.clone(),
      birth_location_path:    s.birth_location_path.clone(),
      death_location_path:    s.death_location_path.clone(),
      birth_location_display: location_display(&s.birth_location_path),
      death_location_display: location_display(&s.death_location_path),
      alternative_names:      s.alternative_names.clone(),
      links:                  s.links.clone(),
      nationalities:          s.nationalities.clone(),
      credited_work_count:    s.credited_work_count(),
    }
  }
}

/// Rows each candidate would contribute that the other does not already
/// have, per relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueCounts {
  #[serde(rename = "A")]
  pub a: BTreeMap<Relation, u64>,
  #[serde(rename = "B")]
  pub b: BTreeMap<Relation, u64>,
}

/// Everything the admin needs to decide on a merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergePreview {
  pub person_a:           CandidateSummary,
  pub person_b:           CandidateSummary,
  pub suggested_survivor: SuggestedSurvivor,
  pub field_comparisons:  Vec<FieldComparison>,
  /// Key-deduplicated relations only.
  pub shared_counts:      BTreeMap<Relation, u64>,
  pub unique_counts:      UniqueCounts,
}

/// Build the preview for candidates `a` and `b`.
pub fn preview(a: &PersonSnapshot, b: &PersonSnapshot) -> MergePreview {
  let mut shared_counts = BTreeMap::new();
  let mut unique_counts = UniqueCounts::default();

  for relation in Relation::all() {
    let cmp = compare_relation(a, b, relation);
    if let Some(shared) = cmp.shared {
      shared_counts.insert(relation, shared);
    }
    unique_counts.a.insert(relation, cmp.unique_a);
    unique_counts.b.insert(relation, cmp.unique_b);
  }

  MergePreview {
    person_a: a.into(),
    person_b: b.into(),
    suggested_survivor: suggest(a.credited_work_count(), b.credited_work_count()),
    field_comparisons: compare_fields(a, b),
    shared_counts,
    unique_counts,
  }
}
