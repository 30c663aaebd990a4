//! Merge planning: decide, from two snapshots, exactly which rows move,
//! which are discarded, and what the survivor's scalar fields become.
//!
//! The plan is pure. A storage backend reads both snapshots inside its write
//! transaction, calls [`plan`], applies the result, and checks the post-merge
//! row counts against [`MergePlan::expected_rows`] before committing.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  normalize::{comparison_key, same_name},
  person::{Blank, MovieId, Person, PersonId, RowId},
  relation::{Keyed as _, NaturalKey, Relation, ScalarField},
  snapshot::PersonSnapshot,
};

// ─── Requests ────────────────────────────────────────────────────────────────

/// Two distinct person ids. Constructing one is the validation step that
/// precedes any read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePair {
  a: PersonId,
  b: PersonId,
}

impl CandidatePair {
  pub fn new(a: PersonId, b: PersonId) -> Result<Self> {
    if a == b {
      return Err(Error::InvalidRequest(format!(
        "cannot merge person {a} with itself"
      )));
    }
    Ok(Self { a, b })
  }

  pub fn a(&self) -> PersonId { self.a }

  pub fn b(&self) -> PersonId { self.b }

  pub fn contains(&self, id: PersonId) -> bool { id == self.a || id == self.b }
}

/// A confirmed merge: the pair plus the admin's explicit survivor choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
  pair:     CandidatePair,
  survivor: PersonId,
}

impl MergeRequest {
  pub fn new(a: PersonId, b: PersonId, survivor: PersonId) -> Result<Self> {
    let pair = CandidatePair::new(a, b)?;
    if !pair.contains(survivor) {
      return Err(Error::InvalidRequest(format!(
        "survivor {survivor} is neither {a} nor {b}"
      )));
    }
    Ok(Self { pair, survivor })
  }

  pub fn pair(&self) -> CandidatePair { self.pair }

  pub fn survivor_id(&self) -> PersonId { self.survivor }

  pub fn loser_id(&self) -> PersonId {
    if self.survivor == self.pair.a { self.pair.b } else { self.pair.a }
  }
}

/// Optional behaviour of a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
  /// Keep the loser's full name as an alternative name of the survivor when
  /// it differs from the survivor's name.
  #[serde(default)]
  pub record_loser_name_as_alias: bool,
}

// ─── Scalars ─────────────────────────────────────────────────────────────────

/// The single rule for every scalar field: the survivor's value stands
/// unless it is empty, in which case the loser's value is taken.
pub fn fill_empty<T: Blank + Clone>(survivor: &T, loser: &T) -> T {
  if survivor.is_blank() && !loser.is_blank() {
    loser.clone()
  } else {
    survivor.clone()
  }
}

/// Apply [`fill_empty`] to every [`ScalarField`].
pub fn merge_scalars(survivor: &Person, loser: &Person) -> Person {
  let mut merged = survivor.clone();
  for field in ScalarField::all() {
    match field {
      ScalarField::Name => merged.name = fill_empty(&survivor.name, &loser.name),
      ScalarField::RealName => {
        merged.real_name = fill_empty(&survivor.real_name, &loser.real_name)
      }
      ScalarField::BirthDate => {
        merged.birth_date = fill_empty(&survivor.birth_date, &loser.birth_date)
      }
      ScalarField::DeathDate => {
        merged.death_date = fill_empty(&survivor.death_date, &loser.death_date)
      }
      ScalarField::BirthLocation => {
        merged.birth_location_id =
          fill_empty(&survivor.birth_location_id, &loser.birth_location_id)
      }
      ScalarField::DeathLocation => {
        merged.death_location_id =
          fill_empty(&survivor.death_location_id, &loser.death_location_id)
      }
      ScalarField::Biography => {
        merged.biography = fill_empty(&survivor.biography, &loser.biography)
      }
      ScalarField::Photo => merged.photo = fill_empty(&survivor.photo, &loser.photo),
      ScalarField::Gender => merged.gender = fill_empty(&survivor.gender, &loser.gender),
      ScalarField::ImdbId => {
        merged.imdb_id = fill_empty(&survivor.imdb_id, &loser.imdb_id)
      }
      ScalarField::TmdbId => merged.tmdb = fill_empty(&survivor.tmdb, &loser.tmdb),
    }
  }
  merged
}

// ─── Plan ────────────────────────────────────────────────────────────────────

/// Row movements for one key-deduplicated relation. Keys are sorted, so the
/// plan does not depend on the order rows were read in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedTransfer {
  pub relation:      Relation,
  /// Rows the survivor owned before the merge.
  pub survivor_rows: u64,
  /// Loser keys absent under the survivor: reassigned.
  pub transfer:      Vec<NaturalKey>,
  /// Loser keys already present under the survivor: deleted.
  pub discard:       Vec<NaturalKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdditiveTransfer {
  pub relation:      Relation,
  pub survivor_rows: u64,
  pub loser_rows:    u64,
}

/// A discarded loser alternative name and the survivor row that replaces
/// it in cast/crew credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasRemap {
  pub from: RowId,
  pub to:   RowId,
}

/// A shared cast credit whose survivor row has no character name yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterFill {
  pub movie_id:       MovieId,
  pub character_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergePlan {
  pub survivor_id:     PersonId,
  pub loser_id:        PersonId,
  /// The survivor's scalar fields after the merge.
  pub merged:          Person,
  /// The survivor inherited the loser's name, so its slug must be rebuilt.
  pub renamed:         bool,
  pub keyed:           Vec<KeyedTransfer>,
  pub additive:        Vec<AdditiveTransfer>,
  /// Applied before any alternative name is deleted.
  pub alias_remaps:    Vec<AliasRemap>,
  pub character_fills: Vec<CharacterFill>,
  /// Loser's full name to add as a survivor alternative name.
  pub new_alias:       Option<String>,
}

impl MergePlan {
  /// Rows the survivor must own in `relation` once the plan is applied:
  /// its own, plus every transferred row, each shared key counted once.
  pub fn expected_rows(&self, relation: Relation) -> u64 {
    if let Some(k) = self.keyed.iter().find(|k| k.relation == relation) {
      let alias = u64::from(
        relation == Relation::AlternativeNames && self.new_alias.is_some(),
      );
      return k.survivor_rows + k.transfer.len() as u64 + alias;
    }
    self
      .additive
      .iter()
      .find(|a| a.relation == relation)
      .map(|a| a.survivor_rows + a.loser_rows)
      .unwrap_or(0)
  }

  /// Per-relation statistics for the caller.
  pub fn report(&self) -> MergeReport {
    let mut relations = BTreeMap::new();
    for k in &self.keyed {
      relations.insert(k.relation, RelationStats {
        transferred: k.transfer.len() as u64,
        discarded:   k.discard.len() as u64,
      });
    }
    for a in &self.additive {
      relations.insert(a.relation, RelationStats {
        transferred: a.loser_rows,
        discarded:   0,
      });
    }
    MergeReport {
      relations,
      character_names_filled: self.character_fills.len() as u64,
      alias_added: self.new_alias.clone(),
    }
  }
}

/// Build the merge plan for `loser` folding into `survivor`.
pub fn plan(
  survivor: &PersonSnapshot,
  loser: &PersonSnapshot,
  options: MergeOptions,
) -> MergePlan {
  let merged = merge_scalars(&survivor.person, &loser.person);
  let renamed = merged.name != survivor.person.name;

  let keyed = Relation::key_deduplicated()
    .map(|relation| {
      let ours = survivor.natural_keys(relation);
      let theirs = loser.natural_keys(relation);
      KeyedTransfer {
        relation,
        survivor_rows: survivor.row_count(relation),
        transfer: theirs.difference(&ours).cloned().collect(),
        discard: theirs.intersection(&ours).cloned().collect(),
      }
    })
    .collect();

  let additive = Relation::additive()
    .map(|relation| AdditiveTransfer {
      relation,
      survivor_rows: survivor.row_count(relation),
      loser_rows: loser.row_count(relation),
    })
    .collect();

  let survivor_aliases: BTreeMap<NaturalKey, RowId> = survivor
    .alternative_names
    .iter()
    .map(|a| (a.natural_key(), a.id))
    .collect();

  let mut alias_remaps: Vec<AliasRemap> = loser
    .alternative_names
    .iter()
    .filter_map(|a| {
      survivor_aliases
        .get(&a.natural_key())
        .map(|&to| AliasRemap { from: a.id, to })
    })
    .collect();
  alias_remaps.sort_by_key(|r| r.from);

  let survivor_cast: BTreeMap<MovieId, Option<&str>> = survivor
    .cast
    .iter()
    .map(|c| (c.movie_id, c.character_name.as_deref()))
    .collect();

  let mut character_fills: Vec<CharacterFill> = loser
    .cast
    .iter()
    .filter_map(|c| {
      let ours = survivor_cast.get(&c.movie_id)?;
      let ours_blank = ours.is_none_or(|s| s.trim().is_empty());
      let theirs = c.character_name.as_deref().filter(|s| !s.trim().is_empty())?;
      ours_blank.then(|| CharacterFill {
        movie_id:       c.movie_id,
        character_name: theirs.to_owned(),
      })
    })
    .collect();
  character_fills.sort_by_key(|f| f.movie_id);

  let new_alias = options
    .record_loser_name_as_alias
    .then(|| loser.person.name.full())
    .filter(|name| !name.is_empty())
    .filter(|name| !same_name(name, &merged.name.full()))
    .filter(|name| {
      let key = NaturalKey::Name(comparison_key(name));
      let known: BTreeSet<NaturalKey> = survivor
        .natural_keys(Relation::AlternativeNames)
        .union(&loser.natural_keys(Relation::AlternativeNames))
        .cloned()
        .collect();
      !known.contains(&key)
    });

  MergePlan {
    survivor_id: survivor.person.id,
    loser_id: loser.person.id,
    merged,
    renamed,
    keyed,
    additive,
    alias_remaps,
    character_fills,
    new_alias,
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationStats {
  pub transferred: u64,
  pub discarded:   u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
  pub relations:              BTreeMap<Relation, RelationStats>,
  pub character_names_filled: u64,
  pub alias_added:            Option<String>,
}

/// Result of a committed merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeOutcome {
  /// The consolidated survivor as stored after commit.
  pub survivor: Person,
  pub loser_id: PersonId,
  pub report:   MergeReport,
}
