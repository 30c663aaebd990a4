//! A person together with every relation the merge engine looks at, read in
//! one consistent transaction.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
  person::Person,
  relation::{
    AlternativeName, CastCredit, CrewCredit, Keyed, NaturalKey, PersonLink,
    PersonNationality, Relation, TransferPolicy,
  },
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonSnapshot {
  pub person:              Person,
  /// Birth location first, then each ancestor up to the root.
  pub birth_location_path: Vec<String>,
  pub death_location_path: Vec<String>,
  pub alternative_names:   Vec<AlternativeName>,
  pub links:               Vec<PersonLink>,
  pub nationalities:       Vec<PersonNationality>,
  pub cast:                Vec<CastCredit>,
  pub crew:                Vec<CrewCredit>,
  /// Row counts for every additive relation. Missing entries mean zero.
  pub additive_counts:     BTreeMap<Relation, u64>,
}

impl PersonSnapshot {
  /// Natural keys present for a key-deduplicated relation; empty for
  /// additive relations.
  pub fn natural_keys(&self, relation: Relation) -> BTreeSet<NaturalKey> {
    fn keys<T: Keyed>(rows: &[T]) -> BTreeSet<NaturalKey> {
      rows.iter().map(Keyed::natural_key).collect()
    }

    match relation {
      Relation::AlternativeNames => keys(&self.alternative_names),
      Relation::Links => keys(&self.links),
      Relation::Nationalities => keys(&self.nationalities),
      Relation::Cast => keys(&self.cast),
      Relation::Crew => keys(&self.crew),
      _ => BTreeSet::new(),
    }
  }

  /// Number of rows this person owns in `relation`.
  pub fn row_count(&self, relation: Relation) -> u64 {
    match relation {
      Relation::AlternativeNames => self.alternative_names.len() as u64,
      Relation::Links => self.links.len() as u64,
      Relation::Nationalities => self.nationalities.len() as u64,
      Relation::Cast => self.cast.len() as u64,
      Relation::Crew => self.crew.len() as u64,
      additive => {
        debug_assert_eq!(additive.policy(), TransferPolicy::Additive);
        self.additive_counts.get(&additive).copied().unwrap_or(0)
      }
    }
  }

  /// Total credited-work volume: cast rows plus crew rows.
  pub fn credited_work_count(&self) -> u64 {
    self.row_count(Relation::Cast) + self.row_count(Relation::Crew)
  }
}

#[cfg(test)]
pub(crate) mod fixtures {
  //! Builders shared by the diff and merge unit tests.

  use chrono::{TimeZone as _, Utc};

  use super::*;
  use crate::person::{PartialDate, Person, PersonName, Photo, TmdbIdentity};

  pub fn person(id: i64, first: &str, last: &str) -> Person {
    Person {
      id,
      slug: Some(crate::normalize::slugify(&format!("{first} {last}"))),
      name: PersonName {
        first_name: Some(first.to_owned()),
        last_name:  Some(last.to_owned()),
      },
      real_name: None,
      birth_date: PartialDate::default(),
      death_date: PartialDate::default(),
      birth_location_id: None,
      death_location_id: None,
      biography: None,
      photo: Photo::default(),
      gender: None,
      imdb_id: None,
      tmdb: TmdbIdentity::default(),
      has_links: false,
      updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
  }

  pub fn snapshot(person: Person) -> PersonSnapshot {
    PersonSnapshot {
      person,
      birth_location_path: vec![],
      death_location_path: vec![],
      alternative_names: vec![],
      links: vec![],
      nationalities: vec![],
      cast: vec![],
      crew: vec![],
      additive_counts: BTreeMap::new(),
    }
  }

  pub fn cast(id: i64, person_id: i64, movie_id: i64) -> CastCredit {
    CastCredit {
      id,
      movie_id,
      person_id,
      alternative_name_id: None,
      character_name: None,
      billing_order: None,
      is_principal: false,
      notes: None,
    }
  }

  pub fn crew(id: i64, person_id: i64, movie_id: i64, role_id: i64) -> CrewCredit {
    CrewCredit {
      id,
      movie_id,
      person_id,
      role_id,
      alternative_name_id: None,
      billing_order: None,
      notes: None,
    }
  }

  pub fn alias(id: i64, person_id: i64, full_name: &str) -> AlternativeName {
    AlternativeName { id, person_id, full_name: full_name.to_owned() }
  }

  pub fn nationality(person_id: i64, location_id: i64) -> PersonNationality {
    PersonNationality {
      person_id,
      location_id,
      location_name: format!("country {location_id}"),
      is_primary: false,
    }
  }
}
