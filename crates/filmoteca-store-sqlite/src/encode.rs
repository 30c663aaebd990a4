//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, gender as a lowercase word,
//! booleans as 0/1 integers.

use chrono::{DateTime, Utc};
use filmoteca_core::{
  person::{
    Gender, PartialDate, Person, PersonName, Photo, TmdbIdentity,
  },
  relation::{
    AlternativeName, CastCredit, CrewCredit, NaturalKey, PersonLink,
    PersonNationality,
  },
};
use rusqlite::{Row, types::Value};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── Gender ──────────────────────────────────────────────────────────────────

pub fn encode_gender(g: Gender) -> &'static str { g.as_str() }

pub fn decode_gender(s: &str) -> Result<Gender> {
  match s {
    "male" => Ok(Gender::Male),
    "female" => Ok(Gender::Female),
    "other" => Ok(Gender::Other),
    other => Err(Error::Decode(format!("unknown gender: {other:?}"))),
  }
}

// ─── Natural keys ────────────────────────────────────────────────────────────

/// SQL predicate (anonymous `?` placeholders) selecting the row with `key`
/// within one person's rows, plus its bound values.
pub fn key_filter(key: &NaturalKey) -> (&'static str, Vec<Value>) {
  match key {
    NaturalKey::Name(k) => ("name_key = ?", vec![Value::Text(k.clone())]),
    NaturalKey::Url(url) => ("url = ?", vec![Value::Text(url.clone())]),
    NaturalKey::Location(id) => ("location_id = ?", vec![Value::Integer(*id)]),
    NaturalKey::Movie(id) => ("movie_id = ?", vec![Value::Integer(*id)]),
    NaturalKey::MovieRole(movie, role) => (
      "movie_id = ? AND role_id = ?",
      vec![Value::Integer(*movie), Value::Integer(*role)],
    ),
  }
}

// ─── Person rows ─────────────────────────────────────────────────────────────

/// Column list matching [`RawPerson::from_row`].
pub const PERSON_COLUMNS: &str = "
  id, slug, first_name, last_name, real_name,
  birth_year, birth_month, birth_day, death_year, death_month, death_day,
  birth_location_id, death_location_id, biography, photo_url, photo_public_id,
  gender, imdb_id, tmdb_id, tmdb_popularity, has_links, updated_at";

/// Values read directly from a `persons` row.
pub struct RawPerson {
  pub id:                i64,
  pub slug:              Option<String>,
  pub first_name:        Option<String>,
  pub last_name:         Option<String>,
  pub real_name:         Option<String>,
  pub birth_year:        Option<i32>,
  pub birth_month:       Option<u8>,
  pub birth_day:         Option<u8>,
  pub death_year:        Option<i32>,
  pub death_month:       Option<u8>,
  pub death_day:         Option<u8>,
  pub birth_location_id: Option<i64>,
  pub death_location_id: Option<i64>,
  pub biography:         Option<String>,
  pub photo_url:         Option<String>,
  pub photo_public_id:   Option<String>,
  pub gender:            Option<String>,
  pub imdb_id:           Option<String>,
  pub tmdb_id:           Option<i64>,
  pub tmdb_popularity:   Option<f64>,
  pub has_links:         bool,
  pub updated_at:        String,
}

impl RawPerson {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      slug:              row.get(1)?,
      first_name:        row.get(2)?,
      last_name:         row.get(3)?,
      real_name:         row.get(4)?,
      birth_year:        row.get(5)?,
      birth_month:       row.get(6)?,
      birth_day:         row.get(7)?,
      death_year:        row.get(8)?,
      death_month:       row.get(9)?,
      death_day:         row.get(10)?,
      birth_location_id: row.get(11)?,
      death_location_id: row.get(12)?,
      biography:         row.get(13)?,
      photo_url:         row.get(14)?,
      photo_public_id:   row.get(15)?,
      gender:            row.get(16)?,
      imdb_id:           row.get(17)?,
      tmdb_id:           row.get(18)?,
      tmdb_popularity:   row.get(19)?,
      has_links:         row.get(20)?,
      updated_at:        row.get(21)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      id:                self.id,
      slug:              self.slug,
      name:              PersonName {
        first_name: self.first_name,
        last_name:  self.last_name,
      },
      real_name:         self.real_name,
      birth_date:        PartialDate {
        year:  self.birth_year,
        month: self.birth_month,
        day:   self.birth_day,
      },
      death_date:        PartialDate {
        year:  self.death_year,
        month: self.death_month,
        day:   self.death_day,
      },
      birth_location_id: self.birth_location_id,
      death_location_id: self.death_location_id,
      biography:         self.biography,
      photo:             Photo {
        url:       self.photo_url,
        public_id: self.photo_public_id,
      },
      gender:            self.gender.as_deref().map(decode_gender).transpose()?,
      imdb_id:           self.imdb_id,
      tmdb:              TmdbIdentity {
        id:         self.tmdb_id,
        popularity: self.tmdb_popularity,
      },
      has_links:         self.has_links,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Relation rows ───────────────────────────────────────────────────────────

pub const ALTERNATIVE_NAME_COLUMNS: &str = "id, person_id, full_name";

pub fn alternative_name_from_row(row: &Row<'_>) -> rusqlite::Result<AlternativeName> {
  Ok(AlternativeName {
    id:        row.get(0)?,
    person_id: row.get(1)?,
    full_name: row.get(2)?,
  })
}

pub const LINK_COLUMNS: &str =
  "id, person_id, url, link_type, title, is_verified, display_order";

pub fn link_from_row(row: &Row<'_>) -> rusqlite::Result<PersonLink> {
  Ok(PersonLink {
    id:            row.get(0)?,
    person_id:     row.get(1)?,
    url:           row.get(2)?,
    link_type:     row.get(3)?,
    title:         row.get(4)?,
    is_verified:   row.get(5)?,
    display_order: row.get(6)?,
  })
}

/// Expects `n.person_id, n.location_id, l.name, n.is_primary`.
pub fn nationality_from_row(row: &Row<'_>) -> rusqlite::Result<PersonNationality> {
  Ok(PersonNationality {
    person_id:     row.get(0)?,
    location_id:   row.get(1)?,
    location_name: row.get(2)?,
    is_primary:    row.get(3)?,
  })
}

pub const CAST_COLUMNS: &str = "id, movie_id, person_id, alternative_name_id, \
                                character_name, billing_order, is_principal, notes";

pub fn cast_from_row(row: &Row<'_>) -> rusqlite::Result<CastCredit> {
  Ok(CastCredit {
    id:                  row.get(0)?,
    movie_id:            row.get(1)?,
    person_id:           row.get(2)?,
    alternative_name_id: row.get(3)?,
    character_name:      row.get(4)?,
    billing_order:       row.get(5)?,
    is_principal:        row.get(6)?,
    notes:               row.get(7)?,
  })
}

pub const CREW_COLUMNS: &str =
  "id, movie_id, person_id, role_id, alternative_name_id, billing_order, notes";

pub fn crew_from_row(row: &Row<'_>) -> rusqlite::Result<CrewCredit> {
  Ok(CrewCredit {
    id:                  row.get(0)?,
    movie_id:            row.get(1)?,
    person_id:           row.get(2)?,
    role_id:             row.get(3)?,
    alternative_name_id: row.get(4)?,
    billing_order:       row.get(5)?,
    notes:               row.get(6)?,
  })
}
