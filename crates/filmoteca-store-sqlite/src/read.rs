//! Synchronous readers shared by the async store methods and the merge
//! executor. Everything here runs on a borrowed connection, so callers decide
//! the transaction it belongs to.

use std::collections::BTreeMap;

use filmoteca_core::{
  person::{LocationId, Person, PersonId},
  relation::Relation,
  snapshot::PersonSnapshot,
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Result,
  encode::{
    ALTERNATIVE_NAME_COLUMNS, CAST_COLUMNS, CREW_COLUMNS, LINK_COLUMNS,
    PERSON_COLUMNS, RawPerson, alternative_name_from_row, cast_from_row,
    crew_from_row, link_from_row, nationality_from_row,
  },
};

/// Guards against cycles in a corrupted location hierarchy.
const MAX_LOCATION_DEPTH: i64 = 32;

pub fn load_person(conn: &Connection, id: PersonId) -> Result<Option<Person>> {
  let raw = conn
    .query_row(
      &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = ?1"),
      rusqlite::params![id],
      RawPerson::from_row,
    )
    .optional()?;
  raw.map(RawPerson::into_person).transpose()
}

/// Names from `id` up to the root of the hierarchy, `id` itself first.
/// Unknown ids yield an empty path.
pub fn location_path(conn: &Connection, id: LocationId) -> Result<Vec<String>> {
  let mut stmt = conn.prepare(
    "WITH RECURSIVE chain(id, name, parent_id, depth) AS (
       SELECT id, name, parent_id, 0 FROM locations WHERE id = ?1
       UNION ALL
       SELECT l.id, l.name, l.parent_id, c.depth + 1
       FROM locations l JOIN chain c ON l.id = c.parent_id
       WHERE c.depth < ?2
     )
     SELECT name FROM chain ORDER BY depth",
  )?;
  let names = stmt
    .query_map(rusqlite::params![id, MAX_LOCATION_DEPTH], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(names)
}

fn optional_path(conn: &Connection, id: Option<LocationId>) -> Result<Vec<String>> {
  id.map_or_else(|| Ok(Vec::new()), |id| location_path(conn, id))
}

/// `base`, or `base-1`, `base-2`, ... whichever no person other than `owner`
/// holds.
pub fn unique_slug(
  conn: &Connection,
  base: &str,
  owner: Option<PersonId>,
) -> rusqlite::Result<String> {
  let taken = |slug: &str| -> rusqlite::Result<bool> {
    conn.query_row(
      "SELECT EXISTS(SELECT 1 FROM persons WHERE slug = ?1 AND id IS NOT ?2)",
      rusqlite::params![slug, owner],
      |r| r.get(0),
    )
  };

  let mut candidate = base.to_owned();
  let mut suffix = 0u32;
  while taken(&candidate)? {
    suffix += 1;
    candidate = format!("{base}-{suffix}");
  }
  Ok(candidate)
}

/// Rows owned by `person_id` in `relation`.
pub fn count_rows(conn: &Connection, relation: Relation, person_id: PersonId) -> Result<u64> {
  let sql = format!(
    "SELECT COUNT(*) FROM {} WHERE {} = ?1",
    relation.table(),
    relation.person_column(),
  );
  let n: i64 = conn.query_row(&sql, rusqlite::params![person_id], |r| r.get(0))?;
  Ok(n as u64)
}

/// Read a person and every relation the merge engine considers. Returns
/// `None` if the person does not exist.
pub fn load_snapshot(conn: &Connection, id: PersonId) -> Result<Option<PersonSnapshot>> {
  let Some(person) = load_person(conn, id)? else {
    return Ok(None);
  };

  let birth_location_path = optional_path(conn, person.birth_location_id)?;
  let death_location_path = optional_path(conn, person.death_location_id)?;

  let alternative_names = conn
    .prepare(&format!(
      "SELECT {ALTERNATIVE_NAME_COLUMNS} FROM person_alternative_names
       WHERE person_id = ?1 ORDER BY id"
    ))?
    .query_map(rusqlite::params![id], alternative_name_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let links = conn
    .prepare(&format!(
      "SELECT {LINK_COLUMNS} FROM person_links
       WHERE person_id = ?1 ORDER BY display_order, id"
    ))?
    .query_map(rusqlite::params![id], link_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let nationalities = conn
    .prepare(
      "SELECT n.person_id, n.location_id, l.name, n.is_primary
       FROM person_nationalities n
       JOIN locations l ON l.id = n.location_id
       WHERE n.person_id = ?1
       ORDER BY n.is_primary DESC, l.name",
    )?
    .query_map(rusqlite::params![id], nationality_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let cast = conn
    .prepare(&format!(
      "SELECT {CAST_COLUMNS} FROM movie_cast WHERE person_id = ?1 ORDER BY movie_id"
    ))?
    .query_map(rusqlite::params![id], cast_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let crew = conn
    .prepare(&format!(
      "SELECT {CREW_COLUMNS} FROM movie_crew WHERE person_id = ?1
       ORDER BY movie_id, role_id"
    ))?
    .query_map(rusqlite::params![id], crew_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut additive_counts = BTreeMap::new();
  for relation in Relation::additive() {
    additive_counts.insert(relation, count_rows(conn, relation, id)?);
  }

  Ok(Some(PersonSnapshot {
    person,
    birth_location_path,
    death_location_path,
    alternative_names,
    links,
    nationalities,
    cast,
    crew,
    additive_counts,
  }))
}
