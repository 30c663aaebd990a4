//! The merge executor: applies a [`MergePlan`] inside one `IMMEDIATE` write
//! transaction and checks its post-conditions before committing.
//!
//! The write lock is taken before either candidate is read, so two merges
//! touching the same person run one after the other and the second sees the
//! first one's result. Any error returned from here leaves the transaction
//! uncommitted; dropping it rolls everything back. Once the plan starts
//! applying, every failure up to and including the commit is `MergeFailed`.

use chrono::Utc;
use filmoteca_core::{
  Error as CoreError,
  merge::{self, MergeOptions, MergeOutcome, MergePlan, MergeRequest},
  normalize::{comparison_key, slugify},
  person::PersonId,
  relation::Relation,
};
use rusqlite::{Connection, TransactionBehavior};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{encode_dt, encode_gender, key_filter},
  read,
};

fn merge_failed(reason: impl std::fmt::Display) -> Error {
  Error::Core(CoreError::MergeFailed(reason.to_string()))
}

/// Run a whole merge on `conn`. Nothing is visible to other connections
/// unless this returns `Ok`.
pub fn merge_in_tx(
  conn: &mut Connection,
  request: MergeRequest,
  options: MergeOptions,
) -> Result<MergeOutcome> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let pair = request.pair();
  let a = read::load_snapshot(&tx, pair.a())?
    .ok_or(CoreError::PersonNotFound(pair.a()))?;
  let b = read::load_snapshot(&tx, pair.b())?
    .ok_or(CoreError::PersonNotFound(pair.b()))?;
  let (survivor, loser) = if request.survivor_id() == pair.a() { (a, b) } else { (b, a) };

  let plan = merge::plan(&survivor, &loser, options);
  debug!(
    survivor = plan.survivor_id,
    loser = plan.loser_id,
    renamed = plan.renamed,
    "applying merge plan"
  );

  apply(&tx, &plan).map_err(merge_failed)?;
  verify(&tx, &plan)?;

  let person = read::load_person(&tx, plan.survivor_id)
    .map_err(merge_failed)?
    .ok_or_else(|| merge_failed(format!("survivor {} vanished", plan.survivor_id)))?;
  tx.commit().map_err(merge_failed)?;

  Ok(MergeOutcome {
    survivor: person,
    loser_id: plan.loser_id,
    report:   plan.report(),
  })
}

// ─── Apply ───────────────────────────────────────────────────────────────────

fn apply(conn: &Connection, plan: &MergePlan) -> rusqlite::Result<()> {
  let survivor = plan.survivor_id;
  let loser = plan.loser_id;

  // Credits must stop pointing at duplicate aliases before those are deleted.
  for remap in &plan.alias_remaps {
    for table in ["movie_cast", "movie_crew"] {
      conn.execute(
        &format!("UPDATE {table} SET alternative_name_id = ?1 WHERE alternative_name_id = ?2"),
        rusqlite::params![remap.to, remap.from],
      )?;
    }
  }

  for fill in &plan.character_fills {
    conn.execute(
      "UPDATE movie_cast SET character_name = ?1 WHERE person_id = ?2 AND movie_id = ?3",
      rusqlite::params![fill.character_name, survivor, fill.movie_id],
    )?;
  }

  for keyed in &plan.keyed {
    let table = keyed.relation.table();
    let column = keyed.relation.person_column();
    for key in &keyed.discard {
      let (filter, mut values) = key_filter(key);
      values.insert(0, loser.into());
      conn.execute(
        &format!("DELETE FROM {table} WHERE {column} = ? AND {filter}"),
        rusqlite::params_from_iter(values),
      )?;
    }
    reassign(conn, keyed.relation, survivor, loser)?;
  }

  for additive in &plan.additive {
    reassign(conn, additive.relation, survivor, loser)?;
  }

  if let Some(name) = &plan.new_alias {
    conn.execute(
      "INSERT INTO person_alternative_names (person_id, full_name, name_key)
       VALUES (?1, ?2, ?3)",
      rusqlite::params![survivor, name, comparison_key(name)],
    )?;
  }

  conn.execute("DELETE FROM persons WHERE id = ?1", rusqlite::params![loser])?;

  // The loser's slug is free from here on.
  let base = slugify(&plan.merged.name.full());
  let slug = if plan.renamed && !base.is_empty() {
    Some(read::unique_slug(conn, &base, Some(survivor))?)
  } else {
    plan.merged.slug.clone()
  };

  update_survivor(conn, plan, slug)
}

/// Point every remaining loser row of `relation` at the survivor.
fn reassign(
  conn: &Connection,
  relation: Relation,
  survivor: PersonId,
  loser: PersonId,
) -> rusqlite::Result<usize> {
  let table = relation.table();
  let column = relation.person_column();
  conn.execute(
    &format!("UPDATE {table} SET {column} = ?1 WHERE {column} = ?2"),
    rusqlite::params![survivor, loser],
  )
}

fn update_survivor(
  conn: &Connection,
  plan: &MergePlan,
  slug: Option<String>,
) -> rusqlite::Result<()> {
  let p = &plan.merged;
  conn.execute(
    "UPDATE persons SET
       slug = ?1, first_name = ?2, last_name = ?3, real_name = ?4,
       birth_year = ?5, birth_month = ?6, birth_day = ?7,
       death_year = ?8, death_month = ?9, death_day = ?10,
       birth_location_id = ?11, death_location_id = ?12, biography = ?13,
       photo_url = ?14, photo_public_id = ?15, gender = ?16, imdb_id = ?17,
       tmdb_id = ?18, tmdb_popularity = ?19,
       has_links = EXISTS(SELECT 1 FROM person_links WHERE person_id = ?20),
       updated_at = ?21
     WHERE id = ?20",
    rusqlite::params![
      slug,
      p.name.first_name,
      p.name.last_name,
      p.real_name,
      p.birth_date.year,
      p.birth_date.month,
      p.birth_date.day,
      p.death_date.year,
      p.death_date.month,
      p.death_date.day,
      p.birth_location_id,
      p.death_location_id,
      p.biography,
      p.photo.url,
      p.photo.public_id,
      p.gender.map(encode_gender),
      p.imdb_id,
      p.tmdb.id,
      p.tmdb.popularity,
      plan.survivor_id,
      encode_dt(Utc::now()),
    ],
  )?;
  Ok(())
}

// ─── Verify ──────────────────────────────────────────────────────────────────

/// Every relation holds exactly the rows the plan predicts for the survivor,
/// and nothing references the loser any more.
fn verify(conn: &Connection, plan: &MergePlan) -> Result<()> {
  for relation in Relation::all() {
    let expected = plan.expected_rows(relation);
    let actual = read::count_rows(conn, relation, plan.survivor_id).map_err(merge_failed)?;
    if actual != expected {
      return Err(merge_failed(format!(
        "{}: expected {expected} rows for survivor {}, found {actual}",
        relation.name(),
        plan.survivor_id,
      )));
    }

    let left = read::count_rows(conn, relation, plan.loser_id).map_err(merge_failed)?;
    if left != 0 {
      return Err(merge_failed(format!(
        "{}: {left} rows still reference loser {}",
        relation.name(),
        plan.loser_id,
      )));
    }
  }
  Ok(())
}
