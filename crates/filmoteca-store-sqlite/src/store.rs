//! [`SqliteStore`]: the SQLite implementation of [`PersonStore`].

use std::{path::Path, time::Duration};

use chrono::Utc;
use tracing::{debug, info, warn};

use filmoteca_core::{
  Error as CoreError,
  merge::{CandidatePair, MergeOptions, MergeOutcome, MergeRequest},
  normalize::{comparison_key, slugify},
  person::{LocationId, MovieId, NewPerson, Person, PersonId, RoleId, RowId},
  relation::{Relation, TransferPolicy},
  snapshot::PersonSnapshot,
  store::{DomainError as _, PersonStore},
};

use crate::{
  Error, Result,
  encode::{encode_dt, encode_gender},
  executor::merge_in_tx,
  read,
  schema::SCHEMA,
};

/// How long a writer waits for another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Filmoteca person store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Catalog writes ────────────────────────────────────────────────────────
  //
  // The rest of the catalog is maintained elsewhere; these exist so the
  // merge engine can be seeded and exercised.

  pub async fn insert_location(
    &self,
    name: impl Into<String>,
    parent_id: Option<LocationId>,
  ) -> Result<LocationId> {
    let name = name.into();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO locations (name, parent_id) VALUES (?1, ?2)",
          rusqlite::params![name, parent_id],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  /// Insert a person. Without an explicit slug one is derived from the name
  /// and made unique.
  pub async fn insert_person(&self, input: NewPerson) -> Result<Person> {
    let updated_at = encode_dt(Utc::now());

    let id = self
      .conn
      .call(move |conn| {
        let slug = match input.slug {
          Some(slug) => Some(slug),
          None => match slugify(&input.name.full()) {
            base if base.is_empty() => None,
            base => Some(read::unique_slug(conn, &base, None)?),
          },
        };
        conn.execute(
          "INSERT INTO persons (
             slug, first_name, last_name, real_name,
             birth_year, birth_month, birth_day,
             death_year, death_month, death_day,
             birth_location_id, death_location_id, biography,
             photo_url, photo_public_id, gender, imdb_id,
             tmdb_id, tmdb_popularity, has_links, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17, ?18, ?19, 0, ?20)",
          rusqlite::params![
            slug,
            input.name.first_name,
            input.name.last_name,
            input.real_name,
            input.birth_date.year,
            input.birth_date.month,
            input.birth_date.day,
            input.death_date.year,
            input.death_date.month,
            input.death_date.day,
            input.birth_location_id,
            input.death_location_id,
            input.biography,
            input.photo.url,
            input.photo.public_id,
            input.gender.map(encode_gender),
            input.imdb_id,
            input.tmdb.id,
            input.tmdb.popularity,
            updated_at,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    self
      .get_person(id)
      .await?
      .ok_or(Error::Core(CoreError::PersonNotFound(id)))
  }

  pub async fn add_alternative_name(
    &self,
    person_id: PersonId,
    full_name: impl Into<String>,
  ) -> Result<RowId> {
    let full_name = full_name.into();
    let name_key = comparison_key(&full_name);
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO person_alternative_names (person_id, full_name, name_key)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![person_id, full_name, name_key],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  /// Add a link and keep the person's `has_links` flag in step.
  pub async fn add_link(
    &self,
    person_id: PersonId,
    url: impl Into<String>,
    link_type: Option<String>,
  ) -> Result<RowId> {
    let url = url.into();
    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO person_links (person_id, url, link_type, display_order)
           VALUES (?1, ?2, ?3,
                   (SELECT COUNT(*) FROM person_links WHERE person_id = ?1))",
          rusqlite::params![person_id, url, link_type],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
          "UPDATE persons SET has_links = 1 WHERE id = ?1",
          rusqlite::params![person_id],
        )?;
        tx.commit()?;
        Ok(id)
      })
      .await?;
    Ok(id)
  }

  pub async fn add_nationality(
    &self,
    person_id: PersonId,
    location_id: LocationId,
    is_primary: bool,
  ) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO person_nationalities (person_id, location_id, is_primary)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![person_id, location_id, is_primary],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn add_cast(
    &self,
    person_id: PersonId,
    movie_id: MovieId,
    character_name: Option<String>,
    alternative_name_id: Option<RowId>,
  ) -> Result<RowId> {
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO movie_cast (movie_id, person_id, alternative_name_id, character_name)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![movie_id, person_id, alternative_name_id, character_name],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  pub async fn add_crew(
    &self,
    person_id: PersonId,
    movie_id: MovieId,
    role_id: RoleId,
    alternative_name_id: Option<RowId>,
  ) -> Result<RowId> {
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO movie_crew (movie_id, person_id, role_id, alternative_name_id)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![movie_id, person_id, role_id, alternative_name_id],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  /// Attach a person to an additive relation: an image, award, jury
  /// section, festival award or page, identified by `reference_id`.
  pub async fn attach(
    &self,
    relation: Relation,
    person_id: PersonId,
    reference_id: i64,
  ) -> Result<RowId> {
    let reference_column = match relation {
      Relation::ImageAppearances => "image_id",
      Relation::Awards | Relation::FestivalAwardWinners => "award_id",
      Relation::FestivalJury => "section_id",
      Relation::PageViews => "page_id",
      keyed => {
        debug_assert_eq!(keyed.policy(), TransferPolicy::KeyDeduplicated);
        return Err(Error::Core(CoreError::InvalidRequest(format!(
          "{} is not an additive relation",
          keyed.name()
        ))));
      }
    };
    let sql = format!(
      "INSERT INTO {} ({reference_column}, {}) VALUES (?1, ?2)",
      relation.table(),
      relation.person_column(),
    );

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params![reference_id, person_id])?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  /// Rows owned by `person_id` in `relation`.
  pub async fn count_rows(&self, relation: Relation, person_id: PersonId) -> Result<u64> {
    self
      .conn
      .call(move |conn| Ok(read::count_rows(conn, relation, person_id)))
      .await?
  }

  #[cfg(test)]
  pub(crate) async fn snapshot(&self, id: PersonId) -> Result<Option<PersonSnapshot>> {
    self
      .conn
      .call(move |conn| Ok(read::load_snapshot(conn, id)))
      .await?
  }

  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── PersonStore impl ────────────────────────────────────────────────────────

impl PersonStore for SqliteStore {
  type Error = Error;

  async fn get_person(&self, id: PersonId) -> Result<Option<Person>> {
    self
      .conn
      .call(move |conn| Ok(read::load_person(conn, id)))
      .await?
  }

  async fn location_path(&self, id: LocationId) -> Result<Vec<String>> {
    self
      .conn
      .call(move |conn| Ok(read::location_path(conn, id)))
      .await?
  }

  async fn load_candidates(
    &self,
    pair: CandidatePair,
  ) -> Result<(PersonSnapshot, PersonSnapshot)> {
    let snapshots = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let load = || -> Result<_> {
          let a = read::load_snapshot(&tx, pair.a())?
            .ok_or(CoreError::PersonNotFound(pair.a()))?;
          let b = read::load_snapshot(&tx, pair.b())?
            .ok_or(CoreError::PersonNotFound(pair.b()))?;
          Ok((a, b))
        };
        Ok(load())
      })
      .await??;

    debug!(a = pair.a(), b = pair.b(), "loaded merge candidates");
    Ok(snapshots)
  }

  async fn merge(
    &self,
    request: MergeRequest,
    options: MergeOptions,
  ) -> Result<MergeOutcome> {
    let result = self
      .conn
      .call(move |conn| Ok(merge_in_tx(conn, request, options)))
      .await
      .map_err(Error::from)
      .and_then(|inner| inner);

    match &result {
      Ok(outcome) => {
        for (relation, stats) in &outcome.report.relations {
          debug!(
            relation = relation.name(),
            transferred = stats.transferred,
            discarded = stats.discarded,
            "relation merged"
          );
        }
        info!(
          survivor = request.survivor_id(),
          loser = request.loser_id(),
          character_names_filled = outcome.report.character_names_filled,
          "merge committed"
        );
      }
      Err(e) if e.domain().is_some_and(|d| matches!(d, CoreError::PersonNotFound(_))) => {
        debug!(error = %e, "merge candidate missing");
      }
      Err(e) => {
        warn!(
          survivor = request.survivor_id(),
          loser = request.loser_id(),
          error = %e,
          "merge rolled back"
        );
      }
    }
    result
  }
}
