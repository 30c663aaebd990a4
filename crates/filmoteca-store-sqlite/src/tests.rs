//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeSet;

use filmoteca_core::{
  Error as CoreError,
  merge::{CandidatePair, MergeOptions, MergeOutcome, MergeRequest},
  person::{NewPerson, PartialDate, PersonId},
  relation::Relation,
  snapshot::PersonSnapshot,
  store::{DomainError as _, PersonStore, preview_merge},
  survivor::SuggestedSurvivor,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn person(s: &SqliteStore, first: &str, last: &str) -> PersonId {
  s.insert_person(NewPerson::named(first, last)).await.unwrap().id
}

async fn merge(
  s: &SqliteStore,
  a: PersonId,
  b: PersonId,
  survivor: PersonId,
) -> crate::Result<MergeOutcome> {
  s.merge(MergeRequest::new(a, b, survivor).unwrap(), MergeOptions::default())
    .await
}

async fn snapshot(s: &SqliteStore, id: PersonId) -> PersonSnapshot {
  s.snapshot(id).await.unwrap().expect("person exists")
}

fn cast_movies(snap: &PersonSnapshot) -> BTreeSet<i64> {
  snap.cast.iter().map(|c| c.movie_id).collect()
}

fn is_not_found(e: &Error, id: PersonId) -> bool {
  matches!(e.domain(), Some(CoreError::PersonNotFound(x)) if *x == id)
}

fn is_merge_failed(e: &Error) -> bool {
  matches!(e.domain(), Some(CoreError::MergeFailed(_)))
}

/// A acted in movies 10 and 20 with no nationality. B acted in 20 and 30 and
/// has a nationality.
async fn scenario(s: &SqliteStore) -> (PersonId, PersonId) {
  let country = s.insert_location("Argentina", None).await.unwrap();
  let a = person(s, "Luis", "Sandrini").await;
  let b = person(s, "Luis", "Sandrini").await;
  for movie in [10, 20] {
    s.add_cast(a, movie, None, None).await.unwrap();
  }
  for movie in [20, 30] {
    s.add_cast(b, movie, None, None).await.unwrap();
  }
  s.add_nationality(b, country, true).await.unwrap();
  (a, b)
}

// ─── Seeding ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_person() {
  let s = store().await;
  let inserted = s.insert_person(NewPerson::named("Tita", "Merello")).await.unwrap();
  assert_eq!(inserted.slug.as_deref(), Some("tita-merello"));
  assert!(!inserted.has_links);

  let fetched = s.get_person(inserted.id).await.unwrap().unwrap();
  assert_eq!(fetched.name.full(), "Tita Merello");
}

#[tokio::test]
async fn get_person_missing_returns_none() {
  let s = store().await;
  assert!(s.get_person(42).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_names_get_distinct_slugs() {
  let s = store().await;
  let first = s.insert_person(NewPerson::named("Juan", "Pérez")).await.unwrap();
  let second = s.insert_person(NewPerson::named("juan", "perez")).await.unwrap();
  assert_eq!(first.slug.as_deref(), Some("juan-perez"));
  assert_eq!(second.slug.as_deref(), Some("juan-perez-1"));
}

#[tokio::test]
async fn attach_rejects_keyed_relation() {
  let s = store().await;
  let p = person(&s, "A", "B").await;
  let err = s.attach(Relation::Cast, p, 1).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::InvalidRequest(_))));
}

// ─── Locations ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn location_path_walks_to_root() {
  let s = store().await;
  let country = s.insert_location("Argentina", None).await.unwrap();
  let province = s.insert_location("Santa Fe", Some(country)).await.unwrap();
  let city = s.insert_location("Rosario", Some(province)).await.unwrap();

  let path = s.location_path(city).await.unwrap();
  assert_eq!(path, vec!["Rosario", "Santa Fe", "Argentina"]);
  assert_eq!(s.location_path(country).await.unwrap(), vec!["Argentina"]);
  assert!(s.location_path(999).await.unwrap().is_empty());
}

#[tokio::test]
async fn snapshot_carries_birth_location_path() {
  let s = store().await;
  let country = s.insert_location("Argentina", None).await.unwrap();
  let city = s.insert_location("Buenos Aires", Some(country)).await.unwrap();
  let mut input = NewPerson::named("Niní", "Marshall");
  input.birth_location_id = Some(city);
  let p = s.insert_person(input).await.unwrap();

  let snap = snapshot(&s, p.id).await;
  assert_eq!(snap.birth_location_path, vec!["Buenos Aires", "Argentina"]);
  assert!(snap.death_location_path.is_empty());
}

// ─── Preview ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn preview_counts_shared_and_unique_rows() {
  let s = store().await;
  let (a, b) = scenario(&s).await;

  let preview = preview_merge(&s, CandidatePair::new(a, b).unwrap()).await.unwrap();
  assert_eq!(preview.shared_counts[&Relation::Cast], 1);
  assert_eq!(preview.unique_counts.a[&Relation::Cast], 1);
  assert_eq!(preview.unique_counts.b[&Relation::Cast], 1);
  assert_eq!(preview.unique_counts.b[&Relation::Nationalities], 1);
  assert_eq!(preview.suggested_survivor, SuggestedSurvivor::Tie);
  assert_eq!(preview.person_b.nationalities[0].location_name, "Argentina");
}

#[tokio::test]
async fn preview_missing_person_is_not_found() {
  let s = store().await;
  let a = person(&s, "A", "B").await;
  let err = preview_merge(&s, CandidatePair::new(a, 77).unwrap())
    .await
    .unwrap_err();
  assert!(is_not_found(&err, 77));
}

#[tokio::test]
async fn preview_suggests_person_with_more_credits() {
  let s = store().await;
  let a = person(&s, "Hugo", "del Carril").await;
  let b = person(&s, "Hugo", "Del Carril").await;
  s.add_cast(a, 1, None, None).await.unwrap();
  s.add_crew(a, 2, 7, None).await.unwrap();
  s.add_cast(b, 3, None, None).await.unwrap();

  let preview = preview_merge(&s, CandidatePair::new(a, b).unwrap()).await.unwrap();
  assert_eq!(preview.suggested_survivor, SuggestedSurvivor::A);
  assert_eq!(preview.person_a.credited_work_count, 2);
}

// ─── Merge ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn merge_consolidates_cast_and_nationality() {
  let s = store().await;
  let (a, b) = scenario(&s).await;

  let outcome = merge(&s, a, b, b).await.unwrap();
  assert_eq!(outcome.loser_id, a);
  assert_eq!(outcome.report.relations[&Relation::Cast].transferred, 1);
  assert_eq!(outcome.report.relations[&Relation::Cast].discarded, 1);

  let survivor = snapshot(&s, b).await;
  assert_eq!(cast_movies(&survivor), BTreeSet::from([10, 20, 30]));
  assert_eq!(survivor.nationalities.len(), 1);
  assert!(s.get_person(a).await.unwrap().is_none());
}

#[tokio::test]
async fn merge_result_is_symmetric_in_survivor_choice() {
  let forward = store().await;
  let (a, b) = scenario(&forward).await;
  merge(&forward, a, b, b).await.unwrap();

  let backward = store().await;
  let (a2, b2) = scenario(&backward).await;
  merge(&backward, a2, b2, a2).await.unwrap();

  let f = snapshot(&forward, b).await;
  let r = snapshot(&backward, a2).await;
  assert_eq!(cast_movies(&f), cast_movies(&r));
  assert_eq!(f.nationalities.len(), r.nationalities.len());
}

#[tokio::test]
async fn merge_leaves_no_loser_references() {
  let s = store().await;
  let (a, b) = scenario(&s).await;
  s.add_alternative_name(a, "Luisito").await.unwrap();
  s.add_link(a, "https://example.org/sandrini", None).await.unwrap();
  s.add_crew(a, 10, 3, None).await.unwrap();
  s.attach(Relation::ImageAppearances, a, 500).await.unwrap();
  s.attach(Relation::Awards, a, 600).await.unwrap();
  s.attach(Relation::FestivalJury, a, 700).await.unwrap();
  s.attach(Relation::FestivalAwardWinners, a, 800).await.unwrap();
  s.attach(Relation::PageViews, a, 900).await.unwrap();

  merge(&s, a, b, b).await.unwrap();

  for relation in Relation::all() {
    assert_eq!(s.count_rows(relation, a).await.unwrap(), 0, "{}", relation.name());
  }
  for relation in Relation::additive() {
    assert_eq!(s.count_rows(relation, b).await.unwrap(), 1, "{}", relation.name());
  }
}

#[tokio::test]
async fn additive_relations_are_summed() {
  let s = store().await;
  let a = person(&s, "A", "B").await;
  let b = person(&s, "A", "B").await;
  // Same image on both: additive rows are never deduplicated.
  s.attach(Relation::ImageAppearances, a, 1).await.unwrap();
  s.attach(Relation::ImageAppearances, b, 1).await.unwrap();
  s.attach(Relation::PageViews, b, 2).await.unwrap();

  let outcome = merge(&s, a, b, a).await.unwrap();
  assert_eq!(s.count_rows(Relation::ImageAppearances, a).await.unwrap(), 2);
  assert_eq!(s.count_rows(Relation::PageViews, a).await.unwrap(), 1);
  assert_eq!(outcome.report.relations[&Relation::PageViews].transferred, 1);
}

#[tokio::test]
async fn birth_year_is_inherited_either_way() {
  let s = store().await;
  let mut dated = NewPerson::named("Tita", "Merello");
  dated.birth_date = PartialDate::new(1950, None, None);
  let a = s.insert_person(dated.clone()).await.unwrap().id;
  let b = person(&s, "Tita", "Merello").await;

  let outcome = merge(&s, a, b, b).await.unwrap();
  assert_eq!(outcome.survivor.birth_date.year, Some(1950));

  let c = s.insert_person(dated).await.unwrap().id;
  let d = person(&s, "Tita", "Merello").await;
  let outcome = merge(&s, c, d, c).await.unwrap();
  assert_eq!(outcome.survivor.birth_date.year, Some(1950));
}

#[tokio::test]
async fn survivor_scalar_is_never_overwritten() {
  let s = store().await;
  let mut older = NewPerson::named("Pepe", "Arias");
  older.biography = Some("Actor cómico.".into());
  older.imdb_id = Some("nm0000001".into());
  let a = s.insert_person(older).await.unwrap().id;
  let mut newer = NewPerson::named("Pepe", "Arias");
  newer.biography = Some("Otra biografía.".into());
  newer.real_name = Some("José Arias".into());
  let b = s.insert_person(newer).await.unwrap().id;

  let merged = merge(&s, a, b, a).await.unwrap().survivor;
  assert_eq!(merged.biography.as_deref(), Some("Actor cómico."));
  assert_eq!(merged.imdb_id.as_deref(), Some("nm0000001"));
  assert_eq!(merged.real_name.as_deref(), Some("José Arias"));
}

#[tokio::test]
async fn accent_variant_aliases_collapse() {
  let s = store().await;
  let a = person(&s, "Juan", "Pérez").await;
  let b = person(&s, "Juan", "Perez").await;
  s.add_alternative_name(a, "Juan Pérez").await.unwrap();
  s.add_alternative_name(b, "juan perez").await.unwrap();

  let outcome = merge(&s, a, b, b).await.unwrap();
  assert_eq!(s.count_rows(Relation::AlternativeNames, b).await.unwrap(), 1);
  assert_eq!(outcome.report.relations[&Relation::AlternativeNames].discarded, 1);
}

#[tokio::test]
async fn credits_follow_remapped_alias() {
  let s = store().await;
  let a = person(&s, "Juan", "Pérez").await;
  let b = person(&s, "Juan", "Pérez").await;
  let loser_alias = s.add_alternative_name(a, "Juancho").await.unwrap();
  let survivor_alias = s.add_alternative_name(b, "JUANCHO").await.unwrap();
  s.add_cast(a, 10, None, Some(loser_alias)).await.unwrap();
  s.add_crew(a, 11, 2, Some(loser_alias)).await.unwrap();

  merge(&s, a, b, b).await.unwrap();

  let snap = snapshot(&s, b).await;
  assert_eq!(snap.alternative_names.len(), 1);
  assert_eq!(snap.cast[0].alternative_name_id, Some(survivor_alias));
  assert_eq!(snap.crew[0].alternative_name_id, Some(survivor_alias));
}

#[tokio::test]
async fn shared_credit_takes_missing_character_name() {
  let s = store().await;
  let a = person(&s, "A", "B").await;
  let b = person(&s, "A", "B").await;
  s.add_cast(a, 10, Some("Felipe".into()), None).await.unwrap();
  s.add_cast(b, 10, None, None).await.unwrap();
  s.add_cast(a, 20, Some("Loser's".into()), None).await.unwrap();
  s.add_cast(b, 20, Some("Survivor's".into()), None).await.unwrap();

  let outcome = merge(&s, a, b, b).await.unwrap();
  assert_eq!(outcome.report.character_names_filled, 1);

  let snap = snapshot(&s, b).await;
  let names: Vec<_> = snap.cast.iter().map(|c| c.character_name.as_deref()).collect();
  assert_eq!(names, vec![Some("Felipe"), Some("Survivor's")]);
}

#[tokio::test]
async fn links_transfer_and_set_has_links() {
  let s = store().await;
  let a = person(&s, "A", "B").await;
  let b = person(&s, "A", "B").await;
  s.add_link(a, "https://example.org/a", Some("wikipedia".into())).await.unwrap();
  s.add_link(a, "https://example.org/shared", None).await.unwrap();
  s.add_link(b, "https://example.org/shared", None).await.unwrap();

  let survivor = merge(&s, a, b, b).await.unwrap().survivor;
  assert!(survivor.has_links);
  assert_eq!(s.count_rows(Relation::Links, b).await.unwrap(), 2);
}

#[tokio::test]
async fn nameless_survivor_gets_name_and_fresh_slug() {
  let s = store().await;
  let _holder = person(&s, "Pepe", "Arias").await;
  let loser = person(&s, "Pepe", "Arias").await;
  let survivor = s.insert_person(NewPerson::default()).await.unwrap();
  assert!(survivor.slug.is_none());
  assert_eq!(
    s.get_person(loser).await.unwrap().unwrap().slug.as_deref(),
    Some("pepe-arias-1")
  );

  let merged = merge(&s, survivor.id, loser, survivor.id).await.unwrap().survivor;
  assert_eq!(merged.name.full(), "Pepe Arias");
  assert_eq!(merged.slug.as_deref(), Some("pepe-arias-1"));
}

#[tokio::test]
async fn loser_name_recorded_as_alias_when_requested() {
  let s = store().await;
  let a = person(&s, "Catita", "Marshall").await;
  let b = person(&s, "Niní", "Marshall").await;

  let options = MergeOptions { record_loser_name_as_alias: true };
  let outcome = s
    .merge(MergeRequest::new(a, b, b).unwrap(), options)
    .await
    .unwrap();
  assert_eq!(outcome.report.alias_added.as_deref(), Some("Catita Marshall"));

  let snap = snapshot(&s, b).await;
  assert_eq!(snap.alternative_names[0].full_name, "Catita Marshall");
}

#[tokio::test]
async fn merge_missing_person_changes_nothing() {
  let s = store().await;
  let (a, _) = scenario(&s).await;

  let err = merge(&s, a, 99, a).await.unwrap_err();
  assert!(is_not_found(&err, 99));
  assert_eq!(cast_movies(&snapshot(&s, a).await), BTreeSet::from([10, 20]));
}

#[tokio::test]
async fn second_merge_of_same_loser_is_not_found() {
  let s = store().await;
  let (a, b) = scenario(&s).await;
  merge(&s, a, b, b).await.unwrap();

  let err = merge(&s, a, b, b).await.unwrap_err();
  assert!(is_not_found(&err, a));
}

#[tokio::test]
async fn failed_merge_rolls_back() {
  let s = store().await;
  let (a, b) = scenario(&s).await;
  s.attach(Relation::PageViews, a, 1).await.unwrap();
  s.execute_batch(
    "CREATE TRIGGER page_views_frozen BEFORE UPDATE ON page_views
     BEGIN SELECT RAISE(ABORT, 'page views are frozen'); END;",
  )
  .await
  .unwrap();

  let err = merge(&s, a, b, b).await.unwrap_err();
  assert!(is_merge_failed(&err), "{err}");

  // Both persons and all their rows are exactly as before.
  assert_eq!(cast_movies(&snapshot(&s, a).await), BTreeSet::from([10, 20]));
  assert_eq!(cast_movies(&snapshot(&s, b).await), BTreeSet::from([20, 30]));
  assert_eq!(s.count_rows(Relation::PageViews, a).await.unwrap(), 1);
  assert_eq!(s.count_rows(Relation::Nationalities, b).await.unwrap(), 1);
}

#[tokio::test]
async fn failure_at_commit_rolls_back() {
  let s = store().await;
  let (a, b) = scenario(&s).await;
  // Deferred: the dangling reference to the deleted loser only surfaces at
  // COMMIT.
  s.execute_batch(
    "CREATE TABLE merge_log (
       person_id INTEGER REFERENCES persons(id) DEFERRABLE INITIALLY DEFERRED
     );
     CREATE TRIGGER log_person_delete AFTER DELETE ON persons
     BEGIN INSERT INTO merge_log (person_id) VALUES (OLD.id); END;",
  )
  .await
  .unwrap();

  let err = merge(&s, a, b, b).await.unwrap_err();
  assert!(is_merge_failed(&err), "{err}");
  assert!(s.get_person(a).await.unwrap().is_some());
  assert_eq!(cast_movies(&snapshot(&s, b).await), BTreeSet::from([20, 30]));
}

#[tokio::test]
async fn shared_crew_and_nationality_rows_are_discarded() {
  let s = store().await;
  let country = s.insert_location("Argentina", None).await.unwrap();
  let a = person(&s, "Leopoldo", "Torre Nilsson").await;
  let b = person(&s, "Leopoldo", "Torre Nilsson").await;
  s.add_crew(a, 10, 1, None).await.unwrap();
  s.add_crew(a, 10, 2, None).await.unwrap();
  s.add_crew(b, 10, 2, None).await.unwrap();
  s.add_nationality(a, country, true).await.unwrap();
  s.add_nationality(b, country, true).await.unwrap();

  let preview = preview_merge(&s, CandidatePair::new(a, b).unwrap()).await.unwrap();
  assert_eq!(preview.shared_counts[&Relation::Crew], 1);
  assert_eq!(preview.shared_counts[&Relation::Nationalities], 1);
  assert_eq!(preview.unique_counts.a[&Relation::Crew], 1);

  let outcome = merge(&s, a, b, b).await.unwrap();
  let crew = outcome.report.relations[&Relation::Crew];
  assert_eq!((crew.transferred, crew.discarded), (1, 1));
  let nationalities = outcome.report.relations[&Relation::Nationalities];
  assert_eq!((nationalities.transferred, nationalities.discarded), (0, 1));

  assert_eq!(s.count_rows(Relation::Crew, b).await.unwrap(), 2);
  assert_eq!(s.count_rows(Relation::Nationalities, b).await.unwrap(), 1);
  assert_eq!(s.count_rows(Relation::Crew, a).await.unwrap(), 0);
  assert_eq!(s.count_rows(Relation::Nationalities, a).await.unwrap(), 0);
}

#[tokio::test]
async fn racing_merges_of_one_loser_apply_once() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("catalog.db");
  let first = SqliteStore::open(&path).await.unwrap();
  let second = SqliteStore::open(&path).await.unwrap();

  let a = person(&first, "Libertad", "Lamarque").await;
  let b = person(&first, "Libertad", "Lamarque").await;
  let c = person(&first, "Libertad", "Lamarque").await;
  for movie in 0..200 {
    first.add_cast(a, movie, None, None).await.unwrap();
  }

  let (into_b, into_c) = tokio::join!(merge(&first, a, b, b), merge(&second, a, c, c));
  let (winner, other, err) = match (&into_b, &into_c) {
    (Ok(_), Err(e)) => (b, c, e),
    (Err(e), Ok(_)) => (c, b, e),
    _ => panic!("exactly one merge must succeed: {into_b:?} / {into_c:?}"),
  };
  assert!(is_not_found(err, a), "{err}");

  assert_eq!(first.count_rows(Relation::Cast, winner).await.unwrap(), 200);
  assert_eq!(first.count_rows(Relation::Cast, other).await.unwrap(), 0);
  assert!(first.get_person(a).await.unwrap().is_none());
  assert!(first.get_person(other).await.unwrap().is_some());
}
