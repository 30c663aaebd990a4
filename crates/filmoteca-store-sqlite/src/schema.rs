//! SQL schema for the Filmoteca SQLite store.
//!
//! Executed once at connection startup. Every per-person uniqueness rule the
//! merge relies on is declared here as well, so a defect in the merge plan
//! surfaces as a constraint violation and a rollback rather than as
//! duplicated credits.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Self-referential hierarchy: city -> province -> country.
CREATE TABLE IF NOT EXISTS locations (
    id         INTEGER PRIMARY KEY,
    name       TEXT NOT NULL,
    parent_id  INTEGER REFERENCES locations(id)
);

CREATE TABLE IF NOT EXISTS persons (
    id                 INTEGER PRIMARY KEY,
    slug               TEXT UNIQUE,
    first_name         TEXT,
    last_name          TEXT,
    real_name          TEXT,
    birth_year         INTEGER,
    birth_month        INTEGER,
    birth_day          INTEGER,
    death_year         INTEGER,
    death_month        INTEGER,
    death_day          INTEGER,
    birth_location_id  INTEGER REFERENCES locations(id),
    death_location_id  INTEGER REFERENCES locations(id),
    biography          TEXT,
    photo_url          TEXT,
    photo_public_id    TEXT,
    gender             TEXT,             -- 'male' | 'female' | 'other'
    imdb_id            TEXT,
    tmdb_id            INTEGER,
    tmdb_popularity    REAL,
    has_links          INTEGER NOT NULL DEFAULT 0,
    updated_at         TEXT NOT NULL     -- RFC 3339 UTC
);

-- name_key is the case/diacritic-folded full_name, computed on insert.
CREATE TABLE IF NOT EXISTS person_alternative_names (
    id         INTEGER PRIMARY KEY,
    person_id  INTEGER NOT NULL REFERENCES persons(id),
    full_name  TEXT NOT NULL,
    name_key   TEXT NOT NULL,
    UNIQUE (person_id, name_key)
);

CREATE TABLE IF NOT EXISTS person_links (
    id             INTEGER PRIMARY KEY,
    person_id      INTEGER NOT NULL REFERENCES persons(id),
    url            TEXT NOT NULL,
    link_type      TEXT,
    title          TEXT,
    is_verified    INTEGER NOT NULL DEFAULT 0,
    display_order  INTEGER NOT NULL DEFAULT 0,
    UNIQUE (person_id, url)
);

CREATE TABLE IF NOT EXISTS person_nationalities (
    person_id    INTEGER NOT NULL REFERENCES persons(id),
    location_id  INTEGER NOT NULL REFERENCES locations(id),
    is_primary   INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (person_id, location_id)
);

CREATE TABLE IF NOT EXISTS movie_cast (
    id                   INTEGER PRIMARY KEY,
    movie_id             INTEGER NOT NULL,
    person_id            INTEGER NOT NULL REFERENCES persons(id),
    alternative_name_id  INTEGER REFERENCES person_alternative_names(id),
    character_name       TEXT,
    billing_order        INTEGER,
    is_principal         INTEGER NOT NULL DEFAULT 0,
    notes                TEXT,
    UNIQUE (movie_id, person_id)
);

CREATE TABLE IF NOT EXISTS movie_crew (
    id                   INTEGER PRIMARY KEY,
    movie_id             INTEGER NOT NULL,
    person_id            INTEGER NOT NULL REFERENCES persons(id),
    role_id              INTEGER NOT NULL,
    alternative_name_id  INTEGER REFERENCES person_alternative_names(id),
    billing_order        INTEGER,
    notes                TEXT,
    UNIQUE (movie_id, person_id, role_id)
);

-- Additive relations: owned by a person, no per-person uniqueness.
CREATE TABLE IF NOT EXISTS image_people (
    id         INTEGER PRIMARY KEY,
    image_id   INTEGER NOT NULL,
    person_id  INTEGER NOT NULL REFERENCES persons(id)
);

CREATE TABLE IF NOT EXISTS movie_awards (
    id                   INTEGER PRIMARY KEY,
    award_id             INTEGER NOT NULL,
    recipient_person_id  INTEGER REFERENCES persons(id)
);

CREATE TABLE IF NOT EXISTS festival_jury (
    id          INTEGER PRIMARY KEY,
    section_id  INTEGER NOT NULL,
    person_id   INTEGER NOT NULL REFERENCES persons(id)
);

CREATE TABLE IF NOT EXISTS festival_award_winners (
    id         INTEGER PRIMARY KEY,
    award_id   INTEGER NOT NULL,
    person_id  INTEGER NOT NULL REFERENCES persons(id)
);

CREATE TABLE IF NOT EXISTS page_views (
    id         INTEGER PRIMARY KEY,
    page_id    INTEGER NOT NULL,
    person_id  INTEGER NOT NULL REFERENCES persons(id)
);

CREATE INDEX IF NOT EXISTS cast_person_idx        ON movie_cast(person_id);
CREATE INDEX IF NOT EXISTS crew_person_idx        ON movie_crew(person_id);
CREATE INDEX IF NOT EXISTS cast_alias_idx         ON movie_cast(alternative_name_id);
CREATE INDEX IF NOT EXISTS crew_alias_idx         ON movie_crew(alternative_name_id);
CREATE INDEX IF NOT EXISTS image_people_idx       ON image_people(person_id);
CREATE INDEX IF NOT EXISTS movie_awards_idx       ON movie_awards(recipient_person_id);
CREATE INDEX IF NOT EXISTS festival_jury_idx      ON festival_jury(person_id);
CREATE INDEX IF NOT EXISTS festival_winners_idx   ON festival_award_winners(person_id);
CREATE INDEX IF NOT EXISTS page_views_person_idx  ON page_views(person_id);

PRAGMA user_version = 1;
";
