//! SQL schema for the Muster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id           INTEGER PRIMARY KEY,
    call         TEXT NOT NULL UNIQUE,
    name         TEXT NOT NULL,
    active       INTEGER NOT NULL DEFAULT 1,
    date_joined  TEXT NOT NULL      -- YYYY-MM-DD
);

-- Exercises are never updated once written.
CREATE TABLE IF NOT EXISTS exercises (
    id           INTEGER PRIMARY KEY,
    date         TEXT NOT NULL,     -- YYYY-MM-DD
    type         TEXT NOT NULL,
    name         TEXT NOT NULL,
    description  TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS events (
    id              INTEGER PRIMARY KEY,
    user_id         INTEGER NOT NULL REFERENCES users(id),
    exercise_id     INTEGER NOT NULL REFERENCES exercises(id),
    location        TEXT,           -- JSON-encoded Location or NULL
    feedback_count  INTEGER NOT NULL DEFAULT 0,
    feedback        TEXT NOT NULL DEFAULT '',
    context         TEXT NOT NULL DEFAULT '',
    UNIQUE (user_id, exercise_id)
);

CREATE INDEX IF NOT EXISTS events_user_idx     ON events(user_id);
CREATE INDEX IF NOT EXISTS events_exercise_idx ON events(exercise_id);
CREATE INDEX IF NOT EXISTS exercises_date_idx  ON exercises(date);

PRAGMA user_version = 1;
";
