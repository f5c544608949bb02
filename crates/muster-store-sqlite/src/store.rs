//! [`SqliteStore`] — the SQLite implementation of [`StorageProvider`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use muster_core::{
  record::{Event, Exercise, User},
  store::StorageProvider,
};

use crate::{
  Error, Result,
  encode::{RawEvent, RawExercise, RawUser, encode_date, encode_location},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Muster store backed by a single SQLite file.
pub struct SqliteStore {
  conn:                   rusqlite::Connection,
  allow_future_exercises: bool,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::init(rusqlite::Connection::open(path)?)
  }

  /// Open an in-memory store — useful for testing.
  pub fn open_in_memory() -> Result<Self> {
    Self::init(rusqlite::Connection::open_in_memory()?)
  }

  fn init(conn: rusqlite::Connection) -> Result<Self> {
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn, allow_future_exercises: false })
  }

  /// Accept exercises dated after today in [`StorageProvider::bulk_insert`].
  pub fn allow_future_exercises(mut self, allow: bool) -> Self {
    self.allow_future_exercises = allow;
    self
  }

  /// Register a participant.
  pub fn add_user(&self, user: &User) -> Result<()> {
    self.conn.execute(
      "INSERT INTO users (id, call, name, active, date_joined)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![
        user.id,
        user.call,
        user.name,
        user.active,
        encode_date(user.date_joined),
      ],
    )?;
    Ok(())
  }

  fn check_insertable(&self, exercise: &Exercise, events: &[Event]) -> Result<()> {
    let today = Utc::now().date_naive();
    if !self.allow_future_exercises && exercise.date > today {
      return Err(Error::FutureExercise { id: exercise.id, date: exercise.date });
    }
    if let Some(stray) = events.iter().find(|e| e.exercise_id != exercise.id) {
      return Err(Error::ExerciseMismatch {
        event_id: stray.id,
        expected: exercise.id,
        found:    stray.exercise_id,
      });
    }
    Ok(())
  }
}

// ─── StorageProvider impl ────────────────────────────────────────────────────

impl StorageProvider for SqliteStore {
  type Error = Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  fn fetch_all_users(&self) -> Result<Vec<User>> {
    let mut stmt = self
      .conn
      .prepare("SELECT id, call, name, active, date_joined FROM users ORDER BY id")?;
    let raws = stmt
      .query_map([], |row| {
        Ok(RawUser {
          id:          row.get(0)?,
          call:        row.get(1)?,
          name:        row.get(2)?,
          active:      row.get(3)?,
          date_joined: row.get(4)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  fn fetch_all_exercises(&self) -> Result<Vec<Exercise>> {
    let mut stmt = self
      .conn
      .prepare("SELECT id, date, type, name, description FROM exercises ORDER BY id")?;
    let raws = stmt
      .query_map([], |row| {
        Ok(RawExercise {
          id:          row.get(0)?,
          date:        row.get(1)?,
          kind:        row.get(2)?,
          name:        row.get(3)?,
          description: row.get(4)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    raws.into_iter().map(RawExercise::into_exercise).collect()
  }

  fn fetch_all_events(&self) -> Result<Vec<Event>> {
    // LEFT JOIN so a dangling user id reaches the caller instead of
    // silently dropping the row.
    let mut stmt = self.conn.prepare(
      "SELECT
         e.id, e.user_id, e.exercise_id, COALESCE(u.call, ''),
         e.location, e.feedback_count, e.feedback, e.context
       FROM events e
       LEFT JOIN users u ON u.id = e.user_id
       ORDER BY e.id",
    )?;
    let raws = stmt
      .query_map([], |row| {
        Ok(RawEvent {
          id:             row.get(0)?,
          user_id:        row.get(1)?,
          exercise_id:    row.get(2)?,
          call:           row.get(3)?,
          location:       row.get(4)?,
          feedback_count: row.get(5)?,
          feedback:       row.get(6)?,
          context:        row.get(7)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  fn bulk_insert(&self, exercise: &Exercise, events: &[Event]) -> Result<()> {
    self.check_insertable(exercise, events)?;

    let tx = self.conn.unchecked_transaction()?;
    tx.execute(
      "INSERT INTO exercises (id, date, type, name, description)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![
        exercise.id,
        encode_date(exercise.date),
        exercise.kind,
        exercise.name,
        exercise.description,
      ],
    )?;
    {
      let mut stmt = tx.prepare(
        "INSERT INTO events (
           id, user_id, exercise_id, location, feedback_count, feedback, context
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      )?;
      for event in events {
        stmt.execute(rusqlite::params![
          event.id,
          event.user_id,
          event.exercise_id,
          encode_location(event.location.as_ref())?,
          event.feedback_count,
          event.feedback,
          event.context,
        ])?;
      }
    }
    tx.commit()?;

    tracing::debug!(
      exercise = exercise.id,
      events = events.len(),
      "inserted exercise"
    );
    Ok(())
  }

  fn persist_date_joined(&self, user_id: i64, date: NaiveDate) -> Result<()> {
    let updated = self.conn.execute(
      "UPDATE users SET date_joined = ?2 WHERE id = ?1",
      rusqlite::params![user_id, encode_date(date)],
    )?;
    if updated == 0 {
      return Err(Error::UserNotFound(user_id));
    }
    Ok(())
  }

  // ── Health ────────────────────────────────────────────────────────────────

  fn health_check(&self) -> Result<()> {
    let status: String =
      self.conn.query_row("PRAGMA quick_check", [], |row| row.get(0))?;
    if status != "ok" {
      return Err(Error::Unhealthy(status));
    }
    Ok(())
  }
}
