//! The `StorageProvider` trait.
//!
//! The trait is implemented by storage backends (e.g. `muster-store-sqlite`).
//! The analytics façade depends on this abstraction, not on any concrete
//! backend. All calls are synchronous.

use chrono::NaiveDate;

use crate::record::{Event, Exercise, User};

/// Abstraction over a Muster storage backend.
pub trait StorageProvider {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn fetch_all_users(&self) -> Result<Vec<User>, Self::Error>;

  fn fetch_all_exercises(&self) -> Result<Vec<Exercise>, Self::Error>;

  /// All events, with [`Event::call`] resolved from the user table.
  fn fetch_all_events(&self) -> Result<Vec<Event>, Self::Error>;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Persist one exercise together with its events, all or nothing.
  ///
  /// Implementations reject exercises dated in the future unless configured
  /// otherwise, and enforce (user, exercise) uniqueness.
  fn bulk_insert(
    &self,
    exercise: &Exercise,
    events: &[Event],
  ) -> Result<(), Self::Error>;

  fn persist_date_joined(
    &self,
    user_id: i64,
    date: NaiveDate,
  ) -> Result<(), Self::Error>;

  // ── Health ────────────────────────────────────────────────────────────

  fn health_check(&self) -> Result<(), Self::Error>;
}
