//! Error type for `muster-store-sqlite`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  #[error("exercise {id} is dated in the future ({date})")]
  FutureExercise { id: i64, date: NaiveDate },

  #[error("event {event_id} belongs to exercise {found}, not {expected}")]
  ExerciseMismatch { event_id: i64, expected: i64, found: i64 },

  #[error("user not found: {0}")]
  UserNotFound(i64),

  #[error("integrity check failed: {0}")]
  Unhealthy(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
