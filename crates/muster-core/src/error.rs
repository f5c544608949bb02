//! Error types for `muster-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("event {event_id} references unknown user {user_id}")]
  MissingUser { event_id: i64, user_id: i64 },

  #[error("event {event_id} references unknown exercise {exercise_id}")]
  MissingExercise { event_id: i64, exercise_id: i64 },

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a storage provider failure, keeping its message intact.
  pub fn storage<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
