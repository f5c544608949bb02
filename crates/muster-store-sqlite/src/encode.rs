//! Encoding and decoding helpers between Muster records and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD` strings. Locations are stored as compact
//! JSON, `NULL` when the submission carried none.

use chrono::NaiveDate;
use muster_core::record::{Event, Exercise, Location, User};

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Location ────────────────────────────────────────────────────────────────

pub fn encode_location(l: Option<&Location>) -> Result<Option<String>> {
  Ok(l.map(serde_json::to_string).transpose()?)
}

pub fn decode_location(s: Option<&str>) -> Result<Option<Location>> {
  Ok(s.map(serde_json::from_str::<Location>).transpose()?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:          i64,
  pub call:        String,
  pub name:        String,
  pub active:      bool,
  pub date_joined: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:          self.id,
      call:        self.call,
      name:        self.name,
      active:      self.active,
      date_joined: decode_date(&self.date_joined)?,
    })
  }
}

/// Raw values read directly from an `exercises` row.
pub struct RawExercise {
  pub id:          i64,
  pub date:        String,
  pub kind:        String,
  pub name:        String,
  pub description: String,
}

impl RawExercise {
  pub fn into_exercise(self) -> Result<Exercise> {
    Ok(Exercise {
      id:          self.id,
      date:        decode_date(&self.date)?,
      kind:        self.kind,
      name:        self.name,
      description: self.description,
    })
  }
}

/// Raw values from an `events` row joined with the owning user's call.
pub struct RawEvent {
  pub id:             i64,
  pub user_id:        i64,
  pub exercise_id:    i64,
  pub call:           String,
  pub location:       Option<String>,
  pub feedback_count: u32,
  pub feedback:       String,
  pub context:        String,
}

impl RawEvent {
  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      id:             self.id,
      user_id:        self.user_id,
      exercise_id:    self.exercise_id,
      call:           self.call,
      location:       decode_location(self.location.as_deref())?,
      feedback_count: self.feedback_count,
      feedback:       self.feedback,
      context:        self.context,
    })
  }
}
