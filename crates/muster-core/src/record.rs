//! Domain records — the raw rows a storage provider hands to the engine.
//!
//! Records carry no behaviour beyond ordering. All derived state lives in
//! [`crate::aggregate`].

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── User ────────────────────────────────────────────────────────────────────

/// A registered participant, identified by amateur-radio call sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:          i64,
  pub call:        String,
  pub name:        String,
  pub active:      bool,
  /// Corrected post-hoc from observed history; see [`crate::date_joined`].
  pub date_joined: NaiveDate,
}

// ─── Exercise ────────────────────────────────────────────────────────────────

/// One scheduled, dated training event of a given type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Exercise {
  pub id:          i64,
  pub date:        NaiveDate,
  #[serde(rename = "type")]
  pub kind:        String,
  pub name:        String,
  pub description: String,
}

impl Exercise {
  /// Recency order: most recent date first, then highest id first.
  ///
  /// Every ordered exercise collection in this crate is sorted with this
  /// comparator.
  pub fn recency_cmp(a: &Exercise, b: &Exercise) -> Ordering {
    b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id))
  }
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// Where a submission was sent from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
  Valid { latitude: f64, longitude: f64 },
  /// The submission carried a location that could not be parsed.
  Invalid,
}

impl Location {
  pub fn is_valid(&self) -> bool { matches!(self, Self::Valid { .. }) }
}

/// One participant's submission for one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub id:             i64,
  pub user_id:        i64,
  pub exercise_id:    i64,
  /// Denormalised from the user table by the storage provider.
  #[serde(default)]
  pub call:           String,
  #[serde(default)]
  pub location:       Option<Location>,
  #[serde(default)]
  pub feedback_count: u32,
  #[serde(default)]
  pub feedback:       String,
  #[serde(default)]
  pub context:        String,
}
