//! The aggregate builder — an in-memory join of users, exercises and events.
//!
//! [`Aggregates::build`] turns the three raw collections into one
//! [`ParticipantAggregate`] per call sign plus the [`ExerciseCatalog`]. The
//! result is never persisted and is rebuilt from scratch on every reload.

use std::{
  collections::{BTreeMap, BTreeSet, HashMap, HashSet},
  sync::Arc,
};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  Error, Result,
  record::{Event, Exercise, Location, User},
};

// ─── Participant ─────────────────────────────────────────────────────────────

/// One attended exercise paired with the submission made for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attendance {
  pub exercise: Exercise,
  pub event:    Event,
}

/// A participant joined with every exercise and event linked to them.
///
/// Attendance is kept in recency order (see [`Exercise::recency_cmp`]).
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantAggregate {
  user:               User,
  attendance:         Vec<Attendance>,
  last_exercise_date: Option<NaiveDate>,
  last_location:      Option<Location>,
  #[serde(skip)]
  attended_ids:       HashSet<i64>,
}

impl ParticipantAggregate {
  fn new(user: User) -> Self {
    Self {
      user,
      attendance: Vec::new(),
      last_exercise_date: None,
      last_location: None,
      attended_ids: HashSet::new(),
    }
  }

  fn record(&mut self, exercise: Exercise, event: Event) {
    // Ties keep the first location seen.
    if self.last_exercise_date.is_none_or(|last| exercise.date > last) {
      self.last_exercise_date = Some(exercise.date);
      self.last_location = event.location;
    }
    self.attended_ids.insert(exercise.id);
    self.attendance.push(Attendance { exercise, event });
  }

  fn finish(&mut self) {
    self
      .attendance
      .sort_by(|a, b| Exercise::recency_cmp(&a.exercise, &b.exercise));
  }

  pub fn user(&self) -> &User { &self.user }

  pub fn call(&self) -> &str { &self.user.call }

  pub fn attendance(&self) -> &[Attendance] { &self.attendance }

  pub fn exercises(&self) -> impl Iterator<Item = &Exercise> {
    self.attendance.iter().map(|a| &a.exercise)
  }

  pub fn events(&self) -> impl Iterator<Item = &Event> {
    self.attendance.iter().map(|a| &a.event)
  }

  pub fn last_exercise_date(&self) -> Option<NaiveDate> { self.last_exercise_date }

  pub fn last_location(&self) -> Option<Location> { self.last_location }

  /// The most recently attended exercise.
  pub fn most_recent(&self) -> Option<&Exercise> {
    self.attendance.first().map(|a| &a.exercise)
  }

  /// The earliest attended exercise.
  pub fn earliest(&self) -> Option<&Exercise> {
    self.attendance.last().map(|a| &a.exercise)
  }

  pub fn attended(&self, exercise_id: i64) -> bool {
    self.attended_ids.contains(&exercise_id)
  }

  /// The entries of `exercises` this participant attended, in the order
  /// given.
  pub fn intersect<'a, I>(&self, exercises: I) -> Vec<Exercise>
  where
    I: IntoIterator<Item = &'a Exercise>,
  {
    exercises
      .into_iter()
      .filter(|e| self.attended(e.id))
      .cloned()
      .collect()
  }
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// Every exercise referenced by at least one event, deduplicated by id and
/// kept in recency order, plus the distinct exercise types.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExerciseCatalog {
  exercises: Vec<Exercise>,
  types:     BTreeSet<String>,
}

impl ExerciseCatalog {
  pub fn new(exercises: impl IntoIterator<Item = Exercise>) -> Self {
    let mut by_id: BTreeMap<i64, Exercise> = BTreeMap::new();
    for exercise in exercises {
      by_id.entry(exercise.id).or_insert(exercise);
    }
    let mut exercises: Vec<Exercise> = by_id.into_values().collect();
    exercises.sort_by(Exercise::recency_cmp);
    let types = exercises.iter().map(|e| e.kind.clone()).collect();
    Self { exercises, types }
  }

  pub fn exercises(&self) -> &[Exercise] { &self.exercises }

  pub fn types(&self) -> &BTreeSet<String> { &self.types }

  pub fn most_recent(&self) -> Option<&Exercise> { self.exercises.first() }

  pub fn is_empty(&self) -> bool { self.exercises.is_empty() }

  pub fn len(&self) -> usize { self.exercises.len() }
}

// ─── Aggregate set ───────────────────────────────────────────────────────────

/// Participant type shared between the full and active views.
pub type Participant = Arc<ParticipantAggregate>;

/// The complete output of one build: every participant keyed by call, the
/// active subset, and the exercise catalog.
#[derive(Debug, Clone, Default)]
pub struct Aggregates {
  all:     BTreeMap<String, Participant>,
  active:  BTreeMap<String, Participant>,
  catalog: ExerciseCatalog,
}

impl Aggregates {
  /// Join `events` against `users` and `exercises`.
  ///
  /// An event whose user or exercise id cannot be resolved aborts the whole
  /// build.
  pub fn build(
    users:     &[User],
    exercises: &[Exercise],
    events:    &[Event],
  ) -> Result<Self> {
    let users_by_id: HashMap<i64, &User> =
      users.iter().map(|u| (u.id, u)).collect();
    let exercises_by_id: HashMap<i64, &Exercise> =
      exercises.iter().map(|e| (e.id, e)).collect();

    let mut participants: BTreeMap<String, ParticipantAggregate> = BTreeMap::new();
    let mut referenced: Vec<Exercise> = Vec::new();
    let mut referenced_ids: HashSet<i64> = HashSet::new();

    // Fixed processing order keeps same-date ties stable across inputs.
    let mut ordered: Vec<&Event> = events.iter().collect();
    ordered.sort_by_key(|e| e.id);

    for event in ordered {
      let user = users_by_id.get(&event.user_id).ok_or(Error::MissingUser {
        event_id: event.id,
        user_id:  event.user_id,
      })?;
      let exercise =
        exercises_by_id
          .get(&event.exercise_id)
          .ok_or(Error::MissingExercise {
            event_id:    event.id,
            exercise_id: event.exercise_id,
          })?;

      participants
        .entry(user.call.clone())
        .or_insert_with(|| ParticipantAggregate::new((*user).clone()))
        .record((*exercise).clone(), event.clone());

      if referenced_ids.insert(exercise.id) {
        referenced.push((*exercise).clone());
      }
    }

    let mut all = BTreeMap::new();
    let mut active = BTreeMap::new();
    for (call, mut participant) in participants {
      participant.finish();
      let participant = Arc::new(participant);
      if participant.user.active {
        active.insert(call.clone(), Arc::clone(&participant));
      }
      all.insert(call, participant);
    }

    let catalog = ExerciseCatalog::new(referenced);
    tracing::debug!(
      participants = all.len(),
      active = active.len(),
      exercises = catalog.len(),
      "built participant aggregates"
    );

    Ok(Self { all, active, catalog })
  }

  pub fn all(&self) -> &BTreeMap<String, Participant> { &self.all }

  pub fn active(&self) -> &BTreeMap<String, Participant> { &self.active }

  /// The participants a query should consider.
  pub fn population(&self, active_only: bool) -> &BTreeMap<String, Participant> {
    if active_only { &self.active } else { &self.all }
  }

  pub fn catalog(&self) -> &ExerciseCatalog { &self.catalog }
}
