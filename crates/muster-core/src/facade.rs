//! [`Analytics`] — the query façade over a [`StorageProvider`].
//!
//! The façade owns an [`AggregateCache`]. The first query loads every user,
//! exercise and event from storage and builds the aggregates; later queries
//! reuse them until a write through the façade (or an explicit
//! [`Analytics::invalidate`]) drops the cache.

use std::{collections::BTreeSet, sync::Arc};

use chrono::NaiveDate;

use crate::{
  Error, Result,
  aggregate::{Aggregates, ExerciseCatalog, Participant},
  date_joined::{DateJoinedCorrection, date_joined_corrections},
  history::{History, participant_history},
  missing::{AnnotatedParticipant, missing_participants},
  record::{Event, Exercise},
  store::StorageProvider,
};

// ─── Cache ───────────────────────────────────────────────────────────────────

/// Holds the current aggregate set, if one has been loaded.
///
/// The set is only ever replaced whole.
#[derive(Debug, Default)]
pub struct AggregateCache {
  current: Option<Arc<Aggregates>>,
}

impl AggregateCache {
  pub fn get(&self) -> Option<Arc<Aggregates>> { self.current.clone() }

  pub fn is_loaded(&self) -> bool { self.current.is_some() }

  pub fn replace(&mut self, aggregates: Arc<Aggregates>) {
    self.current = Some(aggregates);
  }

  pub fn invalidate(&mut self) { self.current = None; }
}

// ─── Façade ──────────────────────────────────────────────────────────────────

/// Participant analytics backed by a storage provider.
///
/// `active_only` selects whether queries consider only active users. The
/// date-joined correction always covers every participant.
pub struct Analytics<S> {
  store:       S,
  active_only: bool,
  cache:       AggregateCache,
}

impl<S: StorageProvider> Analytics<S> {
  pub fn new(store: S, active_only: bool) -> Self {
    Self { store, active_only, cache: AggregateCache::default() }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn active_only(&self) -> bool { self.active_only }

  pub fn is_loaded(&self) -> bool { self.cache.is_loaded() }

  /// Drop the cached aggregates; the next query reloads from storage.
  pub fn invalidate(&mut self) { self.cache.invalidate(); }

  /// Rebuild the aggregates from storage now.
  ///
  /// On failure the cache is left empty.
  pub fn reload(&mut self) -> Result<Arc<Aggregates>> {
    self.cache.invalidate();

    let users = self.store.fetch_all_users().map_err(Error::storage)?;
    let exercises = self.store.fetch_all_exercises().map_err(Error::storage)?;
    let events = self.store.fetch_all_events().map_err(Error::storage)?;
    tracing::debug!(
      users = users.len(),
      exercises = exercises.len(),
      events = events.len(),
      "reloading aggregates"
    );

    let aggregates = Arc::new(Aggregates::build(&users, &exercises, &events)?);
    self.cache.replace(Arc::clone(&aggregates));
    Ok(aggregates)
  }

  /// The cached aggregates, loading them first if necessary.
  pub fn aggregates(&mut self) -> Result<Arc<Aggregates>> {
    match self.cache.get() {
      Some(aggregates) => Ok(aggregates),
      None => self.reload(),
    }
  }

  // ── Queries ───────────────────────────────────────────────────────────

  pub fn catalog(&mut self) -> Result<ExerciseCatalog> {
    Ok(self.aggregates()?.catalog().clone())
  }

  /// Look up one participant by call sign.
  pub fn participant(&mut self, call: &str) -> Result<Option<Participant>> {
    let aggregates = self.aggregates()?;
    Ok(aggregates.population(self.active_only).get(call).cloned())
  }

  /// Participants who skipped the latest exercise of the window but attended
  /// one of the `miss_limit` exercises before it.
  pub fn users_missing_exercises(
    &mut self,
    required_types: &BTreeSet<String>,
    from:           Option<&Exercise>,
    miss_limit:     usize,
  ) -> Result<Vec<AnnotatedParticipant>> {
    let aggregates = self.aggregates()?;
    let window = aggregates.catalog().window(required_types, from)?;
    Ok(missing_participants(
      aggregates.population(self.active_only),
      &window,
      miss_limit,
    ))
  }

  /// Classify every participant's engagement over the window.
  pub fn users_history(
    &mut self,
    required_types: &BTreeSet<String>,
    from:           Option<&Exercise>,
    partitioned:    bool,
  ) -> Result<History> {
    let aggregates = self.aggregates()?;
    let window = aggregates.catalog().window(required_types, from)?;
    Ok(participant_history(
      aggregates.population(self.active_only),
      &window,
      partitioned,
    ))
  }

  // ── Writes ────────────────────────────────────────────────────────────

  /// Rewrite every participant's join date to their earliest attendance.
  ///
  /// Returns the writes performed. The cache is invalidated afterwards, even
  /// if a write fails part-way.
  pub fn update_date_joined(&mut self) -> Result<Vec<DateJoinedCorrection>> {
    let aggregates = self.aggregates()?;
    let corrections = date_joined_corrections(aggregates.all());

    let outcome = corrections.iter().try_for_each(|c| {
      self.persist_date_joined(c.user_id, c.written)
    });
    self.cache.invalidate();
    outcome?;

    tracing::info!(
      written = corrections.len(),
      changed = corrections.iter().filter(|c| c.changed()).count(),
      "updated join dates"
    );
    Ok(corrections)
  }

  fn persist_date_joined(&self, user_id: i64, date: NaiveDate) -> Result<()> {
    self
      .store
      .persist_date_joined(user_id, date)
      .map_err(Error::storage)
  }

  /// Store a new exercise with its events and drop the cache.
  pub fn bulk_insert(&mut self, exercise: &Exercise, events: &[Event]) -> Result<()> {
    self
      .store
      .bulk_insert(exercise, events)
      .map_err(Error::storage)?;
    self.cache.invalidate();
    Ok(())
  }

  // ── Health ────────────────────────────────────────────────────────────

  /// Check the storage provider.
  ///
  /// # Panics
  ///
  /// Panics if the provider reports a failure; an unhealthy store is
  /// treated as unrecoverable.
  pub fn get_health(&self) {
    if let Err(e) = self.store.health_check() {
      tracing::error!(error = %e, "storage provider failed health check");
      panic!("storage provider failed health check: {e}");
    }
  }
}
