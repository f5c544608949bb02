//! The missing-participant detector.
//!
//! Finds participants who took part in at least one of the most recent
//! exercises of a window but skipped the latest one. Participants who have
//! been away longer than the miss limit are not reported.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
  aggregate::Participant,
  record::Exercise,
  window::Window,
};

/// A participant together with the exercises that justify reporting them.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedParticipant {
  pub participant: Participant,
  /// Window entries the participant attended, latest first.
  pub evidence:    Vec<Exercise>,
}

/// Report every participant in `population` who missed the window head but
/// attended one of the `miss_limit` exercises before it.
pub fn missing_participants(
  population: &BTreeMap<String, Participant>,
  window:     &Window,
  miss_limit: usize,
) -> Vec<AnnotatedParticipant> {
  let Some(most_recent) = window.head() else {
    return Vec::new();
  };
  let span = window.len().min(miss_limit.saturating_add(1));
  let candidates = &window.exercises()[..span];

  population
    .values()
    .filter(|p| p.most_recent().is_none_or(|e| e.id != most_recent.id))
    .filter_map(|p| {
      let evidence = p.intersect(candidates);
      (!evidence.is_empty()).then(|| AnnotatedParticipant {
        participant: Participant::clone(p),
        evidence,
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;
  use crate::{
    aggregate::Aggregates,
    tests::fixtures::{event, exercise, user},
  };

  /// Window [E5, E4, E3, E2, E1] with one participant per attended exercise.
  fn scenario() -> (Aggregates, Window) {
    let users = vec![
      user(1, "ONLY5", true),
      user(2, "ONLY3", true),
      user(3, "ONLY1", true),
      user(4, "FOUR2", true),
    ];
    let exercises = (1..=5)
      .map(|i| exercise(i, &format!("2024-0{i}-01"), "ETO"))
      .collect::<Vec<_>>();
    let events = vec![
      event(100, 1, 5),
      event(101, 2, 3),
      event(102, 3, 1),
      event(103, 4, 4),
      event(104, 4, 2),
    ];
    let aggs = Aggregates::build(&users, &exercises, &events).unwrap();
    let window = aggs.catalog().window(&BTreeSet::new(), None).unwrap();
    (aggs, window)
  }

  fn calls(found: &[AnnotatedParticipant]) -> Vec<&str> {
    found.iter().map(|a| a.participant.call()).collect()
  }

  #[test]
  fn reports_recent_skippers_only() {
    let (aggs, window) = scenario();
    let found = missing_participants(aggs.all(), &window, 2);

    assert_eq!(calls(&found), vec!["FOUR2", "ONLY3"]);

    let only3 = &found[1];
    let evidence: Vec<_> = only3.evidence.iter().map(|e| e.id).collect();
    assert_eq!(evidence, vec![3]);

    let four2 = &found[0];
    let evidence: Vec<_> = four2.evidence.iter().map(|e| e.id).collect();
    assert_eq!(evidence, vec![4]);
  }

  #[test]
  fn zero_miss_limit_reports_nobody() {
    let (aggs, window) = scenario();
    assert!(missing_participants(aggs.all(), &window, 0).is_empty());
  }

  #[test]
  fn large_miss_limit_covers_whole_window() {
    let (aggs, window) = scenario();
    let found = missing_participants(aggs.all(), &window, 100);
    assert_eq!(calls(&found), vec!["FOUR2", "ONLY1", "ONLY3"]);
  }

  #[test]
  fn older_reference_counts_back_from_that_exercise() {
    let users = vec![user(1, "LATE", true), user(2, "ONLY3", true)];
    let exercises = (1..=5)
      .map(|i| exercise(i, &format!("2024-0{i}-01"), "ETO"))
      .collect::<Vec<_>>();
    let events = vec![event(100, 1, 5), event(101, 1, 3), event(102, 2, 3)];
    let aggs = Aggregates::build(&users, &exercises, &events).unwrap();
    let from = exercises[2].clone();
    let window = aggs.catalog().window(&BTreeSet::new(), Some(&from)).unwrap();
    assert_eq!(window.head().map(|e| e.id), Some(3));

    // LATE's latest attendance is E5, after the head, so E3 still counts.
    let found = missing_participants(aggs.all(), &window, 2);
    assert_eq!(calls(&found), vec!["LATE"]);
    let evidence: Vec<_> = found[0].evidence.iter().map(|e| e.id).collect();
    assert_eq!(evidence, vec![3]);
  }

  #[test]
  fn empty_window_reports_nobody() {
    let (aggs, _) = scenario();
    assert!(missing_participants(aggs.all(), &Window::default(), 2).is_empty());
  }
}
