//! The participation-history classifier.
//!
//! Every participant is placed in exactly one [`HistoryCategory`] according
//! to how many exercises of a window they attended.

use std::collections::BTreeMap;

use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator as _};

use crate::{
  aggregate::{Participant, ParticipantAggregate},
  record::Exercise,
  window::Window,
};

/// Share of a window a participant must attend to count as a heavy hitter.
pub const HEAVY_HITTER_RATIO: f64 = 0.9;

/// Engagement categories, declared in report order.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryCategory {
  /// Attended nothing in the window.
  FilteredOut,
  /// Attended only the window head.
  FirstTime,
  /// Attended exactly one exercise, not the head.
  OneAndDone,
  /// Attended at least [`HEAVY_HITTER_RATIO`] of the window.
  HeavyHitter,
  AllOther,
}

/// A participant with its category and the window entries it attended.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedParticipant {
  pub category:    HistoryCategory,
  pub participant: Participant,
  pub evidence:    Vec<Exercise>,
}

/// Classifier output, either grouped by category or flattened in category
/// order.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum History {
  Partitioned(BTreeMap<HistoryCategory, Vec<ClassifiedParticipant>>),
  Flat(Vec<ClassifiedParticipant>),
}

impl History {
  /// Total number of participants across all categories.
  pub fn len(&self) -> usize {
    match self {
      Self::Partitioned(groups) => groups.values().map(Vec::len).sum(),
      Self::Flat(list) => list.len(),
    }
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Flatten into category order; a flat history is returned as is.
  pub fn into_flat(self) -> Vec<ClassifiedParticipant> {
    match self {
      Self::Partitioned(groups) => groups.into_values().flatten().collect(),
      Self::Flat(list) => list,
    }
  }
}

/// `round(len × 0.9)`, rounding halves away from zero.
pub fn heavy_hitter_threshold(window_len: usize) -> usize {
  (window_len as f64 * HEAVY_HITTER_RATIO).round() as usize
}

/// Classify one participant against `window`.
///
/// `window` must not be empty.
pub fn classify(
  participant: &ParticipantAggregate,
  window:      &Window,
  threshold:   usize,
) -> (HistoryCategory, Vec<Exercise>) {
  let evidence = participant.intersect(window.exercises());
  let first_filtered = window.head().map(|e| e.id);
  let category = match evidence.len() {
    0 => HistoryCategory::FilteredOut,
    1 if participant.most_recent().map(|e| e.id) == first_filtered => {
      HistoryCategory::FirstTime
    }
    1 => HistoryCategory::OneAndDone,
    n if n >= threshold => HistoryCategory::HeavyHitter,
    _ => HistoryCategory::AllOther,
  };
  (category, evidence)
}

/// Classify every participant in `population` against `window`.
pub fn participant_history(
  population:  &BTreeMap<String, Participant>,
  window:      &Window,
  partitioned: bool,
) -> History {
  if window.is_empty() {
    return if partitioned {
      History::Partitioned(BTreeMap::new())
    } else {
      History::Flat(Vec::new())
    };
  }

  let threshold = heavy_hitter_threshold(window.len());
  let mut groups: BTreeMap<HistoryCategory, Vec<ClassifiedParticipant>> =
    HistoryCategory::iter().map(|c| (c, Vec::new())).collect();

  for participant in population.values() {
    let (category, evidence) = classify(participant, window, threshold);
    groups.entry(category).or_default().push(ClassifiedParticipant {
      category,
      participant: Participant::clone(participant),
      evidence,
    });
  }

  let history = History::Partitioned(groups);
  if partitioned {
    history
  } else {
    History::Flat(history.into_flat())
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use strum::IntoEnumIterator;

  use super::*;
  use crate::{
    aggregate::Aggregates,
    record::{Event, User},
    tests::fixtures::{event, exercise, user},
  };

  /// Ten monthly exercises, ids 1..=10, id 10 latest.
  fn ten_exercises() -> Vec<Exercise> {
    (1..=10)
      .map(|i| exercise(i, &format!("2023-{i:02}-01"), "ETO"))
      .collect()
  }

  fn attend(events: &mut Vec<Event>, user_id: i64, exercise_ids: &[i64]) {
    for &x in exercise_ids {
      let id = events.len() as i64 + 1;
      events.push(event(id, user_id, x));
    }
  }

  fn scenario() -> (Aggregates, Window) {
    let users: Vec<User> = vec![
      user(1, "HEAVY", true),
      user(2, "FIRST", true),
      user(3, "ONCE", true),
      user(4, "NONE", true),
      user(5, "HALF", true),
    ];
    let mut exercises = ten_exercises();
    exercises.push(exercise(11, "2023-06-15", "SET"));

    let mut events = Vec::new();
    attend(&mut events, 1, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    attend(&mut events, 2, &[10]);
    attend(&mut events, 3, &[4]);
    attend(&mut events, 5, &[2, 4, 6, 8, 10]);
    // NONE only attended outside the ETO window.
    attend(&mut events, 4, &[11]);

    let aggs = Aggregates::build(&users, &exercises, &events).unwrap();
    let types: BTreeSet<String> = ["ETO".to_string()].into();
    let window = aggs.catalog().window(&types, None).unwrap();
    (aggs, window)
  }

  fn category_of(history: &[ClassifiedParticipant], call: &str) -> HistoryCategory {
    history
      .iter()
      .find(|c| c.participant.call() == call)
      .map(|c| c.category)
      .unwrap()
  }

  #[test]
  fn threshold_rounds_to_nearest() {
    assert_eq!(heavy_hitter_threshold(10), 9);
    assert_eq!(heavy_hitter_threshold(5), 5); // 4.5 rounds up
    assert_eq!(heavy_hitter_threshold(3), 3); // 2.7
    assert_eq!(heavy_hitter_threshold(1), 1);
  }

  #[test]
  fn classifies_window_of_ten() {
    let (aggs, window) = scenario();
    assert_eq!(window.len(), 10);

    let flat = participant_history(aggs.all(), &window, false).into_flat();
    assert_eq!(category_of(&flat, "HEAVY"), HistoryCategory::HeavyHitter);
    assert_eq!(category_of(&flat, "FIRST"), HistoryCategory::FirstTime);
    assert_eq!(category_of(&flat, "ONCE"), HistoryCategory::OneAndDone);
    assert_eq!(category_of(&flat, "NONE"), HistoryCategory::FilteredOut);
    assert_eq!(category_of(&flat, "HALF"), HistoryCategory::AllOther);
  }

  #[test]
  fn flat_output_follows_category_order() {
    let (aggs, window) = scenario();
    let flat = participant_history(aggs.all(), &window, false).into_flat();
    let order: Vec<_> = flat.iter().map(|c| c.participant.call()).collect();
    assert_eq!(order, vec!["NONE", "FIRST", "ONCE", "HEAVY", "HALF"]);
    assert!(flat.windows(2).all(|w| w[0].category <= w[1].category));
  }

  #[test]
  fn partitioned_and_flat_agree() {
    let (aggs, window) = scenario();
    let partitioned = participant_history(aggs.all(), &window, true);
    let flat = participant_history(aggs.all(), &window, false);
    assert_eq!(partitioned.len(), flat.len());

    let History::Partitioned(groups) = &partitioned else {
      panic!("expected partitioned history");
    };
    assert_eq!(groups.len(), 5);
    let flat = flat.into_flat();
    for (category, members) in groups {
      for member in members {
        assert_eq!(category_of(&flat, member.participant.call()), *category);
      }
    }
  }

  #[test]
  fn evidence_is_window_intersection() {
    let (aggs, window) = scenario();
    let flat = participant_history(aggs.all(), &window, false).into_flat();
    let half = flat.iter().find(|c| c.participant.call() == "HALF").unwrap();
    let ids: Vec<_> = half.evidence.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![10, 8, 6, 4, 2]);
  }

  #[test]
  fn classification_is_deterministic() {
    let (aggs, window) = scenario();
    let threshold = heavy_hitter_threshold(window.len());
    for p in aggs.all().values() {
      assert_eq!(
        classify(p, &window, threshold).0,
        classify(p, &window, threshold).0
      );
    }
  }

  #[test]
  fn empty_window_is_empty_history() {
    let (aggs, _) = scenario();
    assert!(participant_history(aggs.all(), &Window::default(), true).is_empty());
    assert!(participant_history(aggs.all(), &Window::default(), false).is_empty());
  }

  #[test]
  fn category_names_match_report_labels() {
    assert_eq!(HistoryCategory::OneAndDone.to_string(), "ONE_AND_DONE");
    let all: Vec<_> = HistoryCategory::iter().collect();
    assert_eq!(all.first(), Some(&HistoryCategory::FilteredOut));
    assert_eq!(all.last(), Some(&HistoryCategory::AllOther));
  }
}
