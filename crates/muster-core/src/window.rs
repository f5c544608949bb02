//! Exercise window selection.
//!
//! A window is the type-filtered slice of the catalog from a reference
//! exercise backward in time. Both derived queries are evaluated over one.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::{Error, Result, aggregate::ExerciseCatalog, record::Exercise};

/// An ordered, type-filtered sub-history of the catalog, latest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Window {
  exercises: Vec<Exercise>,
}

impl Window {
  pub fn exercises(&self) -> &[Exercise] { &self.exercises }

  /// The reference point of the window.
  pub fn head(&self) -> Option<&Exercise> { self.exercises.first() }

  pub fn len(&self) -> usize { self.exercises.len() }

  pub fn is_empty(&self) -> bool { self.exercises.is_empty() }
}

impl ExerciseCatalog {
  /// Select the window starting at `from` (or the most recent exercise)
  /// through every older exercise whose type is in `required_types`.
  ///
  /// An empty `required_types` accepts every observed type. A reference
  /// that is not in the catalog yields an empty window.
  pub fn window(
    &self,
    required_types: &BTreeSet<String>,
    from:           Option<&Exercise>,
  ) -> Result<Window> {
    let Some(reference) = from.or_else(|| self.most_recent()) else {
      return Ok(Window::default());
    };
    if reference.id <= 0 {
      return Err(Error::InvalidArgument(format!(
        "reference exercise has non-positive id {}",
        reference.id
      )));
    }

    let types: BTreeSet<&String> = if required_types.is_empty() {
      self.types().iter().collect()
    } else {
      required_types.intersection(self.types()).collect()
    };

    let Some(start) = self.exercises().iter().position(|e| e.id == reference.id)
    else {
      return Ok(Window::default());
    };

    let exercises = self.exercises()[start..]
      .iter()
      .filter(|e| types.contains(&e.kind))
      .cloned()
      .collect();
    Ok(Window { exercises })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tests::fixtures::exercise;

  fn types(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
  }

  /// Monthly A/B alternation from 2024-01-01 (A) to 2024-04-01 (B).
  fn interleaved() -> ExerciseCatalog {
    ExerciseCatalog::new(vec![
      exercise(1, "2024-01-01", "A"),
      exercise(2, "2024-01-15", "B"),
      exercise(3, "2024-02-01", "A"),
      exercise(4, "2024-02-15", "B"),
      exercise(5, "2024-03-01", "A"),
      exercise(6, "2024-03-15", "B"),
      exercise(7, "2024-04-01", "B"),
    ])
  }

  fn ids(w: &Window) -> Vec<i64> { w.exercises().iter().map(|e| e.id).collect() }

  #[test]
  fn filters_by_type_from_reference_backward() {
    let catalog = interleaved();
    let from = exercise(5, "2024-03-01", "A");
    let w = catalog.window(&types(&["A"]), Some(&from)).unwrap();
    assert_eq!(ids(&w), vec![5, 3, 1]);
  }

  #[test]
  fn empty_types_means_all_and_absent_reference_means_latest() {
    let w = interleaved().window(&BTreeSet::new(), None).unwrap();
    assert_eq!(ids(&w), vec![7, 6, 5, 4, 3, 2, 1]);
  }

  #[test]
  fn reference_of_other_type_is_dropped() {
    let catalog = interleaved();
    let from = exercise(6, "2024-03-15", "B");
    let w = catalog.window(&types(&["A"]), Some(&from)).unwrap();
    assert_eq!(ids(&w), vec![5, 3, 1]);
  }

  #[test]
  fn unmatched_reference_is_empty() {
    let catalog = interleaved();
    let from = exercise(42, "2024-03-15", "A");
    assert!(catalog.window(&types(&["A"]), Some(&from)).unwrap().is_empty());
  }

  #[test]
  fn unknown_type_is_empty() {
    let w = interleaved().window(&types(&["Z"]), None).unwrap();
    assert!(w.is_empty());
  }

  #[test]
  fn empty_catalog_is_empty() {
    let w = ExerciseCatalog::default().window(&BTreeSet::new(), None).unwrap();
    assert!(w.is_empty());
  }

  #[test]
  fn non_positive_reference_is_rejected() {
    let from = exercise(0, "2024-03-01", "A");
    let err = interleaved().window(&types(&["A"]), Some(&from)).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
  }
}
