//! Date-joined correction.
//!
//! A user's join date is rewritten from their earliest attended exercise.
//! The rewrite is unconditional: every participant gets exactly one write,
//! whether or not the stored value already matches.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::Participant;

/// One planned (and, via the façade, performed) join-date write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateJoinedCorrection {
  pub user_id:  i64,
  pub call:     String,
  pub previous: NaiveDate,
  pub written:  NaiveDate,
}

impl DateJoinedCorrection {
  /// Whether the written date differs from the stored one.
  pub fn changed(&self) -> bool { self.previous != self.written }
}

/// Compute the join-date write for every participant in `participants`.
///
/// Earlier-than-recorded histories are logged as correction candidates.
pub fn date_joined_corrections(
  participants: &BTreeMap<String, Participant>,
) -> Vec<DateJoinedCorrection> {
  participants
    .values()
    .filter_map(|p| {
      let earliest = p.earliest()?;
      let user = p.user();
      if earliest.date < user.date_joined {
        tracing::info!(
          call = %user.call,
          recorded = %user.date_joined,
          earliest = %earliest.date,
          "participant attended before recorded join date"
        );
      }
      Some(DateJoinedCorrection {
        user_id:  user.id,
        call:     user.call.clone(),
        previous: user.date_joined,
        written:  earliest.date,
      })
    })
    .collect()
}
