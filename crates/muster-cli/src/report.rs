//! Compact JSON shapes for command output.
//!
//! The core result types serialise whole aggregates; reports only need the
//! participant's identity and the evidence behind the result.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use muster_core::{
  aggregate::ParticipantAggregate,
  history::{ClassifiedParticipant, History, HistoryCategory},
  missing::AnnotatedParticipant,
  record::Exercise,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ExerciseRef {
  pub id:   i64,
  pub date: NaiveDate,
  #[serde(rename = "type")]
  pub kind: String,
}

impl From<&Exercise> for ExerciseRef {
  fn from(e: &Exercise) -> Self {
    Self { id: e.id, date: e.date, kind: e.kind.clone() }
  }
}

#[derive(Debug, Serialize)]
pub struct ParticipantRow {
  pub call:          String,
  pub name:          String,
  pub active:        bool,
  pub last_exercise: Option<NaiveDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category:      Option<HistoryCategory>,
  pub evidence:      Vec<ExerciseRef>,
}

impl ParticipantRow {
  fn new(
    p: &ParticipantAggregate,
    category: Option<HistoryCategory>,
    evidence: &[Exercise],
  ) -> Self {
    Self {
      call: p.call().to_owned(),
      name: p.user().name.clone(),
      active: p.user().active,
      last_exercise: p.last_exercise_date(),
      category,
      evidence: evidence.iter().map(ExerciseRef::from).collect(),
    }
  }
}

impl From<&AnnotatedParticipant> for ParticipantRow {
  fn from(a: &AnnotatedParticipant) -> Self {
    Self::new(&a.participant, None, &a.evidence)
  }
}

impl From<&ClassifiedParticipant> for ParticipantRow {
  fn from(c: &ClassifiedParticipant) -> Self {
    Self::new(&c.participant, Some(c.category), &c.evidence)
  }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum HistoryReport {
  Partitioned(BTreeMap<HistoryCategory, Vec<ParticipantRow>>),
  Flat(Vec<ParticipantRow>),
}

impl From<&History> for HistoryReport {
  fn from(h: &History) -> Self {
    match h {
      History::Partitioned(groups) => Self::Partitioned(
        groups
          .iter()
          .map(|(c, members)| (*c, members.iter().map(ParticipantRow::from).collect()))
          .collect(),
      ),
      History::Flat(list) => Self::Flat(list.iter().map(ParticipantRow::from).collect()),
    }
  }
}
