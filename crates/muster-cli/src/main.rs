//! `muster` — participation reports for training exercises.
//!
//! # Usage
//!
//! ```text
//! muster --config muster.toml missing --type ETO --miss-limit 2
//! muster history --type ETO --type SET --partitioned
//! muster import exercise-2024-03.json
//! ```

mod report;
mod settings;

use std::{collections::BTreeSet, io, path::PathBuf};

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use muster_core::{
  Analytics,
  record::{Event, Exercise, User},
};
use muster_store_sqlite::SqliteStore;
use report::{HistoryReport, ParticipantRow};
use serde::{Deserialize, Serialize};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "muster", author, version, about = "Exercise participation reports")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "muster.toml")]
  config: PathBuf,

  /// Only consider active participants (overrides the config file).
  #[arg(long, overrides_with = "all")]
  active_only: bool,

  /// Consider every participant, active or not (overrides the config file).
  #[arg(long, overrides_with = "active_only")]
  all: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Participants who skipped the latest exercise after recent attendance.
  Missing {
    #[command(flatten)]
    window:     WindowArgs,
    /// How many exercises before the latest still count as recent.
    #[arg(long, default_value_t = 2)]
    miss_limit: usize,
  },
  /// Classify every participant's engagement over the window.
  History {
    #[command(flatten)]
    window:      WindowArgs,
    /// Group participants by category instead of one ordered list.
    #[arg(long)]
    partitioned: bool,
  },
  /// List the exercise types seen so far.
  Types,
  /// Rewrite every participant's join date from their first exercise.
  UpdateDateJoined,
  /// Check the store and exit.
  Health,
  /// Register a participant.
  AddUser {
    #[arg(long)]
    id:          i64,
    #[arg(long)]
    call:        String,
    #[arg(long)]
    name:        String,
    #[arg(long)]
    date_joined: NaiveDate,
    #[arg(long)]
    inactive:    bool,
  },
  /// Store an exercise and its events from a JSON file.
  Import {
    file: PathBuf,
  },
}

#[derive(clap::Args, Debug)]
struct WindowArgs {
  /// Exercise type to include; repeat for several. Defaults to all types.
  #[arg(long = "type", value_name = "TYPE")]
  types: Vec<String>,
  /// Id of the exercise to count back from. Defaults to the latest.
  #[arg(long, value_name = "EXERCISE_ID")]
  from:  Option<i64>,
}

/// Shape of an `import` file.
#[derive(Deserialize)]
struct ImportFile {
  exercise: Exercise,
  #[serde(default)]
  events:   Vec<Event>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let store = SqliteStore::open(&settings.store_path)
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?
    .allow_future_exercises(settings.allow_future_exercises);
  let mut analytics = Analytics::new(store, cli.population_filter(&settings));

  match cli.command {
    Command::Missing { window, miss_limit } => {
      let from = resolve_from(&mut analytics, window.from)?;
      let found = analytics.users_missing_exercises(
        &window.type_set(),
        from.as_ref(),
        miss_limit,
      )?;
      let rows: Vec<ParticipantRow> = found.iter().map(ParticipantRow::from).collect();
      print_json(&rows)
    }
    Command::History { window, partitioned } => {
      let from = resolve_from(&mut analytics, window.from)?;
      let history = analytics.users_history(&window.type_set(), from.as_ref(), partitioned)?;
      print_json(&HistoryReport::from(&history))
    }
    Command::Types => print_json(analytics.catalog()?.types()),
    Command::UpdateDateJoined => {
      let corrections = analytics.update_date_joined()?;
      print_json(&corrections)
    }
    Command::Health => {
      analytics.get_health();
      tracing::info!(store = ?settings.store_path, "store is healthy");
      Ok(())
    }
    Command::AddUser { id, call, name, date_joined, inactive } => {
      let user = User { id, call, name, active: !inactive, date_joined };
      analytics
        .store()
        .add_user(&user)
        .with_context(|| format!("failed to add user {}", user.call))?;
      analytics.invalidate();
      Ok(())
    }
    Command::Import { file } => {
      let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("reading import file {}", file.display()))?;
      let import: ImportFile = serde_json::from_str(&raw).context("parsing import file")?;
      analytics
        .bulk_insert(&import.exercise, &import.events)
        .with_context(|| format!("failed to import exercise {}", import.exercise.id))?;
      tracing::info!(
        exercise = import.exercise.id,
        events = import.events.len(),
        "imported exercise"
      );
      Ok(())
    }
  }
}

impl Cli {
  /// The active-only setting, with either command-line flag taking precedence
  /// over the config file.
  fn population_filter(&self, settings: &Settings) -> bool {
    match (self.active_only, self.all) {
      (true, _) => true,
      (_, true) => false,
      _ => settings.active_only,
    }
  }
}

impl WindowArgs {
  fn type_set(&self) -> BTreeSet<String> { self.types.iter().cloned().collect() }
}

/// Look up the reference exercise by id in the catalog.
fn resolve_from(
  analytics: &mut Analytics<SqliteStore>,
  id: Option<i64>,
) -> Result<Option<Exercise>> {
  let Some(id) = id else { return Ok(None) };
  let catalog = analytics.catalog()?;
  let exercise = catalog
    .exercises()
    .iter()
    .find(|e| e.id == id)
    .cloned()
    .with_context(|| format!("exercise {id} has no recorded events"))?;
  Ok(Some(exercise))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
  let stdout = io::stdout();
  serde_json::to_writer(stdout.lock(), value).context("writing output")?;
  println!();
  Ok(())
}
