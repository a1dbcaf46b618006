//! Audit entries: the append-only history of the catalogue.
//!
//! Every entry carries the full game payload, so any entry can be read on its
//! own without walking back through earlier entries of the same game.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::Game;

/// What happened to a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
  New,
  Update,
  Removed,
}

impl EntryKind {
  /// The string stored in the kind column of the audit sheet.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::New => "new",
      Self::Update => "update",
      Self::Removed => "removed",
    }
  }
}

impl fmt::Display for EntryKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for EntryKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "new" => Ok(Self::New),
      "update" => Ok(Self::Update),
      "removed" => Ok(Self::Removed),
      other => Err(format!("unknown entry kind: {other:?}")),
    }
  }
}

// ─── NewEntry ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::AuditLog::append`]. The timestamp is always
/// assigned by the log; it is not accepted from callers.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
  pub kind: EntryKind,
  pub game: Game,
}

impl NewEntry {
  pub fn new(game: &Game) -> Self {
    Self { kind: EntryKind::New, game: game.without_binding() }
  }

  pub fn update(game: &Game) -> Self {
    Self { kind: EntryKind::Update, game: game.without_binding() }
  }

  pub fn removed(game: &Game) -> Self {
    Self { kind: EntryKind::Removed, game: game.without_binding() }
  }

  /// Seal the entry with the log's timestamp.
  pub fn stamp(self, timestamp: DateTime<Utc>) -> AuditEntry {
    AuditEntry { timestamp: Some(timestamp), kind: self.kind, game: self.game }
  }
}

// ─── AuditEntry ──────────────────────────────────────────────────────────────

/// An immutable, timestamped log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
  /// Assigned by the log at append time. `None` only when a hand-edited row
  /// holds an unparseable timestamp.
  pub timestamp: Option<DateTime<Utc>>,
  pub kind:      EntryKind,
  pub game:      Game,
}

impl AuditEntry {
  pub fn new(
    timestamp: DateTime<Utc>,
    kind: EntryKind,
    game: Game,
  ) -> Self {
    Self { timestamp: Some(timestamp), kind, game }
  }
}
