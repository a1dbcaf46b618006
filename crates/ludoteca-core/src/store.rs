//! The `Catalogue` and `AuditLog` traits and supporting query types.
//!
//! The traits are implemented by the sheet adapters in [`crate::sheet`].
//! Higher layers (`ludoteca-sync`, `ludoteca-api`) depend on these
//! abstractions, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  audit::{AuditEntry, NewEntry},
  game::{Game, GameKey},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Filter over the audit log. Every bound is optional; `from` and `to` are
/// inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditQuery {
  pub from:   Option<DateTime<Utc>>,
  pub to:     Option<DateTime<Utc>>,
  /// Restrict to one game, matched by identity pair.
  pub game:   Option<GameKey>,
  /// Restrict to entries whose holder is this member's nickname.
  pub member: Option<String>,
  /// Keep at most this many of the most recent matches; `0` keeps all.
  pub limit:  usize,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// The human-maintained table of games.
///
/// Rows are ordered by position; a game's position is recorded in its row
/// binding so updates land on the same row.
pub trait Catalogue: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every complete row, in sheet order.
  fn list(
    &self,
  ) -> impl Future<Output = Result<Vec<Game>, Self::Error>> + Send + '_;

  /// The first game with the identity pair `(id, name)`.
  fn get<'a>(
    &'a self,
    id: &'a str,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Game>, Self::Error>> + Send + 'a;

  /// Games whose normalised name contains the normalised `text`.
  fn find<'a>(
    &'a self,
    text: &'a str,
  ) -> impl Future<Output = Result<Vec<Game>, Self::Error>> + Send + 'a;

  /// Write each game back to the row it is bound to.
  fn update(
    &self,
    games: Vec<Game>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// The append-only audit log.
pub trait AuditLog: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All entries, ascending by timestamp; ties keep insertion order.
  fn list(
    &self,
  ) -> impl Future<Output = Result<Vec<AuditEntry>, Self::Error>> + Send + '_;

  /// Stamp every entry with the current instant and persist them in order.
  /// Either all entries become durable or none do.
  fn append(
    &self,
    entries: Vec<NewEntry>,
  ) -> impl Future<Output = Result<Vec<AuditEntry>, Self::Error>> + Send + '_;
}
