//! The snapshot: the catalogue as the audit log says it should be.
//!
//! A snapshot is only ever built by folding audit entries. It is never loaded
//! from the catalogue directly; that is what keeps the log complete.

use ludoteca_core::{
  audit::{AuditEntry, EntryKind, NewEntry},
  game::Game,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
  games: Vec<Game>,
}

impl Snapshot {
  pub fn new() -> Self { Self::default() }

  /// Fold `entries` left to right, starting from empty.
  pub fn replay<'a>(entries: impl IntoIterator<Item = &'a AuditEntry>) -> Self {
    let mut snapshot = Self::new();
    for entry in entries {
      snapshot.apply(entry.kind, &entry.game);
    }
    snapshot
  }

  /// Advance the snapshot by one entry.
  ///
  /// `update` and `removed` entries for a game the snapshot does not hold are
  /// ignored, so a hand-damaged log still replays.
  pub fn apply(&mut self, kind: EntryKind, game: &Game) {
    match kind {
      EntryKind::New => self.games.push(game.without_binding()),
      EntryKind::Update => {
        if let Some(slot) = self.games.iter_mut().find(|g| g.matches(game)) {
          *slot = game.without_binding();
        }
      }
      EntryKind::Removed => {
        if let Some(i) = self.position(game) {
          self.games.swap_remove(i);
        }
      }
    }
  }

  pub fn apply_entry(&mut self, entry: &NewEntry) { self.apply(entry.kind, &entry.game); }

  /// The first game sharing `game`'s identity pair.
  pub fn find(&self, game: &Game) -> Option<&Game> {
    self.games.iter().find(|g| g.matches(game))
  }

  pub fn games(&self) -> &[Game] { &self.games }

  pub fn len(&self) -> usize { self.games.len() }

  pub fn is_empty(&self) -> bool { self.games.is_empty() }

  fn position(&self, game: &Game) -> Option<usize> {
    self.games.iter().position(|g| g.matches(game))
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  fn at(day: u32, kind: EntryKind, game: Game) -> AuditEntry {
    AuditEntry::new(Utc.with_ymd_and_hms(2023, 1, day, 0, 0, 0).unwrap(), kind, game)
  }

  #[test]
  fn replay_folds_new_update_removed() {
    let azul = Game::new("1", "Azul", "Centro", "");
    let hanabi = Game::new("2", "Hanabi", "Centro", "");
    let lent = Game::new("1", "azul", "Centro", "Victor");

    let log = vec![
      at(1, EntryKind::New, azul.clone()),
      at(1, EntryKind::New, hanabi.clone()),
      at(2, EntryKind::Update, lent.clone()),
      at(3, EntryKind::Removed, hanabi.clone()),
    ];
    let snapshot = Snapshot::replay(&log);

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.find(&azul), Some(&lent));
    assert_eq!(snapshot.find(&hanabi), None);
  }

  #[test]
  fn update_and_remove_of_unknown_games_are_ignored() {
    let mut snapshot = Snapshot::new();
    snapshot.apply(EntryKind::Update, &Game::new("1", "Azul", "Centro", "Ana"));
    snapshot.apply(EntryKind::Removed, &Game::new("2", "Hanabi", "Centro", ""));
    assert!(snapshot.is_empty());
  }

  #[test]
  fn row_binding_is_never_stored() {
    let mut game = Game::new("1", "Azul", "Centro", "");
    game.row = Some("Catalogue!A2".into());
    let mut snapshot = Snapshot::new();
    snapshot.apply(EntryKind::New, &game);
    assert_eq!(snapshot.games()[0].row, None);
  }

  #[test]
  fn update_keeps_one_record_per_identity() {
    let mut snapshot = Snapshot::new();
    snapshot.apply(EntryKind::New, &Game::new("1", "Azul", "Centro", ""));
    snapshot.apply(EntryKind::New, &Game::new("2", "Azul", "Centro", ""));
    snapshot.apply(EntryKind::Update, &Game::new("1", "AZUL", "Gamonal", ""));

    assert_eq!(snapshot.len(), 2);
    let moved: Vec<_> = snapshot.games().iter().filter(|g| g.location == "Gamonal").collect();
    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].id, "1");
  }
}
