//! Diff engine: observed catalogue → minimal audit entries.
//!
//! Games are matched by identity pair and compared with [`Game`]'s equality,
//! which ignores row bindings and enrichment. Entries come out as every
//! `new`/`update` in catalogue order, then every `removed` in snapshot order.

use std::collections::{HashMap, HashSet};

use ludoteca_core::{
  audit::NewEntry,
  game::{Game, GameKey},
};

use crate::{Error, Result, snapshot::Snapshot};

/// Compute the entries that turn `snapshot` into `catalogue`.
///
/// When the catalogue holds the same identity pair twice, both rows match the
/// first snapshot record.
pub fn diff(snapshot: &Snapshot, catalogue: &[Game]) -> Vec<NewEntry> {
  let mut known: HashMap<GameKey, &Game> = HashMap::with_capacity(snapshot.len());
  for game in snapshot.games() {
    known.entry(game.key()).or_insert(game);
  }

  let mut entries = Vec::new();
  let mut observed: HashSet<GameKey> = HashSet::with_capacity(catalogue.len());
  for game in catalogue {
    let key = game.key();
    match known.get(&key) {
      None => entries.push(NewEntry::new(game)),
      Some(current) if *current != game => entries.push(NewEntry::update(game)),
      Some(_) => {}
    }
    observed.insert(key);
  }

  entries.extend(
    snapshot
      .games()
      .iter()
      .filter(|game| !observed.contains(&game.key()))
      .map(NewEntry::removed),
  );
  entries
}

/// Diff, apply the result to `snapshot`, and check that a second diff comes
/// back empty.
///
/// On [`Error::Diverged`] the snapshot has already been advanced and must be
/// discarded by the caller.
pub fn converge(snapshot: &mut Snapshot, catalogue: &[Game]) -> Result<Vec<NewEntry>> {
  let entries = diff(snapshot, catalogue);
  for entry in &entries {
    snapshot.apply_entry(entry);
  }

  let remaining = diff(snapshot, catalogue);
  if !remaining.is_empty() {
    return Err(Error::Diverged {
      applied:   entries.len(),
      remaining: remaining.len(),
    });
  }
  Ok(entries)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use ludoteca_core::audit::EntryKind;

  use super::*;

  fn seed() -> Vec<Game> {
    vec![
      Game::new("1", "Game1", "Centro", ""),
      Game::new("2", "Game2", "Gamonal", ""),
      Game::new("3", "Game3", "Centro", "Victor"),
    ]
  }

  fn settled(catalogue: &[Game]) -> Snapshot {
    let mut snapshot = Snapshot::new();
    converge(&mut snapshot, catalogue).unwrap();
    snapshot
  }

  fn kinds(entries: &[NewEntry]) -> Vec<(EntryKind, &str)> {
    entries.iter().map(|e| (e.kind, e.game.name.as_str())).collect()
  }

  #[test]
  fn empty_snapshot_all_new() {
    let entries = diff(&Snapshot::new(), &seed());
    assert_eq!(
      kinds(&entries),
      vec![
        (EntryKind::New, "Game1"),
        (EntryKind::New, "Game2"),
        (EntryKind::New, "Game3"),
      ]
    );
  }

  #[test]
  fn unchanged_catalogue_is_empty() {
    let snapshot = settled(&seed());
    assert!(diff(&snapshot, &seed()).is_empty());
  }

  #[test]
  fn inserted_row_is_one_new() {
    let snapshot = settled(&seed());
    let mut catalogue = seed();
    catalogue.insert(1, Game::new("4", "NewGame", "Centro", "Victor"));

    assert_eq!(kinds(&diff(&snapshot, &catalogue)), vec![(EntryKind::New, "NewGame")]);
  }

  #[test]
  fn deleted_row_is_one_removed() {
    let snapshot = settled(&seed());
    let mut catalogue = seed();
    catalogue.remove(1);

    let entries = diff(&snapshot, &catalogue);
    assert_eq!(kinds(&entries), vec![(EntryKind::Removed, "Game2")]);
    assert_eq!(entries[0].game.location, "Gamonal");
  }

  #[test]
  fn changed_holders_are_updates() {
    let snapshot = settled(&seed());
    let mut catalogue = seed();
    catalogue[1].holder = "Victor".into();
    catalogue[2].holder.clear();

    assert_eq!(
      kinds(&diff(&snapshot, &catalogue)),
      vec![(EntryKind::Update, "Game2"), (EntryKind::Update, "Game3")]
    );
  }

  #[test]
  fn updates_precede_removals() {
    let snapshot = settled(&seed());
    let catalogue = vec![
      Game::new("3", "Game3", "Centro", ""),
      Game::new("5", "Game5", "Centro", ""),
    ];
    assert_eq!(
      kinds(&diff(&snapshot, &catalogue)),
      vec![
        (EntryKind::Update, "Game3"),
        (EntryKind::New, "Game5"),
        (EntryKind::Removed, "Game1"),
        (EntryKind::Removed, "Game2"),
      ]
    );
  }

  #[test]
  fn accent_change_is_an_update_not_a_replacement() {
    let snapshot = settled(&[Game::new("7", "Catan", "Centro", "")]);
    let entries = diff(&snapshot, &[Game::new("7", "Catán", "Centro", "")]);
    assert_eq!(kinds(&entries), vec![(EntryKind::Update, "Catán")]);
  }

  #[test]
  fn row_binding_and_enrichment_do_not_produce_entries() {
    let snapshot = settled(&seed());
    let mut catalogue = seed();
    for (i, game) in catalogue.iter_mut().enumerate() {
      game.row = Some(format!("Catalogue!A{}", i + 10));
      game.enrichment.rating = 8.0;
      game.enrichment.language_dependence = "none".into();
    }
    assert!(diff(&snapshot, &catalogue).is_empty());
  }

  #[test]
  fn entries_carry_no_row_binding() {
    let mut game = Game::new("1", "Game1", "Centro", "");
    game.row = Some("Catalogue!A2".into());
    let entries = diff(&Snapshot::new(), &[game]);
    assert_eq!(entries[0].game.row, None);
  }

  #[test]
  fn shared_id_with_different_names_are_distinct_games() {
    let catalogue = vec![
      Game::new("1", "Azul", "Centro", ""),
      Game::new("1", "Hanabi", "Centro", ""),
    ];
    let snapshot = settled(&catalogue);
    assert_eq!(snapshot.len(), 2);
    assert!(diff(&snapshot, &catalogue).is_empty());
  }

  #[test]
  fn identical_duplicates_settle_as_two_copies() {
    let catalogue = vec![
      Game::new("1", "Azul", "Centro", ""),
      Game::new("1", "Azul", "Centro", ""),
    ];
    let mut snapshot = Snapshot::new();
    let entries = converge(&mut snapshot, &catalogue).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(snapshot.len(), 2);
    assert!(diff(&snapshot, &catalogue).is_empty());
  }

  #[test]
  fn conflicting_duplicates_fail_to_converge() {
    let catalogue = vec![
      Game::new("1", "Azul", "Centro", ""),
      Game::new("1", "AZUL", "Gamonal", ""),
    ];
    let err = converge(&mut Snapshot::new(), &catalogue).unwrap_err();
    assert!(matches!(err, Error::Diverged { applied: 2, remaining: 1 }), "{err}");
  }
}
