//! Game records: the rows of the catalogue.
//!
//! Two notions of sameness coexist. *Matching* pairs a catalogue row with its
//! history through the identity pair ([`GameKey`]), which is insensitive to
//! case and diacritics. *Equality* ([`PartialEq`]) is byte-exact over the
//! human-authored columns and decides whether a matched game changed.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Return dates earlier than this year are placeholders, not real deadlines.
const FIRST_REAL_RETURN_YEAR: i32 = 2000;

/// Fold `text` for matching: NFD decomposition, combining marks stripped,
/// lowercased.
pub fn normalise(text: &str) -> String {
  text
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .flat_map(char::to_lowercase)
    .collect()
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// The identity pair `(id, normalised name)` used to match games across the
/// catalogue, the snapshot, and the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameKey {
  pub id:   String,
  /// Already normalised.
  pub name: String,
}

impl GameKey {
  pub fn new(id: impl Into<String>, name: &str) -> Self {
    Self { id: id.into(), name: normalise(name) }
  }

  pub fn matches(&self, game: &Game) -> bool {
    self.id == game.id && self.name == normalise(&game.name)
  }
}

// ─── Enrichment ──────────────────────────────────────────────────────────────

/// Metadata filled in from the external board-game database. Never part of
/// equality; librarians do not author these columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
  pub rating:              f64,
  /// Complexity rating, 1.0 – 5.0.
  pub weight:              f64,
  pub min_players:         u32,
  pub max_players:         u32,
  /// Minutes.
  pub playtime:            u32,
  pub age:                 u32,
  pub year:                i32,
  pub language_dependence: String,
}

// ─── Game ────────────────────────────────────────────────────────────────────

/// A catalogue record.
///
/// `id` is short and not unique on its own; pair it with the name via
/// [`Game::key`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Game {
  pub id:          String,
  pub name:        String,
  pub location:    String,
  /// Empty when the game is on the shelf.
  pub holder:      String,
  pub comments:    String,
  pub take_date:   Option<DateTime<Utc>>,
  pub return_date: Option<DateTime<Utc>>,
  pub price:       String,
  pub publisher:   String,
  pub bgg_ref:     String,
  #[serde(default)]
  pub enrichment:  Enrichment,
  /// Physical location in the backing sheet, e.g. `Catalogue!A7`. Metadata
  /// only: excluded from equality and never stored in a snapshot.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub row:         Option<String>,
}

impl Game {
  /// Convenience constructor for the four columns every row starts with.
  pub fn new(
    id: impl Into<String>,
    name: impl Into<String>,
    location: impl Into<String>,
    holder: impl Into<String>,
  ) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      location: location.into(),
      holder: holder.into(),
      ..Self::default()
    }
  }

  pub fn key(&self) -> GameKey { GameKey::new(self.id.clone(), &self.name) }

  /// True when both games share the identity pair.
  pub fn matches(&self, other: &Game) -> bool {
    self.id == other.id && normalise(&self.name) == normalise(&other.name)
  }

  pub fn is_available(&self) -> bool { self.holder.is_empty() }

  /// The agreed return date, ignoring the pre-2000 placeholders the sheet
  /// uses for "no date".
  pub fn return_date_set(&self) -> Option<DateTime<Utc>> {
    self
      .return_date
      .filter(|d| d.year() >= FIRST_REAL_RETURN_YEAR)
  }

  /// A copy with the row binding cleared, ready to live in a snapshot.
  pub fn without_binding(&self) -> Self {
    Self { row: None, ..self.clone() }
  }

  /// Hand the game to `holder`.
  pub fn lend(
    &mut self,
    holder: &str,
    now: DateTime<Utc>,
    return_date: Option<DateTime<Utc>>,
  ) {
    self.holder = holder.trim().to_owned();
    self.take_date = Some(now);
    self.return_date = return_date;
  }

  /// Put the game back on the shelf.
  pub fn give_back(&mut self) {
    self.holder.clear();
    self.take_date = None;
    self.return_date = None;
  }
}

impl PartialEq for Game {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
      && self.name == other.name
      && self.location == other.location
      && self.holder == other.holder
      && self.comments == other.comments
      && self.take_date == other.take_date
      && self.return_date == other.return_date
      && self.price == other.price
      && self.publisher == other.publisher
      && self.bgg_ref == other.bgg_ref
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
