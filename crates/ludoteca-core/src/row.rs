//! Row codec: games and audit entries to and from ordered sequences of cells.
//!
//! A [`RowLayout`] declares, per field, the column it lives in and whether it
//! is read, written, or both. Cells are JSON values, which is what tabular
//! document APIs exchange. Encoding fills gaps between declared columns with
//! `null`; decoding treats a missing cell as the field's zero value.
//!
//! The backing sheets are edited by hand, so dates are decoded leniently: a
//! date that does not parse becomes `None` rather than an error.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Number, Value};

use crate::{
  Error, Result,
  audit::{AuditEntry, EntryKind},
  game::Game,
};

pub type Cell = Value;
pub type Row = Vec<Cell>;

/// Spreadsheet column limit (`ZZZ`); anything beyond is a typo.
const MAX_COLUMNS: usize = 18_278;

/// Day/month/year without padding, as librarians type it.
pub const DEFAULT_DATE_PATTERN: &str = "%-d/%-m/%Y";

// ─── Declaration ─────────────────────────────────────────────────────────────

/// Every encodable field of a [`Game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameField {
  Id,
  Name,
  Location,
  Holder,
  Comments,
  TakeDate,
  ReturnDate,
  Price,
  Publisher,
  BggRef,
  Rating,
  Weight,
  MinPlayers,
  MaxPlayers,
  Playtime,
  Age,
  Year,
  LanguageDependence,
}

impl GameField {
  pub fn name(self) -> &'static str {
    match self {
      Self::Id => "id",
      Self::Name => "name",
      Self::Location => "location",
      Self::Holder => "holder",
      Self::Comments => "comments",
      Self::TakeDate => "take_date",
      Self::ReturnDate => "return_date",
      Self::Price => "price",
      Self::Publisher => "publisher",
      Self::BggRef => "bgg_ref",
      Self::Rating => "rating",
      Self::Weight => "weight",
      Self::MinPlayers => "min_players",
      Self::MaxPlayers => "max_players",
      Self::Playtime => "playtime",
      Self::Age => "age",
      Self::Year => "year",
      Self::LanguageDependence => "language_dependence",
    }
  }

  /// The human-authored columns, in catalogue order.
  pub const AUTHORED: [GameField; 10] = [
    Self::Id,
    Self::Name,
    Self::Location,
    Self::Holder,
    Self::Comments,
    Self::TakeDate,
    Self::ReturnDate,
    Self::Price,
    Self::Publisher,
    Self::BggRef,
  ];

  /// The enrichment columns, in catalogue order.
  pub const ENRICHMENT: [GameField; 8] = [
    Self::Rating,
    Self::Weight,
    Self::MinPlayers,
    Self::MaxPlayers,
    Self::Playtime,
    Self::Age,
    Self::Year,
    Self::LanguageDependence,
  ];
}

/// Direction(s) in which a column is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
  #[default]
  ReadWrite,
  /// Decoded but never written, e.g. a formula column.
  ReadOnly,
  /// Written but never decoded, e.g. the input side of a formula.
  WriteOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
  pub field:  GameField,
  pub index:  usize,
  pub access: Access,
}

impl Column {
  pub fn new(field: GameField, index: usize) -> Self {
    Self { field, index, access: Access::ReadWrite }
  }

  pub fn read_only(self) -> Self { Self { access: Access::ReadOnly, ..self } }

  pub fn write_only(self) -> Self { Self { access: Access::WriteOnly, ..self } }
}

/// How date fields are written and read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateFormat {
  /// A `chrono` strftime pattern for a calendar date; times are midnight UTC.
  Pattern(String),
  Rfc3339,
}

impl Default for DateFormat {
  fn default() -> Self { Self::Pattern(DEFAULT_DATE_PATTERN.to_owned()) }
}

impl DateFormat {
  pub fn format(&self, date: Option<DateTime<Utc>>) -> String {
    match (self, date) {
      (_, None) => String::new(),
      (Self::Pattern(p), Some(d)) => d.format(p).to_string(),
      (Self::Rfc3339, Some(d)) => d.to_rfc3339_opts(SecondsFormat::Secs, true),
    }
  }

  pub fn parse(&self, text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
      return None;
    }
    match self {
      Self::Pattern(p) => NaiveDate::parse_from_str(text, p)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc()),
      Self::Rfc3339 => DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc)),
    }
  }
}

// ─── RowLayout ───────────────────────────────────────────────────────────────

/// A validated column declaration for [`Game`] rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
  columns: Vec<Column>,
  dates:   DateFormat,
  width:   usize,
}

impl RowLayout {
  /// Validate a declaration. Duplicate columns, duplicate fields, and
  /// out-of-range indices are programming errors and are reported as
  /// [`Error::Layout`].
  pub fn new(columns: Vec<Column>, dates: DateFormat) -> Result<Self> {
    if columns.is_empty() {
      return Err(Error::Layout("no columns declared".into()));
    }
    for (i, column) in columns.iter().enumerate() {
      if column.index >= MAX_COLUMNS {
        return Err(Error::Layout(format!(
          "{} declared at column {}, beyond the sheet limit",
          column.field.name(),
          column.index
        )));
      }
      for other in &columns[..i] {
        if other.index == column.index {
          return Err(Error::Layout(format!(
            "{} and {} both declared at column {}",
            other.field.name(),
            column.field.name(),
            column.index
          )));
        }
        if other.field == column.field {
          return Err(Error::Layout(format!(
            "{} declared twice",
            column.field.name()
          )));
        }
      }
    }
    Ok(Self::from_parts(columns, dates))
  }

  fn from_parts(columns: Vec<Column>, dates: DateFormat) -> Self {
    let width = columns.iter().map(|c| c.index + 1).max().unwrap_or(0);
    Self { columns, dates, width }
  }

  /// The catalogue sheet: authored columns 0–9, enrichment 10–17. `bgg_ref`
  /// holds a hyperlink formula maintained by librarians and is never
  /// overwritten.
  pub fn catalogue() -> Self {
    let columns = GameField::AUTHORED
      .into_iter()
      .chain(GameField::ENRICHMENT)
      .enumerate()
      .map(|(index, field)| {
        let column = Column::new(field, index);
        if field == GameField::BggRef { column.read_only() } else { column }
      })
      .collect();
    Self::from_parts(columns, DateFormat::default())
  }

  /// The game part of an audit row: authored columns shifted past the
  /// timestamp and kind, with RFC 3339 dates.
  pub fn audit() -> Self {
    let columns = GameField::AUTHORED
      .into_iter()
      .enumerate()
      .map(|(index, field)| Column::new(field, index + EntryLayout::GAME_OFFSET))
      .collect();
    Self::from_parts(columns, DateFormat::Rfc3339)
  }

  pub fn columns(&self) -> &[Column] { &self.columns }

  /// Length of an encoded row: the highest declared index plus one.
  pub fn width(&self) -> usize { self.width }

  /// Encode `game` into a fresh row. Read-only columns and gaps are `null`.
  pub fn encode(&self, game: &Game) -> Row {
    self.encode_onto(game, &[])
  }

  /// Encode `game` over an existing row, keeping whatever the existing row
  /// holds in read-only columns and gaps.
  pub fn encode_onto(&self, game: &Game, existing: &[Cell]) -> Row {
    let mut row: Row = (0..self.width)
      .map(|i| existing.get(i).cloned().unwrap_or(Value::Null))
      .collect();
    for column in &self.columns {
      if column.access == Access::ReadOnly {
        continue;
      }
      row[column.index] = self.encode_field(game, column.field);
    }
    row
  }

  /// Write `game` back over `existing`, a row that decodes to `current`.
  /// Only writable columns whose encoding differs between the two are
  /// touched; every other cell keeps exactly what the sheet held.
  pub fn patch(&self, existing: &[Cell], current: &Game, game: &Game) -> Row {
    let mut row = existing.to_vec();
    for column in &self.columns {
      if column.access == Access::ReadOnly {
        continue;
      }
      let cell = self.encode_field(game, column.field);
      if cell == self.encode_field(current, column.field) {
        continue;
      }
      if row.len() <= column.index {
        row.resize(column.index + 1, Value::Null);
      }
      row[column.index] = cell;
    }
    row
  }

  /// Decode a row into a fresh [`Game`].
  pub fn decode(&self, row: &[Cell]) -> Result<Game> {
    let mut game = Game::default();
    self.decode_into(row, &mut game)?;
    Ok(game)
  }

  /// Decode a row over `game`. Write-only columns are skipped; cells past the
  /// end of the row reset the field to its zero value.
  pub fn decode_into(&self, row: &[Cell], game: &mut Game) -> Result<()> {
    for column in &self.columns {
      if column.access == Access::WriteOnly {
        continue;
      }
      let cell = row.get(column.index).unwrap_or(&Value::Null);
      self.decode_field(cell, *column, game)?;
    }
    Ok(())
  }

  fn encode_field(&self, game: &Game, field: GameField) -> Cell {
    let e = &game.enrichment;
    match field {
      GameField::Id => Value::String(game.id.clone()),
      GameField::Name => Value::String(game.name.clone()),
      GameField::Location => Value::String(game.location.clone()),
      GameField::Holder => Value::String(game.holder.clone()),
      GameField::Comments => Value::String(game.comments.clone()),
      GameField::TakeDate => Value::String(self.dates.format(game.take_date)),
      GameField::ReturnDate => Value::String(self.dates.format(game.return_date)),
      GameField::Price => Value::String(game.price.clone()),
      GameField::Publisher => Value::String(game.publisher.clone()),
      GameField::BggRef => Value::String(game.bgg_ref.clone()),
      GameField::Rating => Number::from_f64(e.rating).map_or(Value::Null, Value::Number),
      GameField::Weight => Number::from_f64(e.weight).map_or(Value::Null, Value::Number),
      GameField::MinPlayers => Value::from(e.min_players),
      GameField::MaxPlayers => Value::from(e.max_players),
      GameField::Playtime => Value::from(e.playtime),
      GameField::Age => Value::from(e.age),
      GameField::Year => Value::from(e.year),
      GameField::LanguageDependence => Value::String(e.language_dependence.clone()),
    }
  }

  fn decode_field(&self, cell: &Cell, column: Column, game: &mut Game) -> Result<()> {
    let e = &mut game.enrichment;
    match column.field {
      GameField::Id => game.id = text(cell, column)?,
      GameField::Name => game.name = text(cell, column)?,
      GameField::Location => game.location = text(cell, column)?,
      GameField::Holder => game.holder = text(cell, column)?,
      GameField::Comments => game.comments = text(cell, column)?,
      GameField::TakeDate => game.take_date = self.dates.parse(&text(cell, column)?),
      GameField::ReturnDate => game.return_date = self.dates.parse(&text(cell, column)?),
      GameField::Price => game.price = text(cell, column)?,
      GameField::Publisher => game.publisher = text(cell, column)?,
      GameField::BggRef => game.bgg_ref = text(cell, column)?,
      GameField::Rating => e.rating = float(cell, column)?,
      GameField::Weight => e.weight = float(cell, column)?,
      GameField::MinPlayers => e.min_players = integer(cell, column)?,
      GameField::MaxPlayers => e.max_players = integer(cell, column)?,
      GameField::Playtime => e.playtime = integer(cell, column)?,
      GameField::Age => e.age = integer(cell, column)?,
      GameField::Year => e.year = integer(cell, column)?,
      GameField::LanguageDependence => e.language_dependence = text(cell, column)?,
    }
    Ok(())
  }
}

// ─── Cell decoding ───────────────────────────────────────────────────────────

fn mismatch_at(cell: &Cell, column: usize, field: &'static str, expected: &'static str) -> Error {
  Error::CellType { column, field, expected, found: cell.to_string() }
}

fn mismatch(cell: &Cell, column: Column, expected: &'static str) -> Error {
  mismatch_at(cell, column.index, column.field.name(), expected)
}

fn text_at(cell: &Cell, column: usize, field: &'static str) -> Result<String> {
  match cell {
    Value::Null => Ok(String::new()),
    Value::String(s) => Ok(s.clone()),
    Value::Number(n) => Ok(n.to_string()),
    other => Err(mismatch_at(other, column, field, "text")),
  }
}

fn text(cell: &Cell, column: Column) -> Result<String> {
  text_at(cell, column.index, column.field.name())
}

fn float(cell: &Cell, column: Column) -> Result<f64> {
  match cell {
    Value::Null => Ok(0.0),
    Value::Number(n) => n.as_f64().ok_or_else(|| mismatch(cell, column, "number")),
    Value::String(s) if s.trim().is_empty() => Ok(0.0),
    Value::String(s) => s
      .trim()
      .replace(',', ".")
      .parse()
      .map_err(|_| mismatch(cell, column, "number")),
    other => Err(mismatch(other, column, "number")),
  }
}

fn integer<T: TryFrom<i64>>(cell: &Cell, column: Column) -> Result<T> {
  let value = float(cell, column)?;
  if value.fract() != 0.0 {
    return Err(mismatch(cell, column, "integer"));
  }
  T::try_from(value as i64).map_err(|_| mismatch(cell, column, "integer"))
}

// ─── Audit entries ───────────────────────────────────────────────────────────

/// Codec for audit rows: timestamp, kind, then the game columns.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryLayout {
  games: RowLayout,
}

impl Default for EntryLayout {
  fn default() -> Self { Self { games: RowLayout::audit() } }
}

impl EntryLayout {
  pub const TIMESTAMP: usize = 0;
  pub const KIND: usize = 1;
  pub const GAME_OFFSET: usize = 2;

  pub fn width(&self) -> usize { self.games.width() }

  pub fn encode(&self, entry: &AuditEntry) -> Row {
    let mut row = self.games.encode(&entry.game);
    row[Self::TIMESTAMP] = Value::String(DateFormat::Rfc3339.format(entry.timestamp));
    row[Self::KIND] = Value::String(entry.kind.as_str().to_owned());
    row
  }

  /// Decode an audit row. An unrecognised kind is reported as
  /// [`Error::UnknownKind`] so callers can skip the row; a malformed
  /// timestamp decodes as `None`.
  pub fn decode(&self, row: &[Cell]) -> Result<AuditEntry> {
    let cell_at = |index: usize| row.get(index).unwrap_or(&Value::Null);

    let kind_text = text_at(cell_at(Self::KIND), Self::KIND, "kind")?;
    let kind: EntryKind = kind_text.parse().map_err(Error::UnknownKind)?;

    let ts_text = text_at(cell_at(Self::TIMESTAMP), Self::TIMESTAMP, "timestamp")?;
    let timestamp = DateFormat::Rfc3339.parse(&ts_text);

    Ok(AuditEntry { timestamp, kind, game: self.games.decode(row)? })
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
