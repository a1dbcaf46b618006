//! Sheet-backed implementations of [`Catalogue`] and [`AuditLog`].
//!
//! A [`Sheet`] is an ordered list of rows with three operations: read all,
//! append (atomically), and overwrite rows by position. The adapters here
//! bring the row codec to it; backends only move cells.

use std::future::Future;

use chrono::{SubsecRound, Utc};
use tracing::{debug, warn};

use crate::{
  Error, Result,
  audit::{AuditEntry, NewEntry},
  game::{Game, GameKey, normalise},
  row::{Cell, EntryLayout, Row, RowLayout},
  store::{AuditLog, Catalogue},
};

/// Catalogue rows with fewer filled cells than this are skipped.
pub const DEFAULT_REQUIRED_COLUMNS: usize = 8;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// An ordered-row store addressed by zero-based position.
pub trait Sheet: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The sheet's title, used to build row bindings.
  fn title(&self) -> &str;

  /// Every row in position order, header included.
  fn read_rows(
    &self,
  ) -> impl Future<Output = Result<Vec<Row>, Self::Error>> + Send + '_;

  /// Append `rows` after the last row, all or nothing. Values are stored as
  /// given; nothing is interpreted as a formula.
  fn append_rows(
    &self,
    rows: Vec<Row>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Overwrite existing rows by position.
  fn update_rows(
    &self,
    rows: Vec<(usize, Row)>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// `Catalogue!A7` for position 6.
pub fn row_binding(title: &str, position: usize) -> String {
  format!("{title}!A{}", position + 1)
}

/// The position encoded in `binding`, if it belongs to `title`.
pub fn parse_row_binding(title: &str, binding: &str) -> Option<usize> {
  let number: usize = binding
    .strip_prefix(title)?
    .strip_prefix("!A")?
    .parse()
    .ok()?;
  number.checked_sub(1)
}

/// Number of cells up to and including the last non-blank one.
fn filled_len(row: &[Cell]) -> usize {
  row
    .iter()
    .rposition(|cell| match cell {
      Cell::Null => false,
      Cell::String(s) => !s.trim().is_empty(),
      _ => true,
    })
    .map_or(0, |i| i + 1)
}

// ─── Catalogue ───────────────────────────────────────────────────────────────

/// The catalogue, read from and written to a [`Sheet`].
#[derive(Debug, Clone)]
pub struct SheetCatalogue<S> {
  sheet:            S,
  layout:           RowLayout,
  header_rows:      usize,
  required_columns: usize,
}

impl<S: Sheet> SheetCatalogue<S> {
  pub fn new(sheet: S) -> Self {
    Self {
      sheet,
      layout: RowLayout::catalogue(),
      header_rows: 1,
      required_columns: DEFAULT_REQUIRED_COLUMNS,
    }
  }

  pub fn with_layout(self, layout: RowLayout) -> Self { Self { layout, ..self } }

  pub fn with_header_rows(self, header_rows: usize) -> Self {
    Self { header_rows, ..self }
  }

  pub fn with_required_columns(self, required_columns: usize) -> Self {
    Self { required_columns, ..self }
  }

  pub fn sheet(&self) -> &S { &self.sheet }

  fn position_of(&self, game: &Game) -> Result<usize> {
    game
      .row
      .as_deref()
      .and_then(|binding| parse_row_binding(self.sheet.title(), binding))
      .ok_or_else(|| Error::Unbound {
        id:   game.id.clone(),
        name: game.name.clone(),
      })
  }
}

impl<S: Sheet> Catalogue for SheetCatalogue<S> {
  type Error = Error;

  async fn list(&self) -> Result<Vec<Game>> {
    let rows = self.sheet.read_rows().await.map_err(Error::backend)?;
    let title = self.sheet.title();

    let mut games = Vec::with_capacity(rows.len());
    for (position, row) in rows.iter().enumerate().skip(self.header_rows) {
      if filled_len(row) < self.required_columns {
        debug!(row = %row_binding(title, position), "skipping incomplete catalogue row");
        continue;
      }
      let mut game = match self.layout.decode(row) {
        Ok(game) => game,
        Err(err @ Error::CellType { .. }) => {
          warn!(row = %row_binding(title, position), error = %err, "skipping malformed catalogue row");
          continue;
        }
        Err(err) => return Err(err),
      };
      game.row = Some(row_binding(title, position));
      games.push(game);
    }
    Ok(games)
  }

  async fn get(&self, id: &str, name: &str) -> Result<Option<Game>> {
    let key = GameKey::new(id, name);
    Ok(self.list().await?.into_iter().find(|g| key.matches(g)))
  }

  async fn find(&self, text: &str) -> Result<Vec<Game>> {
    let needle = normalise(text.trim());
    let mut games = self.list().await?;
    games.retain(|g| normalise(&g.name).contains(&needle));
    Ok(games)
  }

  async fn update(&self, games: Vec<Game>) -> Result<()> {
    if games.is_empty() {
      return Ok(());
    }
    let rows = self.sheet.read_rows().await.map_err(Error::backend)?;

    let mut updates = Vec::with_capacity(games.len());
    for game in &games {
      let position = self.position_of(game)?;
      let existing = rows.get(position).ok_or(Error::RowNotFound(position))?;

      // A librarian may have inserted or deleted rows since the game was read.
      let current = self.layout.decode(existing)?;
      if !current.matches(game) {
        return Err(Error::RowMoved {
          row:  row_binding(self.sheet.title(), position),
          id:   game.id.clone(),
          name: game.name.clone(),
        });
      }
      updates.push((position, self.layout.patch(existing, &current, game)));
    }

    self.sheet.update_rows(updates).await.map_err(Error::backend)
  }
}

// ─── Audit log ───────────────────────────────────────────────────────────────

/// The audit log, stored one entry per row in a [`Sheet`].
#[derive(Debug, Clone)]
pub struct SheetAuditLog<S> {
  sheet:       S,
  layout:      EntryLayout,
  header_rows: usize,
}

impl<S: Sheet> SheetAuditLog<S> {
  pub fn new(sheet: S) -> Self {
    Self { sheet, layout: EntryLayout::default(), header_rows: 0 }
  }

  pub fn with_header_rows(self, header_rows: usize) -> Self {
    Self { header_rows, ..self }
  }

  pub fn sheet(&self) -> &S { &self.sheet }
}

impl<S: Sheet> AuditLog for SheetAuditLog<S> {
  type Error = Error;

  async fn list(&self) -> Result<Vec<AuditEntry>> {
    let rows = self.sheet.read_rows().await.map_err(Error::backend)?;
    let title = self.sheet.title();

    let mut entries = Vec::with_capacity(rows.len());
    for (position, row) in rows.iter().enumerate().skip(self.header_rows) {
      match self.layout.decode(row) {
        Ok(entry) => entries.push(entry),
        Err(Error::UnknownKind(reason)) => {
          warn!(row = %row_binding(title, position), %reason, "skipping audit row");
        }
        Err(e) => return Err(e),
      }
    }

    let ordered = entries
      .windows(2)
      .all(|pair| pair[0].timestamp <= pair[1].timestamp);
    if !ordered {
      warn!(sheet = %title, "audit log returned out of order; re-sorting");
      entries.sort_by_key(|entry| entry.timestamp);
    }
    Ok(entries)
  }

  async fn append(&self, entries: Vec<NewEntry>) -> Result<Vec<AuditEntry>> {
    if entries.is_empty() {
      return Ok(Vec::new());
    }
    // The sheet keeps whole seconds; stamp with what will be read back.
    let now = Utc::now().trunc_subsecs(0);
    let stamped: Vec<AuditEntry> =
      entries.into_iter().map(|entry| entry.stamp(now)).collect();
    let rows = stamped.iter().map(|entry| self.layout.encode(entry)).collect();

    self.sheet.append_rows(rows).await.map_err(Error::backend)?;
    Ok(stamped)
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
